//! An in-memory host.
//!
//! [`MemoryHost`] stores nodes in an arena and journals every mutation, which
//! makes it the host of choice for tests and for backends that draw a node tree
//! themselves (such as the terminal backend).

use std::collections::BTreeMap;
use std::fmt::Write as _;

use slotmap::{SlotMap, new_key_type};

use crate::{
    error::HostError,
    host::{Event, Host, NodeKind},
    props::{Listener, NODE_VALUE, PropValue},
};

new_key_type! {
    /// Handle to a node of a [`MemoryHost`].
    pub struct NodeId;
}

/// Kind of a stored node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNodeKind {
    /// An element with a tag name.
    Element(String),
    /// A text node.
    Text,
}

/// A node stored by [`MemoryHost`].
#[derive(Debug)]
pub struct HostNode {
    kind: HostNodeKind,
    attributes: BTreeMap<String, PropValue>,
    listeners: Vec<(String, Listener)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl HostNode {
    const fn new(kind: HostNodeKind) -> Self {
        Self {
            kind,
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// The node kind.
    #[must_use]
    pub const fn kind(&self) -> &HostNodeKind {
        &self.kind
    }

    /// The tag name of element nodes.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            HostNodeKind::Element(tag) => Some(tag),
            HostNodeKind::Text => None,
        }
    }

    /// Looks up an attribute.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    /// Iterates over attributes in name order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Child nodes in order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// The parent node, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Text of a text node.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self.kind {
            HostNodeKind::Text => Some(
                self.attributes
                    .get(NODE_VALUE)
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            ),
            HostNodeKind::Element(_) => None,
        }
    }

    /// Whether at least one listener is registered for `event`.
    #[must_use]
    pub fn has_listener(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners
            .iter()
            .filter(|(name, _)| name == event)
            .count()
    }
}

/// A host mutation, as recorded in the journal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// A node was created.
    Create(NodeId),
    /// An attribute was assigned.
    SetAttribute {
        /// Target node.
        node: NodeId,
        /// Attribute name.
        name: String,
    },
    /// An attribute was cleared.
    RemoveAttribute {
        /// Target node.
        node: NodeId,
        /// Attribute name.
        name: String,
    },
    /// A listener was added.
    AddListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A listener was removed.
    RemoveListener {
        /// Target node.
        node: NodeId,
        /// Event name.
        event: String,
    },
    /// A node was attached under a parent.
    Insert {
        /// New parent.
        parent: NodeId,
        /// Attached node.
        child: NodeId,
    },
    /// A node was detached from its parent.
    Remove {
        /// Former parent.
        parent: NodeId,
        /// Detached node.
        child: NodeId,
    },
    /// A node and its subtree were freed.
    Release(NodeId),
}

impl Mutation {
    /// Whether this mutation changes the shape of a tree rather than a single
    /// node.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Remove { .. })
    }
}

/// Arena-backed host keeping a mutation journal.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: SlotMap<NodeId, HostNode>,
    journal: Vec<Mutation>,
}

impl MemoryHost {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a root container node. Not journaled.
    pub fn create_container(&mut self, tag: &str) -> NodeId {
        self.nodes
            .insert(HostNode::new(HostNodeKind::Element(tag.to_owned())))
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&HostNode> {
        self.nodes.get(id)
    }

    /// Children of a node; empty for unknown nodes.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[], |node| node.children.as_slice())
    }

    /// Number of stored nodes, attached or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Recorded mutations since the last [`MemoryHost::take_journal`].
    #[must_use]
    pub fn journal(&self) -> &[Mutation] {
        &self.journal
    }

    /// Drains the journal.
    pub fn take_journal(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.journal)
    }

    /// Concatenated text of all text nodes below `id`.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        if let Some(text) = node.text() {
            out.push_str(&text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    /// Serializes the subtree at `id` as HTML-like markup. Listeners are
    /// omitted; attributes are sorted by name.
    #[must_use]
    pub fn markup(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(id, &mut out);
        out
    }

    fn write_markup(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id) else {
            return;
        };
        match &node.kind {
            HostNodeKind::Text => out.push_str(&node.text().unwrap_or_default()),
            HostNodeKind::Element(tag) => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in &node.attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    /// Invokes the listeners of `node` registered for the event's name.
    /// Returns how many listeners ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let listeners: Vec<Listener> = self
            .nodes
            .get(node)
            .map(|node| {
                node.listeners
                    .iter()
                    .filter(|(name, _)| name == event.name())
                    .map(|(_, listener)| listener.clone())
                    .collect()
            })
            .unwrap_or_default();
        for listener in &listeners {
            listener.call(event);
        }
        listeners.len()
    }

    /// Dispatches `event` to every node of the subtree at `root`, in
    /// pre-order. Returns how many listeners ran.
    pub fn broadcast(&self, root: NodeId, event: &Event) -> usize {
        let mut stack = vec![root];
        let mut invoked = 0;
        while let Some(id) = stack.pop() {
            invoked += self.dispatch(id, event);
            stack.extend(self.children(id).iter().rev().copied());
        }
        invoked
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(id)
            .ok_or_else(|| HostError::UnknownNode(format!("{id:?}")))
    }

    fn ensure_exists(&self, id: NodeId) -> Result<(), HostError> {
        if self.nodes.contains_key(id) {
            Ok(())
        } else {
            Err(HostError::UnknownNode(format!("{id:?}")))
        }
    }

    fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.nodes.get_mut(child).and_then(|node| node.parent.take()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(parent) {
            parent.children.retain(|&id| id != child);
        }
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, index: Option<usize>) -> Result<(), HostError> {
        self.ensure_exists(child)?;
        self.ensure_exists(parent)?;
        self.detach(child);
        let parent_node = self.node_mut(parent)?;
        match index {
            Some(index) => parent_node.children.insert(index, child),
            None => parent_node.children.push(child),
        }
        self.node_mut(child)?.parent = Some(parent);
        self.journal.push(Mutation::Insert { parent, child });
        Ok(())
    }
}

impl Host for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<NodeId, HostError> {
        let kind = match kind {
            NodeKind::Element("") => return Err(HostError::UnsupportedTag(String::new())),
            NodeKind::Element(tag) => HostNodeKind::Element(tag.to_owned()),
            NodeKind::Text => HostNodeKind::Text,
        };
        let id = self.nodes.insert(HostNode::new(kind));
        self.journal.push(Mutation::Create(id));
        Ok(id)
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.attach(*parent, *child, None)
    }

    fn insert_before(
        &mut self,
        parent: &NodeId,
        child: &NodeId,
        before: &NodeId,
    ) -> Result<(), HostError> {
        self.ensure_exists(*child)?;
        if !self.node_mut(*parent)?.children.contains(before) {
            return Err(HostError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{before:?}"),
            });
        }
        self.detach(*child);
        let index = self
            .node_mut(*parent)?
            .children
            .iter()
            .position(|id| id == before)
            .ok_or_else(|| HostError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{before:?}"),
            })?;
        self.attach(*parent, *child, Some(index))
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let is_child = self.node_mut(*parent)?.children.contains(child);
        if !is_child {
            return Err(HostError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{child:?}"),
            });
        }
        self.detach(*child);
        self.journal.push(Mutation::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn release_node(&mut self, node: &NodeId) -> Result<(), HostError> {
        if !self.nodes.contains_key(*node) {
            return Ok(());
        }
        self.detach(*node);
        let mut stack = vec![*node];
        while let Some(id) = stack.pop() {
            if let Some(freed) = self.nodes.remove(id) {
                stack.extend(freed.children);
            }
        }
        self.journal.push(Mutation::Release(*node));
        Ok(())
    }

    fn set_attribute(&mut self, node: &NodeId, name: &str, value: &PropValue) -> Result<(), HostError> {
        self.node_mut(*node)?
            .attributes
            .insert(name.to_owned(), value.clone());
        self.journal.push(Mutation::SetAttribute {
            node: *node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: &NodeId, name: &str) -> Result<(), HostError> {
        self.node_mut(*node)?.attributes.remove(name);
        self.journal.push(Mutation::RemoveAttribute {
            node: *node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_listener(&mut self, node: &NodeId, event: &str, listener: &Listener) -> Result<(), HostError> {
        self.node_mut(*node)?
            .listeners
            .push((event.to_owned(), listener.clone()));
        self.journal.push(Mutation::AddListener {
            node: *node,
            event: event.to_owned(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.node_mut(*node)?
            .listeners
            .retain(|(name, existing)| !(name == event && existing.ptr_eq(listener)));
        self.journal.push(Mutation::RemoveListener {
            node: *node,
            event: event.to_owned(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    fn tree() -> (MemoryHost, NodeId, NodeId, NodeId) {
        let mut host = MemoryHost::new();
        let root = host.create_container("root");
        let a = host.create_node(NodeKind::Element("a")).unwrap();
        let b = host.create_node(NodeKind::Element("b")).unwrap();
        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &b).unwrap();
        host.take_journal();
        (host, root, a, b)
    }

    #[test]
    fn insert_before_places_node() {
        let (mut host, root, a, b) = tree();
        let c = host.create_node(NodeKind::Text).unwrap();
        host.set_attribute(&c, NODE_VALUE, &PropValue::from("hi")).unwrap();

        host.insert_before(&root, &c, &b).unwrap();

        assert_eq!(host.children(root), &[a, c, b]);
        assert_eq!(host.markup(root), "<root><a></a>hi<b></b></root>");
    }

    #[test]
    fn append_moves_attached_node() {
        let (mut host, root, a, b) = tree();

        host.append_child(&b, &a).unwrap();

        assert_eq!(host.children(root), &[b]);
        assert_eq!(host.node(a).unwrap().parent(), Some(b));
    }

    #[test]
    fn removing_a_stranger_fails() {
        let (mut host, _, a, b) = tree();

        let result = host.remove_child(&a, &b);

        assert!(matches!(result, Err(HostError::NotAChild { .. })));
        assert!(host.journal().is_empty());
    }

    #[test]
    fn failed_insert_leaves_the_node_in_place() {
        let (mut host, root, a, b) = tree();
        let other = host.create_container("other");
        let stranger = host.create_node(NodeKind::Element("c")).unwrap();
        host.append_child(&other, &stranger).unwrap();

        let result = host.insert_before(&root, &a, &stranger);

        assert!(matches!(result, Err(HostError::NotAChild { .. })));
        assert_eq!(host.children(root), &[a, b]);
        assert_eq!(host.node(a).unwrap().parent(), Some(root));
    }

    #[test]
    fn release_frees_the_whole_subtree() {
        let (mut host, root, a, b) = tree();
        let leaf = host.create_node(NodeKind::Text).unwrap();
        host.append_child(&a, &leaf).unwrap();
        assert_eq!(host.len(), 4);

        host.release_node(&a).unwrap();

        assert_eq!(host.len(), 2);
        assert_eq!(host.children(root), &[b]);
        assert!(host.node(leaf).is_none());
        assert_eq!(host.journal().last(), Some(&Mutation::Release(a)));

        host.release_node(&a).unwrap();
        assert_eq!(host.len(), 2);
    }

    #[test]
    fn empty_tag_is_rejected() {
        let mut host = MemoryHost::new();
        assert!(matches!(
            host.create_node(NodeKind::Element("")),
            Err(HostError::UnsupportedTag(_))
        ));
    }

    #[test]
    fn broadcast_reaches_nested_listeners() {
        let (mut host, root, a, b) = tree();
        let hits = Rc::new(Cell::new(0));
        for node in [a, b] {
            let hits = Rc::clone(&hits);
            let listener = Listener::new(move |event| {
                assert_eq!(event.data(), Some("x"));
                hits.set(hits.get() + 1);
            });
            host.add_listener(&node, "keydown", &listener).unwrap();
        }

        let invoked = host.broadcast(root, &Event::new("keydown").with_data("x"));

        assert_eq!(invoked, 2);
        assert_eq!(hits.get(), 2);
        assert_eq!(host.broadcast(root, &Event::new("click")), 0);
    }
}
