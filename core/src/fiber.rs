//! The fiber arena.
//!
//! A fiber is one tree position in one render generation. Fibers live in a
//! [`FiberTree`] and refer to each other by [`FiberId`]: `child` and `sibling`
//! encode the ordered children as a linked list, `parent` points back up, and
//! `alternate` points at the fiber holding the same position in the last
//! committed tree. None of these links own anything; the arena does.

use core::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::{
    element::{Element, ElementType},
    hooks::StateCell,
    host::NodeKind,
    props::Props,
};

new_key_type! {
    /// Handle to a fiber in a [`FiberTree`].
    pub struct FiberId;
}

/// The host mutation a fiber needs at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTag {
    /// Create and insert the host node.
    Placement,
    /// Reuse the alternate's host node and sync its props.
    Update,
    /// Remove the host nodes of this (previous generation) fiber.
    Deletion,
}

/// A unit of work and a node of the fiber tree.
#[derive(Debug)]
pub struct Fiber<N> {
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<N>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<StateCell>,
    pub(crate) generation: u64,
}

impl<N> Fiber<N> {
    pub(crate) fn root(
        container: N,
        props: Rc<Props>,
        alternate: Option<FiberId>,
        generation: u64,
    ) -> Self {
        Self {
            ty: None,
            props,
            dom: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: None,
            hooks: Vec::new(),
            generation,
        }
    }

    pub(crate) fn placement(element: &Element, parent: FiberId, generation: u64) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            dom: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect: Some(EffectTag::Placement),
            hooks: Vec::new(),
            generation,
        }
    }

    pub(crate) fn update(
        element: &Element,
        parent: FiberId,
        alternate: FiberId,
        dom: Option<N>,
        generation: u64,
    ) -> Self {
        Self {
            dom,
            alternate: Some(alternate),
            effect: Some(EffectTag::Update),
            ..Self::placement(element, parent, generation)
        }
    }

    /// The element type, `None` for the root container fiber.
    #[must_use]
    pub const fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    /// The props this fiber was built from.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }

    /// The owned host node, once materialized.
    #[must_use]
    pub const fn dom(&self) -> Option<&N> {
        self.dom.as_ref()
    }

    /// Enclosing fiber.
    #[must_use]
    pub const fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    /// First child.
    #[must_use]
    pub const fn child(&self) -> Option<FiberId> {
        self.child
    }

    /// Next sibling.
    #[must_use]
    pub const fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    /// Same position in the previously committed tree.
    #[must_use]
    pub const fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    /// Mutation required at commit.
    #[must_use]
    pub const fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    /// Number of state cells of a function fiber.
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Render pass that created this fiber.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether this fiber renders a function component.
    #[must_use]
    pub const fn is_component(&self) -> bool {
        matches!(self.ty, Some(ElementType::Component(_)))
    }

    pub(crate) fn node_kind(&self) -> Option<NodeKind<'_>> {
        match self.ty.as_ref()? {
            ElementType::Host(tag) => Some(NodeKind::Element(tag)),
            ElementType::Text => Some(NodeKind::Text),
            ElementType::Component(_) => None,
        }
    }
}

/// Arena owning every live fiber.
#[derive(Debug)]
pub struct FiberTree<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberTree<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N> FiberTree<N> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }

    /// Looks up a fiber. Returns `None` for reclaimed fibers.
    #[must_use]
    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    /// Whether `id` refers to a live fiber.
    #[must_use]
    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Number of live fibers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Iterates over the children of `id` in order.
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        Children {
            tree: self,
            next: self.fibers.get(id).and_then(|fiber| fiber.child),
        }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    /// Next fiber in pre-order: first child, else the nearest next sibling of
    /// this fiber or one of its ancestors.
    pub(crate) fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        if let Some(child) = self[id].child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if let Some(sibling) = self[current].sibling {
                return Some(sibling);
            }
            cursor = self[current].parent;
        }
        None
    }

    /// Nearest strict ancestor owning a host node.
    pub(crate) fn host_ancestor(&self, id: FiberId) -> Option<FiberId> {
        let mut cursor = self[id].parent;
        while let Some(current) = cursor {
            if self[current].dom.is_some() {
                return Some(current);
            }
            cursor = self[current].parent;
        }
        None
    }

    /// Host nodes created for placements by generations other than `keep`.
    /// Render passes never attach these, so nothing else refers to them.
    pub(crate) fn placed_nodes(&self, keep: u64) -> Vec<N>
    where
        N: Clone,
    {
        self.fibers
            .values()
            .filter(|fiber| fiber.generation != keep && fiber.effect == Some(EffectTag::Placement))
            .filter_map(|fiber| fiber.dom.clone())
            .collect()
    }

    /// Host nodes of the outermost host-owning fibers below `id`, which are
    /// the nodes a commit attaches directly under `id`'s host node.
    pub(crate) fn host_roots(&self, id: FiberId) -> Vec<N>
    where
        N: Clone,
    {
        let mut roots = Vec::new();
        let mut stack: Vec<FiberId> = self.children(id).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            if let Some(dom) = &self[current].dom {
                roots.push(dom.clone());
                continue;
            }
            let before = stack.len();
            stack.extend(self.children(current));
            stack[before..].reverse();
        }
        roots
    }

    /// Drops every fiber. Returns how many there were.
    pub(crate) fn clear(&mut self) -> usize {
        let dropped = self.fibers.len();
        self.fibers.clear();
        dropped
    }

    /// Drops every fiber not created by `generation` and clears the alternate
    /// links of the survivors. Returns how many fibers were dropped.
    pub(crate) fn reclaim(&mut self, generation: u64) -> usize {
        let before = self.fibers.len();
        self.fibers
            .retain(|_, fiber| fiber.generation == generation);
        for fiber in self.fibers.values_mut() {
            fiber.alternate = None;
        }
        before - self.fibers.len()
    }
}

impl<N> Index<FiberId> for FiberTree<N> {
    type Output = Fiber<N>;

    fn index(&self, id: FiberId) -> &Fiber<N> {
        &self.fibers[id]
    }
}

impl<N> IndexMut<FiberId> for FiberTree<N> {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber<N> {
        &mut self.fibers[id]
    }
}

/// Iterator over a fiber's child chain.
#[derive(Debug)]
pub struct Children<'a, N> {
    tree: &'a FiberTree<N>,
    next: Option<FiberId>,
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let current = self.next?;
        self.next = self.tree.get(current).and_then(|fiber| fiber.sibling);
        Some(current)
    }
}
