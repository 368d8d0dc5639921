//! Element properties and the host property sync.
//!
//! [`Props`] hold the attribute/listener mapping of an element together with
//! its ordered children. Keys starting with [`LISTENER_PREFIX`] are event
//! listeners; everything else is a plain attribute. [`sync_props`] applies the
//! difference between two property sets to a host node.

use core::fmt;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::warn;

use crate::{
    element::{Child, Element},
    error::HostError,
    host::{Event, Host},
};

/// Attribute carrying the content of a text node.
pub const NODE_VALUE: &str = "nodeValue";

/// Prefix marking a property key as an event listener (`onClick`, `onKeyDown`).
pub const LISTENER_PREFIX: &str = "on";

const CHILDREN: &str = "children";

/// A value stored under a property key.
#[derive(Clone)]
pub enum PropValue {
    /// A string attribute.
    Str(Rc<str>),
    /// An integer attribute.
    Int(i64),
    /// A floating point attribute.
    Float(f64),
    /// A boolean attribute.
    Bool(bool),
    /// An event listener.
    Listener(Listener),
}

impl PropValue {
    /// Returns the string payload, if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the boolean payload, if this is a boolean value.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the listener, if this value is one.
    #[must_use]
    pub const fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            _ => None,
        }
    }
}

// Listeners compare by identity, like function references.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Listener(a), Self::Listener(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => write!(f, "{value:?}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Listener(listener) => listener.fmt(f),
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(value) => f.write_str(value),
            Self::Int(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Listener(_) => f.write_str("[listener]"),
        }
    }
}

impl_raw_value!(Str => &str, String, Rc<str>);
impl_raw_value!(Int => i64, i32, u32, u16, u8);
impl_raw_value!(Float => f64, f32);
impl_raw_value!(Bool => bool);

impl From<Listener> for PropValue {
    fn from(listener: Listener) -> Self {
        Self::Listener(listener)
    }
}

/// A shared event callback.
///
/// Two listeners are equal only when they are clones of the same callback, so
/// re-rendering with a freshly built closure replaces the host listener.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    /// Wraps a callback.
    pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(callback))
    }

    /// Invokes the callback.
    pub fn call(&self, event: &Event) {
        (self.0)(event);
    }

    /// Returns `true` when both listeners share the same callback.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// Returns `true` if `key` names an event listener.
#[must_use]
pub fn is_listener_key(key: &str) -> bool {
    key.len() > LISTENER_PREFIX.len() && key.starts_with(LISTENER_PREFIX)
}

/// Derives the host event name from a listener key: `onKeyDown` becomes
/// `keydown`.
#[must_use]
pub fn event_name(key: &str) -> String {
    key.strip_prefix(LISTENER_PREFIX)
        .unwrap_or(key)
        .to_lowercase()
}

/// Attributes, listeners and ordered children of an element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Props {
    attributes: BTreeMap<String, PropValue>,
    children: Vec<Element>,
}

impl Props {
    /// Creates an empty property set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Creates a property set with only children.
    #[must_use]
    pub const fn from_children(children: Vec<Element>) -> Self {
        Self {
            attributes: BTreeMap::new(),
            children,
        }
    }

    /// Adds an attribute or listener.
    ///
    /// `children` is reserved and ignored here; use [`Props::with_children`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        let name = name.into();
        if name == CHILDREN {
            warn!("`children` cannot be set as an attribute; use `with_children`");
            return self;
        }
        self.attributes.insert(name, value.into());
        self
    }

    /// Adds a listener for `event`, stored under the `on<Event>` key.
    #[must_use]
    pub fn on(self, event: &str, callback: impl Fn(&Event) + 'static) -> Self {
        let mut chars = event.chars();
        let key = chars.next().map_or_else(String::new, |first| {
            let mut key = String::from(LISTENER_PREFIX);
            key.extend(first.to_uppercase());
            key.push_str(chars.as_str());
            key
        });
        self.with(key, Listener::new(callback))
    }

    /// Replaces the children. Raw values are wrapped into text elements.
    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = Child>) -> Self {
        self.children = children.into_iter().map(Child::into_element).collect();
        self
    }

    /// Looks up an attribute or listener.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attributes.get(name)
    }

    /// Looks up a string attribute.
    #[must_use]
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Iterates over attributes and listeners in key order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// The ordered children.
    #[must_use]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    fn plain_attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes().filter(|(name, _)| !is_listener_key(name))
    }

    fn listeners(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes().filter(|(name, _)| is_listener_key(name))
    }
}

/// Applies the difference between `prev` and `next` to a host node.
///
/// Runs four ordered passes: remove listeners that are gone or changed, clear
/// attributes that are gone, assign attributes that are new or changed, add
/// listeners that are new or changed. Listener keys holding a non-listener
/// value are skipped.
///
/// Returns the number of host operations performed.
///
/// # Errors
///
/// Propagates the first error reported by the host.
pub fn sync_props<H: Host + ?Sized>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> Result<usize, HostError> {
    let mut operations = 0;

    for (key, value) in prev.listeners() {
        if next.get(key) == Some(value) {
            continue;
        }
        if let Some(listener) = value.as_listener() {
            host.remove_listener(node, &event_name(key), listener)?;
            operations += 1;
        }
    }

    for (key, _) in prev.plain_attributes() {
        if next.get(key).is_none() {
            host.remove_attribute(node, key)?;
            operations += 1;
        }
    }

    for (key, value) in next.plain_attributes() {
        if prev.get(key) != Some(value) {
            host.set_attribute(node, key, value)?;
            operations += 1;
        }
    }

    for (key, value) in next.listeners() {
        if prev.get(key) == Some(value) {
            continue;
        }
        match value.as_listener() {
            Some(listener) => {
                host.add_listener(node, &event_name(key), listener)?;
                operations += 1;
            }
            None => warn!(key, "listener key holds a non-listener value; skipped"),
        }
    }

    Ok(operations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryHost, Mutation};
    use crate::NodeKind;

    fn node(host: &mut MemoryHost) -> crate::memory::NodeId {
        let node = host.create_node(NodeKind::Element("div")).unwrap();
        host.take_journal();
        node
    }

    #[test]
    fn listener_keys_map_to_lowercase_events() {
        assert!(is_listener_key("onClick"));
        assert!(!is_listener_key("on"));
        assert!(!is_listener_key("title"));
        assert_eq!(event_name("onKeyDown"), "keydown");
    }

    #[test]
    fn on_builds_prefixed_key() {
        let props = Props::new().on("click", |_| {});
        assert!(props.get("onClick").and_then(PropValue::as_listener).is_some());
    }

    #[test]
    fn children_key_is_reserved() {
        let props = Props::new().with("children", "nope");
        assert!(props.get("children").is_none());
    }

    #[test]
    fn sync_from_empty_sets_everything() {
        let mut host = MemoryHost::new();
        let node = node(&mut host);
        let props = Props::new()
            .with("id", "main")
            .with("hidden", false)
            .on("click", |_| {});

        let operations = sync_props(&mut host, &node, &Props::new(), &props).unwrap();

        assert_eq!(operations, 3);
        let stored = host.node(node).unwrap();
        assert_eq!(stored.attribute("id"), Some(&PropValue::from("main")));
        assert!(stored.has_listener("click"));
    }

    #[test]
    fn sync_touches_only_differences() {
        let mut host = MemoryHost::new();
        let node = node(&mut host);
        let listener = Listener::new(|_| {});
        let prev = Props::new()
            .with("id", "a")
            .with("title", "gone")
            .with("onClick", listener.clone());
        let next = Props::new().with("id", "b").with("onClick", listener);
        sync_props(&mut host, &node, &Props::new(), &prev).unwrap();
        host.take_journal();

        let operations = sync_props(&mut host, &node, &prev, &next).unwrap();

        assert_eq!(operations, 2);
        assert_eq!(
            host.take_journal(),
            vec![
                Mutation::RemoveAttribute {
                    node,
                    name: "title".into()
                },
                Mutation::SetAttribute {
                    node,
                    name: "id".into()
                },
            ]
        );
    }

    #[test]
    fn changed_listener_is_replaced() {
        let mut host = MemoryHost::new();
        let node = node(&mut host);
        let prev = Props::new().on("click", |_| {});
        let next = Props::new().on("click", |_| {});
        sync_props(&mut host, &node, &Props::new(), &prev).unwrap();
        host.take_journal();

        sync_props(&mut host, &node, &prev, &next).unwrap();

        let event = String::from("click");
        assert_eq!(
            host.take_journal(),
            vec![
                Mutation::RemoveListener {
                    node,
                    event: event.clone()
                },
                Mutation::AddListener { node, event },
            ]
        );
        assert_eq!(host.node(node).unwrap().listener_count("click"), 1);
    }

    #[test]
    fn identical_props_are_a_no_op() {
        let mut host = MemoryHost::new();
        let node = node(&mut host);
        let props = Props::new().with("id", "x").on("click", |_| {});

        assert_eq!(sync_props(&mut host, &node, &props, &props.clone()).unwrap(), 0);
        assert!(host.journal().is_empty());
    }
}
