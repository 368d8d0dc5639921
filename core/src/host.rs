//! The contract between the engine and a host platform.
//!
//! The engine never touches host nodes directly. It creates them during the
//! render phase (detached) and attaches, updates or removes them only from the
//! commit phase, through the [`Host`] trait.

use core::fmt::Debug;

use crate::{
    error::HostError,
    props::{Listener, PropValue},
};

/// Which kind of host node to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// An element node with a tag name.
    Element(&'a str),
    /// A text node.
    Text,
}

/// An event delivered to listeners by a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    name: String,
    data: Option<String>,
}

impl Event {
    /// Creates an event without payload.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: None,
        }
    }

    /// Attaches a textual payload, such as the pressed key.
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// The lower-case event name, such as `click`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The payload, if any.
    #[must_use]
    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }
}

/// A host platform the engine renders into.
///
/// `Node` is a cheap handle; the host owns the node storage. Appending a node
/// that already has a parent moves it.
pub trait Host {
    /// Handle to a host node.
    type Node: Clone + PartialEq + Debug;

    /// Creates a new, detached, empty node.
    ///
    /// # Errors
    ///
    /// Fails if the host cannot create a node of this kind.
    fn create_node(&mut self, kind: NodeKind<'_>) -> Result<Self::Node, HostError>;

    /// Appends `child` as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if either node is unknown to the host.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Inserts `child` into `parent` right before `before`.
    ///
    /// # Errors
    ///
    /// Fails if a node is unknown or `before` is not a child of `parent`.
    fn insert_before(
        &mut self,
        parent: &Self::Node,
        child: &Self::Node,
        before: &Self::Node,
    ) -> Result<(), HostError>;

    /// Detaches `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `child` is not a child of `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Frees `node` and every node below it, detaching it first if it still
    /// has a parent. The engine calls this once it holds no handle to the
    /// node anymore. Releasing an unknown node does nothing.
    ///
    /// # Errors
    ///
    /// Fails if the host cannot free the node.
    fn release_node(&mut self, node: &Self::Node) -> Result<(), HostError>;

    /// Assigns a plain attribute.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or rejects the attribute.
    fn set_attribute(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    /// Clears a plain attribute.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown.
    fn remove_attribute(&mut self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Registers `listener` for `event` on a node.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown.
    fn add_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    /// Unregisters a listener previously added with [`Host::add_listener`].
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown.
    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;
}
