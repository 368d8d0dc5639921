//! Errors raised by hosts and by render passes.

use core::fmt;

use thiserror::Error;

/// The engine phase an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Building the work-in-progress tree.
    Render,
    /// Applying mutations to the host.
    Commit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render => f.write_str("render"),
            Self::Commit => f.write_str("commit"),
        }
    }
}

/// Errors reported by a [`Host`](crate::Host) implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The node handle does not refer to a live node.
    #[error("unknown host node {0}")]
    UnknownNode(String),
    /// The node is not a child of the given parent.
    #[error("host node {child} is not a child of {parent}")]
    NotAChild {
        /// The expected parent.
        parent: String,
        /// The node that was looked up.
        child: String,
    },
    /// The host refused to create a node with this tag.
    #[error("host cannot create a `{0}` node")]
    UnsupportedTag(String),
    /// A fiber has no ancestor owning a host node to attach to.
    #[error("no ancestor fiber owns a host node")]
    Detached,
    /// Any other host failure.
    #[error("{0}")]
    Other(String),
}

/// Errors that abort a render pass.
///
/// When a pass fails, its work-in-progress tree is discarded and the last
/// committed tree stays current.
#[derive(Debug, Error)]
pub enum RenderError {
    /// A component's render function returned an error.
    #[error("component `{component}` failed to render")]
    Component {
        /// Name of the failing component.
        component: String,
        /// The error returned by the component.
        #[source]
        source: anyhow::Error,
    },
    /// A component called a different number of hooks than on its last render.
    #[error("component `{component}` called {found} hooks but {expected} on its previous render")]
    HookOrder {
        /// Name of the component.
        component: String,
        /// Hook count of the previous render.
        expected: usize,
        /// Hook count of this render.
        found: usize,
    },
    /// A hook returned state of another type than on the last render.
    #[error("hook #{index} of component `{component}` changed its state type between renders")]
    HookType {
        /// Name of the component.
        component: String,
        /// Zero-based call index of the hook.
        index: usize,
    },
    /// A host operation failed.
    #[error("host operation failed during {phase}")]
    Host {
        /// The phase that called the host.
        phase: Phase,
        /// The host error.
        #[source]
        source: HostError,
    },
}

impl RenderError {
    pub(crate) fn host(phase: Phase) -> impl Fn(HostError) -> Self {
        move |source| Self::Host { phase, source }
    }
}
