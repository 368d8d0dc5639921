//! Core of the `fiberui` rendering engine.
//!
//! An [`Engine`] keeps a tree of host nodes in sync with a declarative
//! [`Element`] tree. Work is split into one unit per fiber so a host can run it
//! in short idle slices, and all host mutations of a pass are applied together
//! in a single synchronous commit.
//!
//! # Pipeline
//!
//! ```text
//! render() ──▶ work_loop() ──▶ reconcile one fiber ──▶ ... ──▶ commit
//!    ▲              │ yields when the Deadline runs out           │
//!    │              └──────────── resumes from the cursor         │
//!    └──────────── SetState::update() restarts from the root ◀────┘
//! ```
//!
//! # Example
//!
//! ```
//! use fiberui_core::{Engine, Props, element, memory::MemoryHost, children};
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let mut engine = Engine::new(host);
//!
//! engine.render(element("h1", Props::new(), children!["hello"]), container);
//! engine.flush().unwrap();
//!
//! assert_eq!(engine.host().markup(container), "<root><h1>hello</h1></root>");
//! ```

#[macro_use]
mod macros;
mod commit;
pub mod element;
pub mod engine;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod memory;
pub mod props;
mod reconcile;
pub mod scheduler;

pub use commit::CommitReport;
pub use element::{Child, Component, Element, ElementType, component, element, text};
pub use engine::{Engine, SliceOutcome};
pub use error::{HostError, Phase, RenderError};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use hooks::{Hooks, RenderTrigger, SetState};
pub use host::{Event, Host, NodeKind};
pub use props::{Listener, PropValue, Props, sync_props};
pub use scheduler::{Deadline, TimeSlice, Unbounded};
