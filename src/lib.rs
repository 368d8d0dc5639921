//! `fiberui`: declarative element trees rendered incrementally into a host.
//!
//! This crate bundles the engine from `fiberui-core` with the ambient pieces an
//! application needs: TOML [`config`] and [`logging`] setup.
//!
//! ```
//! use fiberui::prelude::*;
//!
//! let counter = Component::new("Counter", |hooks, _props| {
//!     let (count, _set_count) = hooks.use_state(0);
//!     Ok(element("p", Props::new(), children!["count: ", count]))
//! });
//!
//! let mut host = MemoryHost::new();
//! let container = host.create_container("app");
//! let mut engine = Engine::new(host);
//! engine.render(component(&counter, Props::new()), container);
//! engine.flush()?;
//!
//! assert_eq!(engine.host().text_content(container), "count: 0");
//! # Ok::<(), fiberui::RenderError>(())
//! ```

pub mod config;
pub mod logging;

#[doc(inline)]
pub use fiberui_core::*;

pub mod prelude {
    //! The types most applications touch, for glob import.
    pub use fiberui_core::{
        Child, Component, Deadline, Element, Engine, Event, Hooks, Host, Listener, PropValue,
        Props, RenderError, SetState, SliceOutcome, TimeSlice, Unbounded, children, component,
        element, memory::MemoryHost, text,
    };

    pub use crate::config::Config;
}
