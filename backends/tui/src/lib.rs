//! Terminal host for `fiberui`.
//!
//! The engine renders into a [`MemoryHost`](fiberui_core::memory::MemoryHost);
//! after every commit the [`Renderer`] lays the host tree out as styled lines
//! and the [`Terminal`] draws them with crossterm.

pub use crate::app::{TuiApp, TuiAppBuilder};
pub use crate::renderer::{RenderFrame, RenderLine, RenderSegment, Renderer};
pub use crate::terminal::Terminal;

mod app;
mod error;
mod renderer;
mod terminal;

pub use error::TuiError;
