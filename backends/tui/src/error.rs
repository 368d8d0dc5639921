use std::io;

use fiberui_core::RenderError;
use thiserror::Error;

/// Errors that can occur while building or running a [`TuiApp`](crate::TuiApp).
#[derive(Debug, Error)]
pub enum TuiError {
    /// Low level terminal I/O failure.
    #[error("terminal I/O error")]
    Io(#[from] io::Error),
    /// A render pass failed; the last committed frame stays on screen.
    #[error("render pass failed")]
    Render(#[from] RenderError),
}
