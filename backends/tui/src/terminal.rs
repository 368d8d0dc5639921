use std::io::{self, Stdout, Write};

use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::PrintStyledContent,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

use crate::{
    error::TuiError,
    renderer::{RenderFrame, RenderLine},
};

/// Size reported by buffered terminals.
const BUFFER_SIZE: (u16, u16) = (80, 24);

/// Represents the concrete output target the terminal backend writes to.
#[derive(Debug)]
enum TerminalTarget {
    /// The process terminal, in raw mode on the alternate screen.
    Stdout(Stdout),
    /// An in-memory transcript of the last frame.
    Buffer { contents: String, size: (u16, u16) },
}

impl TerminalTarget {
    fn stdout() -> Result<Self, TuiError> {
        let mut handle = io::stdout();
        terminal::enable_raw_mode()?;
        if let Err(err) = execute!(handle, EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(err.into());
        }
        Ok(Self::Stdout(handle))
    }

    fn write_frame(&mut self, frame: &RenderFrame) -> Result<(), TuiError> {
        match self {
            Self::Stdout(handle) => {
                queue!(handle, MoveTo(0, 0), Clear(ClearType::All))?;
                for (row, line) in (0_u16..).zip(frame.lines()) {
                    queue!(handle, MoveTo(0, row))?;
                    write_line_stdout(handle, line)?;
                }
                handle.flush()?;
            }
            Self::Buffer { contents, .. } => {
                *contents = frame.plain_lines().join("\n");
            }
        }
        Ok(())
    }
}

impl Drop for TerminalTarget {
    fn drop(&mut self) {
        if let Self::Stdout(handle) = self {
            let _ = execute!(handle, Show, LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
}

fn write_line_stdout(handle: &mut Stdout, line: &RenderLine) -> Result<(), TuiError> {
    for segment in line.segments() {
        queue!(handle, PrintStyledContent(segment.as_styled_content()))?;
    }
    Ok(())
}

/// Thin wrapper around the concrete terminal output target.
#[derive(Debug)]
pub struct Terminal {
    target: TerminalTarget,
}

impl Terminal {
    /// Creates a terminal bound to the process `stdout` handle, enabling raw mode
    /// and entering the alternate screen buffer. Both are undone on drop.
    ///
    /// # Errors
    ///
    /// Fails when `stdout` is not a terminal.
    pub fn stdout() -> Result<Self, TuiError> {
        Ok(Self {
            target: TerminalTarget::stdout()?,
        })
    }

    /// Creates a buffered 80x24 terminal useful for tests.
    #[must_use]
    pub const fn buffered() -> Self {
        Self::buffered_with_size(BUFFER_SIZE.0, BUFFER_SIZE.1)
    }

    /// Creates a buffered terminal reporting the given size.
    #[must_use]
    pub const fn buffered_with_size(columns: u16, rows: u16) -> Self {
        Self {
            target: TerminalTarget::Buffer {
                contents: String::new(),
                size: (columns, rows),
            },
        }
    }

    /// Returns the terminal size as `(columns, rows)`.
    ///
    /// # Errors
    ///
    /// Fails when the size of a real terminal cannot be queried.
    pub fn size(&self) -> Result<(u16, u16), TuiError> {
        match &self.target {
            TerminalTarget::Stdout(_) => Ok(terminal::size()?),
            TerminalTarget::Buffer { size, .. } => Ok(*size),
        }
    }

    /// Draws a frame, replacing whatever was on screen.
    ///
    /// # Errors
    ///
    /// Fails when writing to the terminal fails.
    pub fn render(&mut self, frame: &RenderFrame) -> Result<(), TuiError> {
        self.target.write_frame(frame)
    }

    /// Returns the last drawn frame when the terminal was created via
    /// [`Self::buffered`].
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        match &self.target {
            TerminalTarget::Buffer { contents, .. } => Some(contents),
            TerminalTarget::Stdout(_) => None,
        }
    }
}
