use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use fiberui::config::SchedulerConfig;
use fiberui_core::{
    Element, Engine, Event, SliceOutcome,
    memory::{MemoryHost, NodeId},
};
use tracing::{debug, info, warn};

use crate::{error::TuiError, renderer::Renderer, terminal::Terminal};

/// Entry point for running `fiberui` element trees in the terminal.
#[derive(Debug)]
pub struct TuiApp {
    terminal: Terminal,
    renderer: Renderer,
    engine: Engine<MemoryHost>,
    container: NodeId,
    scheduler: SchedulerConfig,
}

impl TuiApp {
    /// Schedules rendering `element` as the app's content.
    pub fn mount(&mut self, element: Element) {
        self.engine.render(element, self.container);
    }

    /// Runs one idle slice and redraws if it committed.
    ///
    /// # Errors
    ///
    /// Returns [`TuiError::Render`] when the pass failed, and
    /// [`TuiError::Io`] when drawing failed.
    pub fn step(&mut self) -> Result<SliceOutcome, TuiError> {
        let outcome = self.engine.work_loop(&self.scheduler.time_slice())?;
        if let SliceOutcome::Committed(report) = outcome {
            debug!(?report, "redrawing after commit");
            self.redraw()?;
        }
        Ok(outcome)
    }

    /// Draws the committed host tree.
    ///
    /// # Errors
    ///
    /// Fails when the terminal cannot be queried or written to.
    pub fn redraw(&mut self) -> Result<(), TuiError> {
        let (columns, _) = self.terminal.size()?;
        let frame = self
            .renderer
            .with_width(usize::from(columns))
            .render(self.engine.host(), self.container);
        self.terminal.render(&frame)
    }

    /// Broadcasts a `keydown` event carrying `key` to every node. Returns how
    /// many listeners ran.
    pub fn dispatch_key(&self, key: &str) -> usize {
        self.engine
            .host()
            .broadcast(self.container, &Event::new("keydown").with_data(key))
    }

    /// Runs until `q`, Esc or Ctrl-C is pressed.
    ///
    /// Each iteration waits up to the idle interval for input, dispatches it,
    /// then runs one slice. A failed render pass is logged and the app keeps
    /// showing the last committed frame.
    ///
    /// # Errors
    ///
    /// Fails on terminal I/O errors.
    pub fn run(&mut self) -> Result<(), TuiError> {
        info!("terminal app started");
        loop {
            if event::poll(self.scheduler.idle_interval())? {
                match event::read()? {
                    TermEvent::Key(key) if key.kind == KeyEventKind::Press => {
                        if is_quit(&key) {
                            break;
                        }
                        if let Some(name) = key_name(key.code) {
                            let invoked = self.dispatch_key(&name);
                            debug!(key = %name, invoked, "key dispatched");
                        }
                    }
                    TermEvent::Resize(..) => self.redraw()?,
                    _ => {}
                }
            }
            match self.step() {
                Ok(_) => {}
                Err(TuiError::Render(err)) => warn!(error = %err, "render pass failed"),
                Err(err) => return Err(err),
            }
        }
        info!("terminal app stopped");
        Ok(())
    }

    /// The engine driving the host tree.
    #[must_use]
    pub const fn engine(&self) -> &Engine<MemoryHost> {
        &self.engine
    }

    /// Mutable access to the engine.
    pub const fn engine_mut(&mut self) -> &mut Engine<MemoryHost> {
        &mut self.engine
    }

    /// The host node the app renders into.
    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    /// Provides immutable access to the terminal handle.
    #[must_use]
    pub const fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// The active slice timing.
    #[must_use]
    pub const fn scheduler(&self) -> &SchedulerConfig {
        &self.scheduler
    }
}

fn is_quit(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn key_name(code: KeyCode) -> Option<String> {
    let name = match code {
        KeyCode::Char(ch) => return Some(ch.to_string()),
        KeyCode::F(n) => return Some(format!("F{n}")),
        KeyCode::Enter => "Enter",
        KeyCode::Tab => "Tab",
        KeyCode::Backspace => "Backspace",
        KeyCode::Delete => "Delete",
        KeyCode::Up => "ArrowUp",
        KeyCode::Down => "ArrowDown",
        KeyCode::Left => "ArrowLeft",
        KeyCode::Right => "ArrowRight",
        KeyCode::Home => "Home",
        KeyCode::End => "End",
        _ => return None,
    };
    Some(name.to_owned())
}

/// Builder for [`TuiApp`] instances.
#[derive(Debug, Default)]
pub struct TuiAppBuilder {
    terminal: Option<Terminal>,
    scheduler: SchedulerConfig,
}

impl TuiAppBuilder {
    /// Creates a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the terminal handle used by the application.
    #[must_use]
    pub fn with_terminal(mut self, terminal: Terminal) -> Self {
        self.terminal = Some(terminal);
        self
    }

    /// Replaces the idle loop timing.
    #[must_use]
    pub const fn with_scheduler(mut self, scheduler: SchedulerConfig) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Consumes the builder and produces a [`TuiApp`].
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal cannot be initialised.
    pub fn build(self) -> Result<TuiApp, TuiError> {
        let terminal = match self.terminal {
            Some(terminal) => terminal,
            None => Terminal::stdout()?,
        };
        let mut host = MemoryHost::new();
        let container = host.create_container("app");

        Ok(TuiApp {
            terminal,
            renderer: Renderer::new(),
            engine: Engine::new(host),
            container,
            scheduler: self.scheduler,
        })
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use fiberui_core::{Component, Props, children, component, element};

    use super::*;

    fn buffered_app() -> TuiApp {
        TuiAppBuilder::new()
            .with_terminal(Terminal::buffered())
            .build()
            .expect("building app should succeed")
    }

    fn settle(app: &mut TuiApp) {
        while !matches!(app.step().expect("step should succeed"), SliceOutcome::Idle) {}
    }

    #[test]
    fn render_into_buffer() {
        let mut app = buffered_app();
        app.mount(element("p", Props::new(), children!["Hello TUI"]));

        settle(&mut app);

        assert_eq!(app.terminal().snapshot(), Some("Hello TUI"));
    }

    #[test]
    fn key_presses_drive_state_updates() {
        let counter = Component::new("Counter", |hooks, _| {
            let (count, set_count) = hooks.use_state(0_i64);
            Ok(element(
                "p",
                Props::new().on("keydown", move |event| match event.data() {
                    Some("+") => set_count.update(|c| c + 1),
                    Some("-") => set_count.update(|c| c - 1),
                    _ => {}
                }),
                children!["count: ", count],
            ))
        });
        let mut app = buffered_app();
        app.mount(component(&counter, Props::new()));
        settle(&mut app);

        assert_eq!(app.dispatch_key("+"), 1);
        app.dispatch_key("+");
        app.dispatch_key("-");
        app.dispatch_key("x");
        settle(&mut app);

        assert_eq!(app.terminal().snapshot(), Some("count: 1"));
    }

    #[test]
    fn narrow_terminals_truncate_lines() {
        let mut app = TuiAppBuilder::new()
            .with_terminal(Terminal::buffered_with_size(5, 2))
            .build()
            .expect("building app should succeed");
        app.mount(element("p", Props::new(), children!["truncated"]));

        settle(&mut app);

        assert_eq!(app.terminal().snapshot(), Some("trunc"));
    }

    #[test]
    fn slices_follow_configuration() {
        let config = SchedulerConfig {
            slice_budget_ms: 5,
            yield_threshold_ms: 2,
            idle_interval_ms: 50,
        };

        let app = TuiAppBuilder::new()
            .with_terminal(Terminal::buffered())
            .with_scheduler(config)
            .build()
            .expect("building app should succeed");

        assert_eq!(app.scheduler().idle_interval(), Duration::from_millis(50));
        assert_eq!(app.scheduler().time_slice().budget(), Duration::from_millis(5));
    }
}
