//! Interactive terminal demo for `fiberui`.

mod views;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use fiberui::{config::Config, logging};
use fiberui_tui::TuiAppBuilder;

/// Log file used when the configuration names none; the screen belongs to the app.
const DEFAULT_LOG_FILE: &str = "fiberui-demo.log";

/// A counter, a growing list and a tag toggle, rendered incrementally in the terminal.
#[derive(Parser, Debug)]
#[command(name = "fiberui-demo", version, about, long_about = None)]
struct Cli {
    /// Configuration file. Missing files fall back to defaults.
    #[arg(long, default_value = "fiberui.toml")]
    config: PathBuf,

    /// Log filter, overriding `[logging] level`.
    #[arg(long, value_name = "FILTER")]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    color_eyre::config::HookBuilder::default()
        .display_location_section(false)
        .display_env_section(false)
        .install()?;

    let cli = Cli::parse();
    let mut config = Config::load(&cli.config)
        .wrap_err_with(|| format!("loading {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if config.logging.file.is_none() {
        config.logging.file = Some(PathBuf::from(DEFAULT_LOG_FILE));
    }

    logging::install_tracing(&config.logging)?;
    logging::install_panic_logger();
    tracing::info!(?config, "starting demo");

    let mut app = TuiAppBuilder::new()
        .with_scheduler(config.scheduler)
        .build()?;
    app.mount(views::screen());
    app.run()?;
    Ok(())
}
