//! Tracing subscriber and panic logging setup.

use std::{
    fs::{File, OpenOptions},
    io,
    panic::{self, PanicHookInfo},
    path::{Path, PathBuf},
    sync::{Mutex, Once},
    thread,
};

use thiserror::Error;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, fmt::writer::BoxMakeWriter, prelude::*, util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

// ============================================================================
// Global State
// ============================================================================

static TRACING_INSTALLED: Once = Once::new();
static PANIC_HOOK_INSTALLED: Once = Once::new();

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter `{directive}`")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// The log file could not be opened.
    #[error("failed to open log file {path}")]
    File {
        /// The log file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Another global subscriber is already installed.
    #[error("a global tracing subscriber is already installed")]
    AlreadyInstalled,
}

// ============================================================================
// Installation
// ============================================================================

/// Installs the global tracing subscriber (idempotent).
///
/// `RUST_LOG` overrides the configured level. With a log file configured,
/// output is appended to it without ANSI colors; otherwise it goes to stderr.
/// Later calls do nothing and return `Ok`.
///
/// # Errors
///
/// Fails on the first call if the filter is malformed, the file cannot be
/// opened, or a subscriber was installed by someone else.
pub fn install_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let mut outcome = Ok(());
    TRACING_INSTALLED.call_once(|| outcome = try_install(config));
    outcome
}

fn try_install(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level)?;
    let (writer, ansi) = match &config.file {
        Some(path) => (BoxMakeWriter::new(Mutex::new(open_log_file(path)?)), false),
        None => (BoxMakeWriter::new(io::stderr), true),
    };

    let output = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(output)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|source| LoggingError::Filter {
        directive: level.to_owned(),
        source,
    })
}

fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Routes panics through `tracing` before the previous hook runs (idempotent).
///
/// Terminal hosts draw on the alternate screen, where a panic message printed
/// to stderr is lost; the log file keeps it.
pub fn install_panic_logger() {
    PANIC_HOOK_INSTALLED.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            log_panic(info);
            previous(info);
        }));
    });
}

fn log_panic(info: &PanicHookInfo<'_>) {
    let location = info
        .location()
        .map(|loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()))
        .unwrap_or_default();
    let current = thread::current();
    tracing::error!(
        target: "fiberui::panic",
        message = %panic_message(info),
        thread = current.name().unwrap_or("unnamed"),
        location = %location,
        "panicked"
    );
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_filter_is_reported() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let err = build_filter("fiberui=loud").unwrap_err();
        assert!(matches!(err, LoggingError::Filter { ref directive, .. } if directive == "fiberui=loud"));
    }

    #[test]
    fn unwritable_log_file_is_reported() {
        assert!(matches!(
            open_log_file(Path::new("no/such/dir/fiberui.log")),
            Err(LoggingError::File { .. })
        ));
    }
}
