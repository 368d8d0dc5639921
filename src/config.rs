//! Runtime configuration loaded from a TOML file.
//!
//! ```toml
//! [scheduler]
//! slice_budget_ms = 8
//! yield_threshold_ms = 1
//! idle_interval_ms = 16
//!
//! [logging]
//! level = "debug"
//! file = "fiberui.log"
//! ```
//!
//! Every key is optional.

use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use fiberui_core::TimeSlice;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The contents are not valid TOML for this schema.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Work-loop timing.
    pub scheduler: SchedulerConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Timing of cooperative work slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Length of one work slice.
    pub slice_budget_ms: u64,
    /// Yield once less than this is left in a slice.
    pub yield_threshold_ms: u64,
    /// How long a host driver waits for input between slices.
    pub idle_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            slice_budget_ms: 8,
            yield_threshold_ms: 1,
            idle_interval_ms: 16,
        }
    }
}

impl SchedulerConfig {
    /// Starts a work slice with the configured budget and threshold.
    #[must_use]
    pub fn time_slice(&self) -> TimeSlice {
        TimeSlice::new(self.slice_budget()).with_threshold(self.yield_threshold())
    }

    /// The slice budget as a duration.
    #[must_use]
    pub const fn slice_budget(&self) -> Duration {
        Duration::from_millis(self.slice_budget_ms)
    }

    /// The yield threshold as a duration.
    #[must_use]
    pub const fn yield_threshold(&self) -> Duration {
        Duration::from_millis(self.yield_threshold_ms)
    }

    /// The idle poll interval as a duration.
    #[must_use]
    pub const fn idle_interval(&self) -> Duration {
        Duration::from_millis(self.idle_interval_ms)
    }
}

/// Log filter and destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, such as `info` or `fiberui_core=trace`.
    pub level: String,
    /// Write logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            file: None,
        }
    }
}

impl Config {
    /// Parses and validates a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed input and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the file at `path`. A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no configuration file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Fails when the slice budget is zero or not larger than the threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scheduler = &self.scheduler;
        if scheduler.slice_budget_ms == 0 {
            return Err(ConfigError::Invalid(String::from(
                "scheduler.slice_budget_ms must be positive",
            )));
        }
        if scheduler.yield_threshold_ms >= scheduler.slice_budget_ms {
            return Err(ConfigError::Invalid(format!(
                "scheduler.yield_threshold_ms ({}) must be below slice_budget_ms ({})",
                scheduler.yield_threshold_ms, scheduler.slice_budget_ms
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.scheduler.slice_budget(), Duration::from_millis(8));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::from_toml_str(
            r#"
            [scheduler]
            slice_budget_ms = 4

            [logging]
            file = "out.log"
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.slice_budget_ms, 4);
        assert_eq!(config.scheduler.idle_interval_ms, 16);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn threshold_must_fit_in_budget() {
        let err = Config::from_toml_str("[scheduler]\nslice_budget_ms = 2\nyield_threshold_ms = 2")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(matches!(
            Config::from_toml_str("[scheduler]\nbudget = 3"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("definitely/not/here/fiberui.toml")).unwrap();
        assert_eq!(config, Config::default());
    }
}
