//! Logging setup
//!
//! gridfn itself only emits `tracing` events. Embedders that do not install
//! their own subscriber can call [`init_logging`].

use crate::config::{LoggingSection, DEFAULT_LOG_LEVEL};
use crate::error::{FunctionError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Configuration for the fmt subscriber
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    pub ansi: bool,
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            ansi: true,
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Build from the `[logging]` configuration section
    pub fn from_section(section: &LoggingSection) -> Self {
        let defaults = Self::default();
        Self {
            level: section.level.clone().unwrap_or(defaults.level),
            ansi: section.ansi.unwrap_or(defaults.ansi),
            with_target: section.with_target.unwrap_or(defaults.with_target),
        }
    }

    /// The filter to install: `RUST_LOG` if set, else the configured level
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.level).map_err(|e| {
            FunctionError::Config(format!("Invalid log level '{}': {}", self.level, e))
        })
    }
}

/// Install a global fmt subscriber.
///
/// Fails with [`FunctionError::Config`] when the level is not a valid filter
/// directive or a global subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(config.ansi)
                .with_target(config.with_target),
        )
        .try_init()
        .map_err(|e| FunctionError::Config(format!("Failed to initialize logging: {}", e)))
}
