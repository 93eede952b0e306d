//! Log subscriber setup
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, else the configured level)
//!   └── Fmt Layer (JSON or pretty console output)
//! ```

use crate::config::{LogFormat, LoggingConfig};
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Logging setup errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{0}': {1}")]
    InvalidFilter(String, String),

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Build the filter: `RUST_LOG` wins, then `level_override`, then the config.
pub fn build_filter(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = level_override.unwrap_or(&config.level);
    EnvFilter::try_new(directive)
        .map_err(|e| LoggingError::InvalidFilter(directive.to_string(), e.to_string()))
}

/// Install the global subscriber
pub fn init_logging(
    config: &LoggingConfig,
    level_override: Option<&str>,
) -> Result<(), LoggingError> {
    let env_filter = build_filter(config, level_override)?;

    let result = match config.format {
        LogFormat::Json => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_thread_ids(true)
                .with_current_span(true);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(env_filter).with(fmt_layer),
            )
        }
        LogFormat::Pretty => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true);
            tracing::subscriber::set_global_default(
                tracing_subscriber::registry().with(env_filter).with(fmt_layer),
            )
        }
    };

    result.map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}
