//! Logging bootstrap for hosts embedding hookline.
//!
//! hookline itself only emits `tracing` events; hosts that do not install
//! their own subscriber can call [`init`].

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;
use crate::error::PluginError;

/// Build the level filter, preferring `RUST_LOG` over the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install a global `fmt` subscriber.
///
/// Fails with a configuration error if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<(), PluginError> {
    let filter = build_filter(config);

    let result = match config.format.as_str() {
        "json" => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        _ => fmt()
            .pretty()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    result.map_err(|e| {
        PluginError::configuration(format!("Failed to install tracing subscriber: {e}"))
    })?;

    tracing::debug!(level = %config.level, format = %config.format, "Logging initialized");
    Ok(())
}
