//! Configuration schemas.
//!
//! Configuration is deserialized via the `config` crate from an optional
//! TOML file overlaid with `HOOKLINE_`-prefixed environment variables.

pub mod discovery;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::discovery::DiscoveryConfig;
pub use self::logging::LoggingConfig;

use crate::error::PluginError;

/// Root hookline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooklineConfig {
    /// Discovery toggles.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HooklineConfig {
    /// Load configuration from a TOML file (optional) and the environment.
    ///
    /// Nested keys are addressed with a double underscore after the prefix,
    /// e.g. `HOOKLINE_LOGGING__LEVEL=debug`. The flat discovery switches
    /// (`HOOKLINE_DISABLE_PLUGINS` and friends) are honoured as well and
    /// can only turn a phase off.
    pub fn load(path: &str) -> Result<Self, PluginError> {
        Self::load_with_env(path, None)
    }

    /// Like [`HooklineConfig::load`], reading variables from `env` instead
    /// of the process environment when given.
    pub fn load_with_env(
        path: &str,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, PluginError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("HOOKLINE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env.clone()),
            )
            .build()
            .map_err(|e| PluginError::configuration(format!("Failed to build config: {e}")))?;

        let mut loaded: Self = config
            .try_deserialize()
            .map_err(|e| PluginError::configuration(format!("Failed to deserialize config: {e}")))?;

        let toggles =
            DiscoveryConfig::from_environment(config::Environment::with_prefix("HOOKLINE").source(env))?;
        loaded.discovery.merge(&toggles);
        Ok(loaded)
    }
}
