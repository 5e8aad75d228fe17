//! Discovery toggles.

use serde::{Deserialize, Serialize};

use crate::error::PluginError;

/// Switches that skip discovery phases entirely.
///
/// A skipped phase reports zero plugins loaded and no errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Skip every discovery phase (`HOOKLINE_DISABLE_PLUGINS`).
    pub disable_plugins: bool,
    /// Skip entry-point discovery (`HOOKLINE_DISABLE_ENTRYPOINT_PLUGINS`).
    pub disable_entrypoint_plugins: bool,
    /// Skip prefix discovery (`HOOKLINE_DISABLE_PREFIX_PLUGINS`).
    pub disable_prefix_plugins: bool,
}

impl DiscoveryConfig {
    /// Read the toggles from `HOOKLINE_*` environment variables.
    pub fn from_env() -> Result<Self, PluginError> {
        Self::from_environment(config::Environment::with_prefix("HOOKLINE"))
    }

    /// Read the toggles from an explicit environment source.
    pub fn from_environment(env: config::Environment) -> Result<Self, PluginError> {
        let config = config::Config::builder()
            .add_source(env.try_parsing(true))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Turns off every phase `other` turns off.
    pub fn merge(&mut self, other: &DiscoveryConfig) {
        self.disable_plugins |= other.disable_plugins;
        self.disable_entrypoint_plugins |= other.disable_entrypoint_plugins;
        self.disable_prefix_plugins |= other.disable_prefix_plugins;
    }
}
