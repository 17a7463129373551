//! Application configuration
//!
//! This module re-exports the shared config types from easyfx-types and
//! provides persistence for AppConfig.

use std::path::PathBuf;

pub use easyfx_types::{AppConfig, EffectSettings, SimulationSettings};

use super::error::ConfigError;

const APP_NAME: &str = "easyfx";
const CONFIG_NAME: &str = "config";

// ─────────────────────────────────────────────────────────────────────────────
// AppConfig Extensions
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for AppConfig persistence
pub trait AppConfigExt: Sized {
    fn load() -> Self;
    fn try_load() -> Result<Self, ConfigError>;
    fn load_with_defaults() -> Self;
    fn save(&self) -> Result<(), ConfigError>;
    fn config_path() -> Result<PathBuf, ConfigError>;
}

impl AppConfigExt for AppConfig {
    /// Stored config, or defaults if it is missing or unreadable
    fn load() -> Self {
        Self::try_load().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Using default configuration");
            Self::load_with_defaults()
        })
    }

    fn try_load() -> Result<Self, ConfigError> {
        Ok(confy::load(APP_NAME, CONFIG_NAME)?)
    }

    fn load_with_defaults() -> Self {
        AppConfig::default()
    }

    fn save(&self) -> Result<(), ConfigError> {
        confy::store(APP_NAME, CONFIG_NAME, self).map_err(ConfigError::Save)?;
        tracing::info!("Configuration saved");
        Ok(())
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME).map_err(ConfigError::Path)
    }
}
