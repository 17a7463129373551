mod config;
mod error;

pub use config::{AppConfig, AppConfigExt, EffectSettings, SimulationSettings};
pub use error::ConfigError;
