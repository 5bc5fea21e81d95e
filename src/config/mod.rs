//! Configuration module for the pedometer service.
//!
//! Provides `AppConfig` (static settings persisted as TOML), `AppPaths` for
//! the platform config directory, and the live [`ConfigSource`] the session
//! re-reads on every reload.

pub mod paths;
pub mod settings;
pub mod source;

pub use paths::AppPaths;
pub use settings::{AppConfig, PaceConfig, PreferencesConfig, SimulationConfig, StatusConfig};
pub use source::{
    ConfigError, ConfigSource, MemoryConfigSource, Preferences, TomlConfigSource,
    DEFAULT_SENSITIVITY, DESIRED_PACE_ENABLED_KEY, DESIRED_PACE_VOICE_KEY, SENSITIVITY_KEY,
};
