//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.
//! Every section is `#[serde(default)]`, so a hand-edited file only needs the
//! keys it wants to override.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// PreferencesConfig
// ---------------------------------------------------------------------------

/// User preferences that the running session re-reads on every reload.
///
/// The same `[preferences]` table is exposed to the coordinator through
/// [`TomlConfigSource`](super::TomlConfigSource); this typed view is what
/// gets written out on first run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesConfig {
    /// Step-detection sensitivity handed to the step source.
    pub sensitivity: i32,
    /// Whether the desired-pace feature is on at all.
    pub desired_pace_enabled: bool,
    /// Whether pace feedback should be spoken.
    pub desired_pace_voice: bool,
    /// Target pace in steps per minute; `0` disables pace feedback.
    pub desired_pace: u32,
}

impl Default for PreferencesConfig {
    fn default() -> Self {
        Self {
            sensitivity: 30,
            desired_pace_enabled: true,
            desired_pace_voice: false,
            desired_pace: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// PaceConfig
// ---------------------------------------------------------------------------

/// Tuning for the pace estimator and spoken feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaceConfig {
    /// Number of inter-step intervals averaged into one estimate.
    pub window_size: usize,
    /// Intervals required before the first estimate is published.
    pub min_intervals: usize,
    /// A gap longer than this means the walker stopped; the window restarts
    /// and `tick()` decays the pace to zero.
    pub idle_timeout_ms: u64,
    /// Minimum gap between two spoken feedback phrases.
    pub min_speech_gap_ms: u64,
}

impl Default for PaceConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            min_intervals: 3,
            idle_timeout_ms: 2_000,
            min_speech_gap_ms: 3_000,
        }
    }
}

// ---------------------------------------------------------------------------
// StatusConfig
// ---------------------------------------------------------------------------

/// Text shown by the persistent status indicator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Notice title (the application name).
    pub title: String,
    /// Notice subtitle shown under the title while counting.
    pub subtitle: String,
    /// One-off acknowledgment shown when the session stops.
    pub stopped_message: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            title: "Pedometer".into(),
            subtitle: "Counting your steps".into(),
            stopped_message: "Pedometer stopped".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SimulationConfig
// ---------------------------------------------------------------------------

/// Settings for the simulated step source used by the headless binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Cadence of the simulated walker in steps per minute.
    pub cadence_spm: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self { cadence_spm: 110 }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use pedometer_service::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Live user preferences.
    pub preferences: PreferencesConfig,
    /// Pace estimator tuning.
    pub pace: PaceConfig,
    /// Status indicator text.
    pub status: StatusConfig,
    /// Simulated walker for headless runs.
    pub simulation: SimulationConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario).
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns `true` when no `settings.toml` file exists yet.
    pub fn is_first_run() -> bool {
        !AppPaths::new().settings_file.exists()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");

        assert_eq!(config.preferences.sensitivity, 30);
        assert_eq!(config.pace, PaceConfig::default());
        assert_eq!(config.status, StatusConfig::default());
    }

    #[test]
    fn default_values() {
        let cfg = AppConfig::default();

        assert_eq!(cfg.preferences.sensitivity, 30);
        assert!(cfg.preferences.desired_pace_enabled);
        assert!(!cfg.preferences.desired_pace_voice);
        assert_eq!(cfg.pace.window_size, 10);
        assert_eq!(cfg.pace.idle_timeout_ms, 2_000);
        assert_eq!(cfg.status.title, "Pedometer");
        assert_eq!(cfg.status.stopped_message, "Pedometer stopped");
        assert_eq!(cfg.simulation.cadence_spm, 110);
    }

    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.preferences.sensitivity = 12;
        cfg.preferences.desired_pace_voice = true;
        cfg.preferences.desired_pace = 130;
        cfg.pace.window_size = 6;
        cfg.status.subtitle = "Walking".into();
        cfg.simulation.cadence_spm = 90;

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.preferences.sensitivity, 12);
        assert!(loaded.preferences.desired_pace_voice);
        assert_eq!(loaded.preferences.desired_pace, 130);
        assert_eq!(loaded.pace.window_size, 6);
        assert_eq!(loaded.status.subtitle, "Walking");
        assert_eq!(loaded.simulation.cadence_spm, 90);
    }

    /// A file that only overrides one key keeps defaults everywhere else.
    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[pace]\nwindow_size = 4\n").expect("write");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.pace.window_size, 4);
        assert_eq!(loaded.pace.min_intervals, 3);
        assert_eq!(loaded.preferences.sensitivity, 30);
        assert_eq!(loaded.status.title, "Pedometer");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[pace\nwindow_size = ").expect("write");

        assert!(AppConfig::load_from(&path).is_err());
    }
}
