//! Live key/value configuration consumed by the running session.
//!
//! The coordinator never sees [`AppConfig`](super::AppConfig) directly.  It
//! reads three string keys through a [`ConfigSource`] every time the owner
//! asks it to reload, so preferences edited while a session is running take
//! effect without a restart.
//!
//! | Key                    | Type    | Default |
//! |------------------------|---------|---------|
//! | `sensitivity`          | integer | 30      |
//! | `desired_pace_enabled` | bool    | true    |
//! | `desired_pace_voice`   | bool    | false   |

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;

/// Step-detection sensitivity key.
pub const SENSITIVITY_KEY: &str = "sensitivity";
/// Desired-pace feature toggle key.
pub const DESIRED_PACE_ENABLED_KEY: &str = "desired_pace_enabled";
/// Spoken pace feedback toggle key.
pub const DESIRED_PACE_VOICE_KEY: &str = "desired_pace_voice";

/// Sensitivity used when the key is missing or cannot be parsed.
pub const DEFAULT_SENSITIVITY: i32 = 30;

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors raised while refreshing a file-backed [`ConfigSource`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read settings file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse settings file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ---------------------------------------------------------------------------
// ConfigSource trait
// ---------------------------------------------------------------------------

/// Read-only, string-keyed preference store.
///
/// Implementations must be `Send + Sync`; the coordinator holds one behind an
/// `Arc<dyn ConfigSource>` and may read it from any thread.
pub trait ConfigSource: Send + Sync {
    /// Raw string value for `key`, if present.
    fn get_string(&self, key: &str) -> Option<String>;

    /// Boolean value for `key`, if present and boolean-like.
    fn get_bool(&self, key: &str) -> Option<bool>;

    /// Re-read the backing store.  In-memory sources have nothing to do.
    fn reload(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Preferences  (typed snapshot)
// ---------------------------------------------------------------------------

/// Typed snapshot of the live preference keys with defaults applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub sensitivity: i32,
    pub desired_pace_enabled: bool,
    pub desired_pace_voice: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            desired_pace_enabled: true,
            desired_pace_voice: false,
        }
    }
}

impl Preferences {
    /// Read every key from `source`, falling back to the documented defaults.
    ///
    /// A sensitivity that does not parse as an integer is logged and replaced
    /// by [`DEFAULT_SENSITIVITY`]; this never fails.
    pub fn read(source: &dyn ConfigSource) -> Self {
        let defaults = Self::default();

        let sensitivity = match source.get_string(SENSITIVITY_KEY) {
            None => defaults.sensitivity,
            Some(raw) => raw.trim().parse::<i32>().unwrap_or_else(|_| {
                log::warn!(
                    "config: sensitivity {raw:?} is not an integer, using {DEFAULT_SENSITIVITY}"
                );
                DEFAULT_SENSITIVITY
            }),
        };

        Self {
            sensitivity,
            desired_pace_enabled: source
                .get_bool(DESIRED_PACE_ENABLED_KEY)
                .unwrap_or(defaults.desired_pace_enabled),
            desired_pace_voice: source
                .get_bool(DESIRED_PACE_VOICE_KEY)
                .unwrap_or(defaults.desired_pace_voice),
        }
    }

    /// The user side of the voice decision; speech availability is checked
    /// separately by the coordinator.
    pub fn wants_voice(&self) -> bool {
        self.desired_pace_enabled && self.desired_pace_voice
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// MemoryConfigSource
// ---------------------------------------------------------------------------

/// In-memory [`ConfigSource`] whose values can be changed at runtime.
///
/// Useful for embedding the coordinator in a host that keeps its own
/// preference store, and for tests.
#[derive(Debug, Default)]
pub struct MemoryConfigSource {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryConfigSource {
    /// Create an empty source; every key reads as its default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to the string form of `value`.
    pub fn set(&self, key: &str, value: impl ToString) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
    }

    /// Remove `key` so it falls back to its default.
    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
    }
}

impl ConfigSource for MemoryConfigSource {
    fn get_string(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_string(key).as_deref().and_then(parse_bool)
    }
}

// ---------------------------------------------------------------------------
// TomlConfigSource
// ---------------------------------------------------------------------------

/// [`ConfigSource`] backed by the `[preferences]` table of `settings.toml`.
///
/// Values are read leniently: `sensitivity = 30` and `sensitivity = "30"`
/// are both accepted.  A missing file behaves like an empty table.
#[derive(Debug)]
pub struct TomlConfigSource {
    path: PathBuf,
    table: RwLock<toml::Table>,
}

impl TomlConfigSource {
    /// Open `path` and load its preferences table.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = Self::empty(path);
        source.reload()?;
        Ok(source)
    }

    /// Like [`open`](Self::open), but an unreadable or malformed file is
    /// logged and served as defaults.  A later `reload()` picks the file up
    /// once it is fixed.
    pub fn open_or_default(path: impl AsRef<Path>) -> Self {
        let source = Self::empty(path);
        if let Err(e) = source.reload() {
            log::warn!("config: {e}; using default preferences until the file is fixed");
        }
        source
    }

    fn empty(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: RwLock::new(toml::Table::new()),
        }
    }

    /// Path of the backing settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_preferences(&self) -> Result<toml::Table, ConfigError> {
        if !self.path.exists() {
            return Ok(toml::Table::new());
        }

        let content = std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Read {
            path: self.path.display().to_string(),
            source,
        })?;

        let mut document: toml::Table =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: self.path.display().to_string(),
                source,
            })?;

        match document.remove("preferences") {
            Some(toml::Value::Table(preferences)) => Ok(preferences),
            _ => Ok(toml::Table::new()),
        }
    }
}

impl ConfigSource for TomlConfigSource {
    fn get_string(&self, key: &str) -> Option<String> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        match table.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        let table = self.table.read().unwrap_or_else(|e| e.into_inner());
        match table.get(key)? {
            toml::Value::Boolean(b) => Some(*b),
            toml::Value::String(s) => parse_bool(s),
            _ => None,
        }
    }

    fn reload(&self) -> Result<(), ConfigError> {
        let preferences = self.read_preferences()?;
        *self.table.write().unwrap_or_else(|e| e.into_inner()) = preferences;
        Ok(())
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
    fn empty_source_reads_defaults() {
        let prefs = Preferences::read(&MemoryConfigSource::new());
        assert_eq!(prefs, Preferences::default());
        assert_eq!(prefs.sensitivity, 30);
        assert!(!prefs.wants_voice());
    }

    #[test]
    fn malformed_sensitivity_falls_back_to_default() {
        let source = MemoryConfigSource::new();
        source.set(SENSITIVITY_KEY, "very sensitive");
        assert_eq!(Preferences::read(&source).sensitivity, DEFAULT_SENSITIVITY);

        source.set(SENSITIVITY_KEY, "");
        assert_eq!(Preferences::read(&source).sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn sensitivity_is_trimmed_and_parsed() {
        let source = MemoryConfigSource::new();
        source.set(SENSITIVITY_KEY, " 15 ");
        assert_eq!(Preferences::read(&source).sensitivity, 15);
    }

    #[test]
    fn voice_needs_both_flags() {
        let source = MemoryConfigSource::new();
        source.set(DESIRED_PACE_VOICE_KEY, true);
        assert!(Preferences::read(&source).wants_voice());

        source.set(DESIRED_PACE_ENABLED_KEY, false);
        assert!(!Preferences::read(&source).wants_voice());
    }

    #[test]
    fn unparseable_bool_uses_default() {
        let source = MemoryConfigSource::new();
        source.set(DESIRED_PACE_ENABLED_KEY, "maybe");
        assert!(Preferences::read(&source).desired_pace_enabled);
    }

    #[test]
    fn removed_key_reverts_to_default() {
        let source = MemoryConfigSource::new();
        source.set(SENSITIVITY_KEY, 5);
        source.remove(SENSITIVITY_KEY);
        assert_eq!(Preferences::read(&source).sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn toml_source_missing_file_reads_defaults() {
        let dir = tempdir().expect("temp dir");
        let source = TomlConfigSource::open(dir.path().join("absent.toml")).expect("open");
        assert_eq!(Preferences::read(&source), Preferences::default());
    }

    #[test]
    fn toml_source_accepts_string_and_integer_sensitivity() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        std::fs::write(&path, "[preferences]\nsensitivity = \"22\"\n").expect("write");
        let source = TomlConfigSource::open(&path).expect("open");
        assert_eq!(Preferences::read(&source).sensitivity, 22);

        std::fs::write(&path, "[preferences]\nsensitivity = 18\n").expect("write");
        source.reload().expect("reload");
        assert_eq!(Preferences::read(&source).sensitivity, 18);
    }

    #[test]
    fn toml_source_picks_up_changes_on_reload_only() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[preferences]\ndesired_pace_voice = false\n").expect("write");

        let source = TomlConfigSource::open(&path).expect("open");
        std::fs::write(&path, "[preferences]\ndesired_pace_voice = true\n").expect("write");
        assert_eq!(source.get_bool(DESIRED_PACE_VOICE_KEY), Some(false));

        source.reload().expect("reload");
        assert_eq!(source.get_bool(DESIRED_PACE_VOICE_KEY), Some(true));
    }

    #[test]
    fn toml_source_float_sensitivity_falls_back() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[preferences]\nsensitivity = 2.5\n").expect("write");

        let source = TomlConfigSource::open(&path).expect("open");
        assert_eq!(Preferences::read(&source).sensitivity, DEFAULT_SENSITIVITY);
    }

    #[test]
    fn malformed_file_opens_as_defaults_and_recovers_on_reload() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[preferences\n").expect("write");

        assert!(matches!(
            TomlConfigSource::open(&path),
            Err(ConfigError::Parse { .. })
        ));
        let source = TomlConfigSource::open_or_default(&path);
        assert_eq!(Preferences::read(&source), Preferences::default());

        std::fs::write(&path, "[preferences]\nsensitivity = 12\n").expect("write");
        source.reload().expect("reload");
        assert_eq!(Preferences::read(&source).sensitivity, 12);
    }

    #[test]
    fn toml_source_parse_error_keeps_previous_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[preferences]\nsensitivity = 7\n").expect("write");
        let source = TomlConfigSource::open(&path).expect("open");

        std::fs::write(&path, "[preferences\n").expect("write");
        let err = source.reload().unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert_eq!(Preferences::read(&source).sensitivity, 7);
    }
}
