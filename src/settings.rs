//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/blockfall/settings.toml (or platform equivalent)

use crate::game::Timing;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Errors reading or writing the settings file
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SettingsError {
    #[display("could not determine config directory")]
    #[from(skip)]
    NoConfigDir,
    #[display("settings file I/O failed: {_0}")]
    Io(std::io::Error),
    #[display("invalid settings file: {_0}")]
    Parse(toml::de::Error),
    #[display("failed to serialize settings: {_0}")]
    Serialize(toml::ser::Error),
}

/// Game settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Engine delays
    pub timing: TimingSettings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// Keybindings
    pub keys: KeyBindings,
}

/// Engine delays in milliseconds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    pub gravity_ms: u64,
    pub repeat_move_ms: u64,
    pub drop_step_ms: u64,
    pub clear_delay_ms: u64,
    pub spawn_delay_ms: u64,
    pub auto_reset_ms: u64,
    /// How long a key must be held before it counts as a long press
    pub long_press_ms: u64,
}

/// Gameplay settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Fixed piece sequence; random per run when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Ghost piece visibility
    pub show_ghost: bool,
}

/// Key bindings (stored as strings for easy editing)
/// Each command can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_down: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub start: Vec<String>,
    /// Toggles between pause and resume
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub reset: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            gravity_ms: timing.gravity.as_millis() as u64,
            repeat_move_ms: timing.repeat_move.as_millis() as u64,
            drop_step_ms: timing.drop_step.as_millis() as u64,
            clear_delay_ms: timing.clear_delay.as_millis() as u64,
            spawn_delay_ms: timing.spawn_delay.as_millis() as u64,
            auto_reset_ms: timing.auto_reset.as_millis() as u64,
            long_press_ms: 250,
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            seed: None,
            show_ghost: true,
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_left: vec!["Left".to_string(), "a".to_string()],
            move_right: vec!["Right".to_string(), "d".to_string()],
            move_down: vec!["Down".to_string(), "s".to_string()],
            rotate: vec!["Up".to_string(), "w".to_string()],
            drop: vec!["Space".to_string()],
            start: vec!["Enter".to_string()],
            pause: vec!["p".to_string(), "Esc".to_string()],
            reset: vec!["r".to_string()],
            quit: vec!["q".to_string()],
        }
    }
}

impl From<&TimingSettings> for Timing {
    fn from(settings: &TimingSettings) -> Self {
        Self {
            gravity: Duration::from_millis(settings.gravity_ms),
            repeat_move: Duration::from_millis(settings.repeat_move_ms),
            drop_step: Duration::from_millis(settings.drop_step_ms),
            clear_delay: Duration::from_millis(settings.clear_delay_ms),
            spawn_delay: Duration::from_millis(settings.spawn_delay_ms),
            auto_reset: Duration::from_millis(settings.auto_reset_ms),
        }
    }
}

impl TimingSettings {
    pub fn long_press(&self) -> Duration {
        Duration::from_millis(self.long_press_ms)
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "blockfall", "blockfall")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the config directory.
    ///
    /// A missing file is created with the defaults; an unreadable one is
    /// reported and replaced by the defaults for this run only.
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else {
            tracing::warn!("No config directory, using default settings");
            return Self::default();
        };

        if !path.exists() {
            let settings = Self::default();
            match settings.save_to(&path) {
                Ok(()) => tracing::info!("Wrote default settings to {}", path.display()),
                Err(e) => tracing::warn!("Could not write default settings: {}", e),
            }
            return settings;
        }

        match Self::load_from(&path) {
            Ok(settings) => {
                tracing::debug!("Loaded settings from {}", path.display());
                settings
            }
            Err(e) => {
                tracing::warn!("{}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Read settings from a specific file
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<(), SettingsError> {
        let path = Self::settings_path().ok_or(SettingsError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Write settings to a specific file, creating its directory if needed
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Engine delays
    pub fn timing(&self) -> Timing {
        Timing::from(&self.timing)
    }

    /// Configured seed, or a fresh random one
    pub fn seed(&self) -> u64 {
        self.gameplay.seed.unwrap_or_else(rand::random)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("blockfall-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_default_timing_matches_engine() {
        let settings = Settings::default();
        assert_eq!(settings.timing(), Timing::default());
        assert_eq!(settings.timing.long_press(), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [timing]
            gravity_ms = 800

            [gameplay]
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(settings.timing().gravity, Duration::from_millis(800));
        assert_eq!(settings.timing.drop_step_ms, 5);
        assert_eq!(settings.gameplay.seed, Some(42));
        assert_eq!(settings.seed(), 42);
        assert!(settings.gameplay.show_ghost);
        assert_eq!(settings.keys, KeyBindings::default());
    }

    #[test]
    fn test_keys_accept_string_or_array() {
        let settings: Settings = toml::from_str(
            r#"
            [keys]
            rotate = "x"
            drop = ["Space", "Enter"]
            "#,
        )
        .unwrap();
        assert_eq!(settings.keys.rotate, vec!["x"]);
        assert_eq!(settings.keys.drop, vec!["Space", "Enter"]);
        assert_eq!(settings.keys.quit, vec!["q"]);
    }

    #[test]
    fn test_save_and_load_file() {
        let path = temp_file("roundtrip/settings.toml");
        let mut settings = Settings::default();
        settings.gameplay.seed = Some(7);
        settings.keys.drop = vec!["Space".to_string()];
        settings.timing.spawn_delay_ms = 120;

        settings.save_to(&path).unwrap();
        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let path = temp_file("does-not-exist.toml");
        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let path = temp_file("invalid/settings.toml");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[timing]\ngravity_ms = \"fast\"\n").unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
        assert!(err.to_string().starts_with("invalid settings file"));

        let _ = fs::remove_file(&path);
    }
}
