//! Persistent user settings.
//!
//! Two values survive restarts: the dark-mode flag and the alert
//! threshold. They are stored as JSON:
//!
//! ```json
//! {
//!   "dark_mode": true,
//!   "threshold": 300
//! }
//! ```
//!
//! Loading goes through the `config` crate so any value can be
//! overridden from the environment (`GASWATCH_THRESHOLD=450`,
//! `GASWATCH_DARK_MODE=true`).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sensor::Threshold;

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "GASWATCH";

/// Errors from reading or writing the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to write settings: {0}")]
    Io(#[from] io::Error),

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// User settings persisted between runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dark_mode: bool,
    pub threshold: Threshold,
}

/// JSON file backing [`Settings`].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a store for the given path. The file need not exist yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Store at the platform config directory, e.g.
    /// `~/.config/gaswatch/settings.json` on Linux.
    pub fn at_default_location() -> Self {
        let path = ProjectDirs::from("", "", "gaswatch")
            .map(|dirs| dirs.config_dir().join("settings.json"))
            .unwrap_or_else(|| PathBuf::from("gaswatch-settings.json"));
        Self::new(path)
    }

    /// Returns the settings file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read settings, applying environment overrides.
    ///
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let config = Config::builder()
            .add_source(
                File::from(self.path.as_path())
                    .format(FileFormat::Json)
                    .required(false),
            )
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Read settings, falling back to defaults when the file is unreadable.
    pub fn load_or_default(&self) -> Settings {
        match self.load() {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Settings::default()
            }
        }
    }

    /// Write settings, creating the parent directory if needed.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, json)?;
        tracing::debug!("saved settings to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let settings = store.load().unwrap();
        assert!(!settings.dark_mode);
        assert_eq!(settings.threshold, Threshold::DEFAULT);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("nested").join("settings.json"));

        let settings = Settings {
            dark_mode: true,
            threshold: Threshold::new(750),
        };
        store.save(&settings).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_stored_threshold_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{ "threshold": 5000 }"#).unwrap();

        let settings = SettingsStore::new(&path).load().unwrap();
        assert_eq!(settings.threshold.ppm(), 2000);
        assert!(!settings.dark_mode);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "not json").unwrap();

        let store = SettingsStore::new(&path);
        assert!(store.load().is_err());
        assert_eq!(store.load_or_default(), Settings::default());
    }
}
