use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::SettingsError;

pub const SETTINGS_FILENAME: &str = "settings.json";

/// Runtime settings, read from `settings.json`. Missing keys fall back to
/// [`Settings::default`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Path of the redb save file.
    pub database_path: String,
    /// Insert the demo accounts on startup when they are missing.
    pub seed_demo_users: bool,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_path: "doitgirl.redb".to_string(),
            seed_demo_users: true,
            log_filter: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Settings, SettingsError> {
        Self::load_from(SETTINGS_FILENAME)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings, SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}
