use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub numbers: NumbersConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Settings for the numbers trivia endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumbersConfig {
    /// Endpoint base URL; the number is appended as the last path segment.
    #[serde(default = "default_numbers_base_url")]
    pub base_url: String,
    /// Total request timeout in seconds (default: 10).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Connection timeout in seconds (default: 5).
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u32,
}

/// Where persisted state lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Data directory. Falls back to `dirs::data_dir()/sharekit`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Lock item store file, relative to the data directory.
    #[serde(default = "default_store_file")]
    pub store_file: String,
    /// Notes file (file storage), relative to the data directory.
    #[serde(default = "default_notes_file")]
    pub notes_file: String,
    /// Preferences file (app storage), relative to the data directory.
    #[serde(default = "default_preferences_file")]
    pub preferences_file: String,
}

fn default_numbers_base_url() -> String {
    "http://numbersapi.com".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_connect_timeout() -> u32 {
    5
}

fn default_store_file() -> String {
    "lock_items.json".to_string()
}

fn default_notes_file() -> String {
    "notes.json".to_string()
}

fn default_preferences_file() -> String {
    "preferences.toml".to_string()
}

impl Default for NumbersConfig {
    fn default() -> Self {
        Self {
            base_url: default_numbers_base_url(),
            timeout_seconds: default_timeout(),
            connect_timeout_seconds: default_connect_timeout(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            store_file: default_store_file(),
            notes_file: default_notes_file(),
            preferences_file: default_preferences_file(),
        }
    }
}

impl StorageConfig {
    /// Resolved data directory.
    pub fn data_dir(&self) -> PathBuf {
        match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("sharekit"),
        }
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir().join(&self.store_file)
    }

    pub fn notes_path(&self) -> PathBuf {
        self.data_dir().join(&self.notes_file)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join(&self.preferences_file)
    }
}
