use std::path::PathBuf;

use thiserror::Error;

/// Errors from file, preference and in-memory storage keys.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Value for '{name}' could not be converted: {source}")]
    Encode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid preferences file '{path}': {source}")]
    TomlParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Preference '{name}' could not be stored: {source}")]
    TomlEncode {
        name: String,
        #[source]
        source: toml::ser::Error,
    },

    #[error("Preference '{name}' has an unexpected type: {source}")]
    TomlValue {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Storage writer task failed: {0}")]
    Task(String),
}
