use std::path::PathBuf;

use thiserror::Error;

/// Errors from the lock item store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Store file '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode store contents: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Store save task failed: {0}")]
    Task(String),
}
