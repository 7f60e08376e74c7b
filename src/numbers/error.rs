use std::string::FromUtf8Error;

use thiserror::Error;

/// Errors from fetching a number fact.
#[derive(Debug, Error)]
pub enum NumbersError {
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Response from '{url}' is not valid UTF-8: {source}")]
    Decode {
        url: String,
        #[source]
        source: FromUtf8Error,
    },
}
