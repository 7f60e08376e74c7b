//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_numbers;

use sharekit::config::{Config, NumbersConfig, StorageConfig};
use sharekit::features::Dependencies;
use sharekit::numbers::NumbersClient;
use sharekit::sharing::{SharedReader, SharedReaderKey};
use std::time::Duration;
use tempfile::TempDir;

/// Upper bound for any single wait in the integration tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// Numbers client pointed at `base_url` with short timeouts.
pub fn numbers_client(base_url: &str) -> NumbersClient {
    NumbersClient::new(&NumbersConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
        connect_timeout_seconds: 2,
    })
    .expect("Failed to build numbers client")
}

/// Config whose storage lives in a fresh temp dir.
pub fn temp_config(numbers_url: &str) -> (TempDir, Config) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config = Config {
        numbers: NumbersConfig {
            base_url: numbers_url.to_string(),
            timeout_seconds: 5,
            connect_timeout_seconds: 2,
        },
        storage: StorageConfig {
            data_dir: Some(temp_dir.path().to_path_buf()),
            ..StorageConfig::default()
        },
    };
    (temp_dir, config)
}

/// Live dependencies over a temp data dir.
pub fn temp_dependencies(numbers_url: &str) -> (TempDir, Dependencies) {
    let (temp_dir, config) = temp_config(numbers_url);
    let dependencies = Dependencies::live(&config).expect("Failed to build dependencies");
    (temp_dir, dependencies)
}

/// Wait until `predicate` holds for `reader`, panicking after [`WAIT`].
pub async fn eventually<K, F>(reader: &SharedReader<K>, predicate: F)
where
    K: SharedReaderKey,
    F: FnMut(&SharedReader<K>) -> bool,
{
    tokio::time::timeout(WAIT, reader.wait_until(predicate))
        .await
        .expect("Timed out waiting for reader state");
}

/// Wait until the reader has no load in flight.
pub async fn settled<K: SharedReaderKey>(reader: &SharedReader<K>) {
    eventually(reader, |r| !r.is_loading()).await;
}
