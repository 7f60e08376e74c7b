use std::path::PathBuf;

use crate::config::Config;
use crate::keys::{AppStorage, FileStorage, InMemoryStorage};
use crate::numbers::{NumbersClient, NumbersError};
use crate::store::LockItemClient;

/// Live collaborators the features read and write through.
#[derive(Clone, Debug)]
pub struct Dependencies {
    pub in_memory: InMemoryStorage,
    pub file_storage: FileStorage,
    pub app_storage: AppStorage,
    pub notes_path: PathBuf,
    pub numbers: NumbersClient,
    pub lock_items: LockItemClient,
}

impl Dependencies {
    /// Build every collaborator from configuration.
    pub fn live(config: &Config) -> Result<Self, NumbersError> {
        let storage = &config.storage;
        Ok(Self {
            in_memory: InMemoryStorage::new(),
            file_storage: FileStorage::new(),
            app_storage: AppStorage::new(storage.preferences_path()),
            notes_path: storage.notes_path(),
            numbers: NumbersClient::new(&config.numbers)?,
            lock_items: LockItemClient::open(storage.store_path()),
        })
    }
}
