//! Concrete shared keys.
//!
//! Reader keys ([`NumberFactKey`], [`LockItemKey`]) wrap one external source
//! and get a fresh identity per instance. Storage keys ([`InMemoryKey`],
//! [`FileStorageKey`], [`AppStorageKey`]) are writable and are identified by
//! the slot they address, so every handle to one slot shares changes.

mod app_storage;
mod file_storage;
mod in_memory;
mod lock_items;
mod number_fact;
mod reader_key;
mod storage_error;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use app_storage::{AppStorage, AppStorageKey};
pub use file_storage::{FileStorage, FileStorageKey};
pub use in_memory::{InMemoryKey, InMemoryStorage};
pub use lock_items::LockItemKey;
pub use number_fact::NumberFactKey;
pub use reader_key::{ReaderKey, ReaderValue};
pub use storage_error::StorageError;

/// Values a storage key can persist.
///
/// Missing slots load as `Default::default()` unless the load context
/// carries an initial value.
pub trait Storable: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {}

impl<T> Storable for T where T: Serialize + DeserializeOwned + Clone + Default + Send + Sync + 'static {}
