use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::runtime::Handle;

use crate::sharing::{
    KeyId, LoadContext, LoadContinuation, SharedKey, SharedReaderKey, SharedSubscriber,
    SharedSubscription, SharingError,
};
use crate::store::EventBus;

use super::file_storage::write_document;
use super::storage_error::StorageError;
use super::Storable;

/// Entries saved by this process, merged over the file when it is written.
#[derive(Debug, Default)]
struct Overrides {
    entries: toml::Table,
    version: u64,
    written: u64,
    write_error: Option<Arc<StorageError>>,
}

/// Preferences file holding one TOML entry per key.
///
/// Saves land in memory and notify same-name keys before returning; the
/// file is rewritten afterwards on the blocking pool.
#[derive(Clone, Debug)]
pub struct AppStorage {
    path: Arc<PathBuf>,
    overrides: Arc<Mutex<Overrides>>,
    write_lock: Arc<Mutex<()>>,
    events: EventBus<String>,
}

impl AppStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            overrides: Arc::new(Mutex::new(Overrides::default())),
            write_lock: Arc::new(Mutex::new(())),
            events: EventBus::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored entry, including saves not yet written.
    pub fn entries(&self) -> Result<toml::Table, StorageError> {
        let mut table = read_table(&self.path)?;
        table.extend(self.overrides.lock().entries.clone());
        Ok(table)
    }

    /// Write pending saves to the preferences file.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.write_pending())
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
    }

    fn cached<V: Storable>(&self, name: &str) -> Option<Result<V, SharingError>> {
        let overrides = self.overrides.lock();
        if let Some(err) = &overrides.write_error {
            return Some(Err(SharingError::Storage(Arc::clone(err))));
        }
        let value = overrides.entries.get(name)?.clone();
        Some(value.try_into().map_err(|source| {
            SharingError::from(StorageError::TomlValue {
                name: name.to_string(),
                source,
            })
        }))
    }

    fn update(&self, name: &str, value: toml::Value) {
        {
            let mut overrides = self.overrides.lock();
            overrides.entries.insert(name.to_string(), value);
            overrides.version += 1;
            overrides.write_error = None;
        }
        self.events.post(&name.to_string());

        let storage = self.clone();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || storage.write_logged());
            }
            Err(_) => storage.write_logged(),
        }
    }

    fn write_logged(&self) {
        let Err(err) = self.write_pending() else {
            return;
        };
        tracing::error!(path = %self.path.display(), error = %err, "failed to write preferences");
        let names: Vec<String> = {
            let mut overrides = self.overrides.lock();
            if overrides.written >= overrides.version {
                return;
            }
            overrides.write_error = Some(Arc::new(err));
            overrides.entries.keys().cloned().collect()
        };
        for name in &names {
            self.events.post(name);
        }
    }

    fn write_pending(&self) -> Result<(), StorageError> {
        let _writer = self.write_lock.lock();
        let (entries, version) = {
            let overrides = self.overrides.lock();
            if overrides.written >= overrides.version {
                return Ok(());
            }
            (overrides.entries.clone(), overrides.version)
        };

        let mut table = read_table(&self.path)?;
        table.extend(entries);
        let content = toml::to_string(&table).map_err(|source| StorageError::TomlEncode {
            name: self.path.display().to_string(),
            source,
        })?;
        write_document(&self.path, content.as_bytes())?;

        let mut overrides = self.overrides.lock();
        overrides.written = overrides.written.max(version);
        tracing::debug!(path = %self.path.display(), version, "preferences written");
        Ok(())
    }
}

fn read_table(path: &Path) -> Result<toml::Table, StorageError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(toml::Table::new()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    toml::from_str(&content).map_err(|source| StorageError::TomlParse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_entry<V: Storable>(path: &Path, name: &str, fallback: Option<V>) -> Result<V, StorageError> {
    let mut table = read_table(path)?;
    match table.remove(name) {
        Some(value) => value.try_into().map_err(|source| StorageError::TomlValue {
            name: name.to_string(),
            source,
        }),
        None => Ok(fallback.unwrap_or_default()),
    }
}

/// Key for one preference entry.
///
/// `load` runs on the blocking pool of the current tokio runtime and
/// panics outside one.
pub struct AppStorageKey<V> {
    name: String,
    storage: AppStorage,
    _value: PhantomData<fn() -> V>,
}

impl<V: Storable> AppStorageKey<V> {
    pub fn new(name: impl Into<String>, storage: AppStorage) -> Self {
        Self {
            name: name.into(),
            storage,
            _value: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<V: Storable> SharedReaderKey for AppStorageKey<V> {
    type Value = V;

    fn id(&self) -> KeyId {
        KeyId::for_name("app-storage", &self.name)
    }

    fn load(&self, context: LoadContext<V>, continuation: LoadContinuation<V>) {
        if let Some(result) = self.storage.cached(&self.name) {
            continuation.resume(result);
            return;
        }
        let storage = self.storage.clone();
        let name = self.name.clone();
        let fallback = context.initial_value();
        tokio::task::spawn_blocking(move || {
            let from_disk = read_entry(&storage.path, &name, fallback).map_err(SharingError::from);
            let result = storage.cached(&name).unwrap_or(from_disk);
            continuation.resume(result);
        });
    }

    fn subscribe(&self, _context: LoadContext<V>, subscriber: SharedSubscriber<V>) -> SharedSubscription {
        let storage = self.storage.clone();
        let name = self.name.clone();
        let observer = self.storage.events.observe(self.name.clone(), move |_| {
            if let Some(result) = storage.cached::<V>(&name) {
                subscriber.yield_result(result);
            }
        });

        let bus = self.storage.events.clone();
        SharedSubscription::new(move || {
            bus.remove(observer);
        })
    }
}

impl<V: Storable> SharedKey for AppStorageKey<V> {
    fn save(&self, value: &V) -> Result<(), SharingError> {
        let encoded = toml::Value::try_from(value).map_err(|source| StorageError::TomlEncode {
            name: self.name.clone(),
            source,
        })?;
        self.storage.update(&self.name, encoded);
        tracing::debug!(name = %self.name, "app storage saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::Shared;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_entries_round_trip_through_file() {
        let temp_dir = TempDir::new().unwrap();
        let storage = AppStorage::new(temp_dir.path().join("preferences.toml"));

        let count = Shared::new(AppStorageKey::<i64>::new("count", storage.clone()), 0);
        let introduced = Shared::new(AppStorageKey::<bool>::new("isIntroduced", storage.clone()), false);
        count.wait_until(|s| !s.is_loading()).await;
        introduced.wait_until(|s| !s.is_loading()).await;

        count.set(3);
        introduced.set(true);

        let entries = storage.entries().unwrap();
        assert_eq!(entries.get("count").and_then(|v| v.as_integer()), Some(3));
        assert_eq!(entries.get("isIntroduced").and_then(|v| v.as_bool()), Some(true));

        storage.flush().await.unwrap();
        let on_disk: toml::Table = toml::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(on_disk.get("count").and_then(|v| v.as_integer()), Some(3));

        let reloaded = Shared::new(
            AppStorageKey::<i64>::new("count", AppStorage::new(storage.path())),
            0,
        );
        reloaded.wait_until(|s| !s.is_loading()).await;
        assert_eq!(reloaded.wrapped(), 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rapid_updates_keep_the_last_value() {
        let temp_dir = TempDir::new().unwrap();
        let storage = AppStorage::new(temp_dir.path().join("preferences.toml"));
        fs::write(storage.path(), "theme = \"dark\"\n").unwrap();

        let count = Shared::new(AppStorageKey::<i64>::new("count", storage.clone()), 0);
        let mirror = Shared::new(AppStorageKey::<i64>::new("count", storage.clone()), 0);
        count.wait_until(|s| !s.is_loading()).await;
        mirror.wait_until(|s| !s.is_loading()).await;

        for _ in 0..20 {
            count.with_lock(|value| *value += 1);
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        assert_eq!(count.wrapped(), 20);
        assert_eq!(mirror.wrapped(), 20);

        storage.flush().await.unwrap();
        let on_disk: toml::Table = toml::from_str(&fs::read_to_string(storage.path()).unwrap()).unwrap();
        assert_eq!(on_disk.get("count").and_then(|v| v.as_integer()), Some(20));
        assert_eq!(on_disk.get("theme").and_then(|v| v.as_str()), Some("dark"));
    }

    #[tokio::test]
    async fn test_wrong_type_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("preferences.toml");
        fs::write(&path, "count = \"many\"\n").unwrap();

        let count = Shared::new(AppStorageKey::<i64>::new("count", AppStorage::new(&path)), 0);
        count.wait_until(|s| !s.is_loading()).await;
        assert!(count.load_error().is_some());
        assert_eq!(count.wrapped(), 0);
    }
}
