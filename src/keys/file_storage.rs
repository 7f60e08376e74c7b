use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{ErrorKind, Write};
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

use super::storage_error::StorageError;
use super::Storable;

/// Latest saved value of one document and how far the disk has caught up.
struct Document {
    value: serde_json::Value,
    version: u64,
    written: u64,
    write_error: Option<Arc<StorageError>>,
}

/// Documents shared by every [`FileStorageKey`] built from it.
///
/// A save replaces the cached document and notifies same-path keys with
/// that value before returning. The disk write runs afterwards on the
/// blocking pool, always with the newest cached value, so a slow write
/// never reaches observers as a stale value. Edits made outside the
/// process are not observed.
#[derive(Clone, Default)]
pub struct FileStorage {
    documents: Arc<Mutex<HashMap<PathBuf, Document>>>,
    write_lock: Arc<Mutex<()>>,
    events: EventBus<PathBuf>,
}

impl FileStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every document whose latest save has not reached disk yet.
    pub async fn flush(&self) -> Result<(), StorageError> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || {
            let paths: Vec<PathBuf> = storage.documents.lock().keys().cloned().collect();
            paths.iter().try_for_each(|path| storage.write_pending(path))
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }

    /// Newest saved value for `path`, if this process saved one.
    fn cached<V: Storable>(&self, path: &Path) -> Option<Result<V, SharingError>> {
        let documents = self.documents.lock();
        let document = documents.get(path)?;
        if let Some(err) = &document.write_error {
            return Some(Err(SharingError::Storage(Arc::clone(err))));
        }
        Some(
            serde_json::from_value(document.value.clone()).map_err(|source| {
                SharingError::from(StorageError::Json {
                    path: path.to_path_buf(),
                    source,
                })
            }),
        )
    }

    fn store(&self, path: &Path, value: serde_json::Value) {
        {
            let mut documents = self.documents.lock();
            let document = documents
                .entry(path.to_path_buf())
                .or_insert_with(|| Document {
                    value: serde_json::Value::Null,
                    version: 0,
                    written: 0,
                    write_error: None,
                });
            document.value = value;
            document.version += 1;
            document.write_error = None;
        }
        self.events.post(&path.to_path_buf());
        self.schedule_write(path.to_path_buf());
    }

    fn schedule_write(&self, path: PathBuf) {
        let storage = self.clone();
        match Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn_blocking(move || storage.write_logged(&path));
            }
            // Outside a runtime the write runs on the caller.
            Err(_) => storage.write_logged(&path),
        }
    }

    fn write_logged(&self, path: &Path) {
        let Err(err) = self.write_pending(path) else {
            return;
        };
        tracing::error!(path = %path.display(), error = %err, "failed to write file storage document");
        {
            let mut documents = self.documents.lock();
            match documents.get_mut(path) {
                Some(document) if document.written < document.version => {
                    document.write_error = Some(Arc::new(err));
                }
                _ => return,
            }
        }
        self.events.post(&path.to_path_buf());
    }

    /// Bring `path` on disk up to its latest saved version.
    fn write_pending(&self, path: &Path) -> Result<(), StorageError> {
        let _writer = self.write_lock.lock();
        let (value, version) = {
            let documents = self.documents.lock();
            match documents.get(path) {
                Some(document) if document.written < document.version => {
                    (document.value.clone(), document.version)
                }
                _ => return Ok(()),
            }
        };

        let bytes = serde_json::to_vec_pretty(&value).map_err(|source| StorageError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        write_document(path, &bytes)?;

        if let Some(document) = self.documents.lock().get_mut(path) {
            document.written = document.written.max(version);
        }
        tracing::debug!(path = %path.display(), version, "file storage written");
        Ok(())
    }
}

impl fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStorage")
            .field("documents", &self.documents.lock().len())
            .field("events", &self.events)
            .finish()
    }
}

/// Key for a JSON document on disk.
///
/// `load` spawns onto the current tokio runtime and panics outside one.
pub struct FileStorageKey<V> {
    path: PathBuf,
    storage: FileStorage,
    _value: PhantomData<fn() -> V>,
}

impl<V: Storable> FileStorageKey<V> {
    pub fn new(path: impl Into<PathBuf>, storage: FileStorage) -> Self {
        Self {
            path: path.into(),
            storage,
            _value: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn read_document<V: Storable>(path: &Path, fallback: Option<V>) -> Result<V, StorageError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(fallback.unwrap_or_default()),
        Err(source) => {
            return Err(StorageError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|source| StorageError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Replace `path` with `bytes` via a sibling temp file and a rename.
pub(super) fn write_document(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    let io_err = |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path))
        .map_err(io_err)
}

impl<V: Storable> SharedReaderKey for FileStorageKey<V> {
    type Value = V;

    fn id(&self) -> KeyId {
        KeyId::for_name("file-storage", &self.path.to_string_lossy())
    }

    fn load(&self, context: LoadContext<V>, continuation: LoadContinuation<V>) {
        if let Some(result) = self.storage.cached(&self.path) {
            continuation.resume(result);
            return;
        }
        let storage = self.storage.clone();
        let path = self.path.clone();
        let fallback = context.initial_value();
        tokio::spawn(async move {
            let from_disk = read_document(&path, fallback).await.map_err(SharingError::from);
            // A save that landed during the read is newer than the file.
            let result = storage.cached(&path).unwrap_or(from_disk);
            continuation.resume(result);
        });
    }

    fn subscribe(&self, _context: LoadContext<V>, subscriber: SharedSubscriber<V>) -> SharedSubscription {
        let storage = self.storage.clone();
        let path = self.path.clone();
        let observer = self.storage.events.observe(self.path.clone(), move |_| {
            if let Some(result) = storage.cached::<V>(&path) {
                subscriber.yield_result(result);
            }
        });

        let bus = self.storage.events.clone();
        SharedSubscription::new(move || {
            bus.remove(observer);
        })
    }
}

impl<V: Storable> SharedKey for FileStorageKey<V> {
    fn save(&self, value: &V) -> Result<(), SharingError> {
        let json = serde_json::to_value(value).map_err(|source| StorageError::Json {
            path: self.path.clone(),
            source,
        })?;
        self.storage.store(&self.path, json);
        tracing::debug!(path = %self.path.display(), "file storage saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Note;
    use crate::sharing::Shared;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_file_loads_initial_value() {
        let temp_dir = TempDir::new().unwrap();
        let key = FileStorageKey::<Vec<Note>>::new(temp_dir.path().join("notes.json"), FileStorage::new());
        let shared = Shared::new(key, Vec::new());
        shared.wait_until(|s| !s.is_loading()).await;
        assert!(shared.wrapped().is_empty());
        assert!(shared.load_error().is_none());
    }

    #[tokio::test]
    async fn test_save_writes_json_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("docs").join("notes.json");
        let storage = FileStorage::new();

        let shared = Shared::new(FileStorageKey::<Vec<Note>>::new(&path, storage.clone()), Vec::new());
        shared.wait_until(|s| !s.is_loading()).await;
        shared.with_lock(|notes| notes.push(Note::new("first")));
        storage.flush().await.unwrap();

        let on_disk: Vec<Note> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 1);

        let reopened = Shared::new(FileStorageKey::<Vec<Note>>::new(&path, FileStorage::new()), Vec::new());
        reopened.wait_until(|s| !s.is_loading()).await;
        assert_eq!(reopened.wrapped()[0].value, "first");
    }

    #[tokio::test]
    async fn test_invalid_json_is_a_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        fs::write(&path, "{ nope").unwrap();

        let shared = Shared::new(FileStorageKey::<Vec<Note>>::new(&path, FileStorage::new()), Vec::new());
        shared.wait_until(|s| !s.is_loading()).await;
        assert!(shared.load_error().is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rapid_appends_are_all_kept() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("numbers.json");
        let storage = FileStorage::new();

        let shared = Shared::new(FileStorageKey::<Vec<u32>>::new(&path, storage.clone()), Vec::new());
        let other = Shared::new(FileStorageKey::<Vec<u32>>::new(&path, storage.clone()), Vec::new());
        shared.wait_until(|s| !s.is_loading()).await;
        other.wait_until(|s| !s.is_loading()).await;

        for i in 0..20 {
            shared.with_lock(|values| values.push(i));
        }
        tokio::time::sleep(Duration::from_millis(100)).await;

        let expected: Vec<u32> = (0..20).collect();
        assert_eq!(shared.wrapped(), expected);
        assert_eq!(other.wrapped(), expected);

        storage.flush().await.unwrap();
        let on_disk: Vec<u32> = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, expected);
    }

    #[tokio::test]
    async fn test_new_handle_sees_unflushed_save() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("notes.json");
        let storage = FileStorage::new();

        let writer = Shared::new(FileStorageKey::<Vec<u32>>::new(&path, storage.clone()), Vec::new());
        writer.wait_until(|s| !s.is_loading()).await;
        writer.set(vec![7]);

        let reader = Shared::new(FileStorageKey::<Vec<u32>>::new(&path, storage), Vec::new());
        reader.wait_until(|s| !s.is_loading()).await;
        assert_eq!(reader.wrapped(), vec![7]);
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_as_load_error() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let storage = FileStorage::new();

        let shared = Shared::new(
            FileStorageKey::<Vec<u32>>::new(blocker.join("notes.json"), storage.clone()),
            Vec::new(),
        );
        shared.wait_until(|s| !s.is_loading()).await;
        shared.set(vec![1]);

        assert!(storage.flush().await.is_err());
        tokio::time::timeout(
            Duration::from_secs(2),
            shared.wait_until(|s| s.load_error().is_some()),
        )
        .await
        .unwrap();
        assert_eq!(shared.wrapped(), vec![1]);
    }
}
