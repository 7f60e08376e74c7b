use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use tokio::sync::Mutex;

use crate::models::LockItem;

use super::bus::EventBus;
use super::error::StoreError;

/// Notifications posted by [`LockItemClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// A mutation was saved.
    DidSave,
}

/// In-memory working copy of the store.
#[derive(Default)]
struct ModelContext {
    /// `None` until the backing file has been read.
    items: Option<Vec<LockItem>>,
    has_changes: bool,
}

struct ClientInner {
    context: Mutex<ModelContext>,
    path: Option<PathBuf>,
    events: EventBus<StoreEvent>,
}

/// Persistence client for lock items.
///
/// Operations are serialised through one async mutex, so the client acts
/// like a single-owner actor. Cloning shares the same store and bus.
#[derive(Clone)]
pub struct LockItemClient {
    inner: Arc<ClientInner>,
}

impl LockItemClient {
    /// Store backed by a JSON file. The file is read on first use.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self::build(Some(path.into()))
    }

    /// Store that never touches disk.
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    fn build(path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                context: Mutex::new(ModelContext::default()),
                path,
                events: EventBus::new(),
            }),
        }
    }

    /// Bus carrying [`StoreEvent`]s for this store.
    pub fn events(&self) -> &EventBus<StoreEvent> {
        &self.inner.events
    }

    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Insert one item. An item with the same id is replaced.
    pub async fn add(&self, item: LockItem) -> Result<(), StoreError> {
        self.add_all(vec![item]).await
    }

    /// Insert several items and save once.
    pub async fn add_all(&self, items: Vec<LockItem>) -> Result<(), StoreError> {
        let mut context = self.inner.context.lock().await;
        let stored = self.loaded(&mut context).await?;
        let mut changed = false;
        for item in items {
            match stored.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => *existing = item,
                None => stored.push(item),
            }
            changed = true;
        }
        if changed {
            context.has_changes = true;
        }
        self.save(context).await
    }

    /// Delete the stored item with `item.id`. Missing items are ignored.
    pub async fn delete(&self, item: &LockItem) -> Result<(), StoreError> {
        let mut context = self.inner.context.lock().await;
        let stored = self.loaded(&mut context).await?;
        let Some(index) = stored.iter().position(|existing| existing.id == item.id) else {
            return Ok(());
        };
        stored.remove(index);
        context.has_changes = true;
        self.save(context).await
    }

    /// Apply `modifier` to the stored item with `item.id`, then save.
    pub async fn update<F>(&self, item: &LockItem, modifier: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut LockItem),
    {
        let mut context = self.inner.context.lock().await;
        let stored = self.loaded(&mut context).await?;
        let Some(existing) = stored.iter_mut().find(|existing| existing.id == item.id) else {
            return Ok(());
        };
        let id = existing.id;
        modifier(existing);
        // The id is the unique attribute.
        existing.id = id;
        context.has_changes = true;
        self.save(context).await
    }

    /// Full current contents in store order.
    pub async fn items(&self) -> Result<Vec<LockItem>, StoreError> {
        let mut context = self.inner.context.lock().await;
        Ok(self.loaded(&mut context).await?.clone())
    }

    /// Delete every item.
    pub async fn clear(&self) -> Result<(), StoreError> {
        let mut context = self.inner.context.lock().await;
        let stored = self.loaded(&mut context).await?;
        if !stored.is_empty() {
            stored.clear();
            context.has_changes = true;
        }
        self.save(context).await
    }

    async fn loaded<'a>(
        &self,
        context: &'a mut ModelContext,
    ) -> Result<&'a mut Vec<LockItem>, StoreError> {
        if context.items.is_none() {
            let items = match &self.inner.path {
                Some(path) => read_items(path).await?,
                None => Vec::new(),
            };
            context.items = Some(items);
        }
        Ok(context.items.get_or_insert_with(Vec::new))
    }

    /// Write pending changes, then post `DidSave` after the lock is released.
    async fn save(
        &self,
        mut context: tokio::sync::MutexGuard<'_, ModelContext>,
    ) -> Result<(), StoreError> {
        if !context.has_changes {
            return Ok(());
        }

        if let Some(path) = &self.inner.path {
            let items = context.items.clone().unwrap_or_default();
            let path = path.clone();
            tokio::task::spawn_blocking(move || write_items(&path, &items))
                .await
                .map_err(|e| StoreError::Task(e.to_string()))??;
        }

        context.has_changes = false;
        let count = context.items.as_ref().map_or(0, Vec::len);
        drop(context);

        tracing::debug!(count, "lock item store saved");
        self.inner.events.post(&StoreEvent::DidSave);
        Ok(())
    }
}

impl std::fmt::Debug for LockItemClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockItemClient")
            .field("path", &self.inner.path)
            .field("events", &self.inner.events)
            .finish()
    }
}

async fn read_items(path: &Path) -> Result<Vec<LockItem>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_slice(&bytes).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Atomic replace: write a sibling temp file under an exclusive lock, then rename.
fn write_items(path: &Path, items: &[LockItem]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let lock_path = path.with_extension("lock");
    let lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&lock_path)
        .map_err(io_err)?;
    lock_file.lock_exclusive().map_err(io_err)?;

    let json = serde_json::to_vec_pretty(items).map_err(StoreError::Serialize)?;
    let tmp_path = path.with_extension("json.tmp");
    let result = File::create(&tmp_path)
        .and_then(|mut file| {
            file.write_all(&json)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp_path, path))
        .map_err(io_err);

    let _ = FileExt::unlock(&lock_file);
    result
}
