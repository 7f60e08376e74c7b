//! Typed failures delivered through continuations and subscribers.

use std::sync::Arc;

use thiserror::Error;

use crate::keys::StorageError;
use crate::numbers::NumbersError;
use crate::store::StoreError;

/// Failure outcome of a load or a subscription delivery.
///
/// Inner errors are reference counted so one failure can be handed to the
/// reader container and to logging without re-creating it.
#[derive(Debug, Clone, Error)]
pub enum SharingError {
    /// Transport or decoding failure from a remote key.
    #[error("Remote load failed: {0}")]
    Remote(#[source] Arc<NumbersError>),

    /// Read or write failure from the persistence store.
    #[error("Store access failed: {0}")]
    Store(#[source] Arc<StoreError>),

    /// Failure from file, preference or in-memory storage.
    #[error("Storage failed: {0}")]
    Storage(#[source] Arc<StorageError>),

    /// The load was superseded or its task was dropped before delivering.
    #[error("Load was cancelled")]
    Cancelled,
}

impl From<NumbersError> for SharingError {
    fn from(err: NumbersError) -> Self {
        SharingError::Remote(Arc::new(err))
    }
}

impl From<StoreError> for SharingError {
    fn from(err: StoreError) -> Self {
        SharingError::Store(Arc::new(err))
    }
}

impl From<StorageError> for SharingError {
    fn from(err: StorageError) -> Self {
        SharingError::Storage(Arc::new(err))
    }
}

impl SharingError {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SharingError::Remote(_) => "remote",
            SharingError::Store(_) => "store",
            SharingError::Storage(_) => "storage",
            SharingError::Cancelled => "cancelled",
        }
    }
}
