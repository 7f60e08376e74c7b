//! Shared reader keys: a uniform way to expose external data sources to the
//! state layer as typed, observable values.
//!
//! # Architecture
//!
//! ```text
//! SharedReader ──load(context, continuation)──→ key ──→ task ──→ continuation (once)
//!      │
//!      └──subscribe(context, subscriber)──→ key ──→ bus/observer ──→ subscriber (many)
//!                          │
//!                          └──→ SharedSubscription (cancel is idempotent)
//! ```

mod continuation;
mod error;
mod key;
mod reader;
mod shared;
mod subscription;

pub use continuation::{LoadContinuation, LoadOutcome, LoadReceiver, LoadResult, SharedSubscriber};
pub use error::SharingError;
pub use key::{KeyId, LoadContext, SharedKey, SharedReaderKey};
pub use reader::SharedReader;
pub use shared::Shared;
pub use subscription::SharedSubscription;
