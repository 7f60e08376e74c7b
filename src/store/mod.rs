//! Lock item persistence and its change notifications.
//!
//! The store client serialises every operation, saves after each mutation
//! and posts [`StoreEvent::DidSave`] on its own [`EventBus`] once a save has
//! landed. Keys observe that bus instead of any process-wide channel.

mod bus;
mod client;
mod error;

pub use bus::{EventBus, ObserverId};
pub use client::{LockItemClient, StoreEvent};
pub use error::StoreError;
