//! Shared-state toolkit: one value, many readers, pluggable persistence.
//!
//! A [`sharing::Shared`] or [`sharing::SharedReader`] handle wraps a key from
//! [`keys`]. The key decides where the value lives (memory, a JSON file, the
//! preferences file, the lock-item store or the numbers endpoint) and the
//! handle keeps its copy current.

pub mod config;
pub mod features;
pub mod keys;
pub mod logging;
pub mod models;
pub mod numbers;
pub mod sharing;
pub mod store;
