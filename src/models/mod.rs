//! Flat data types shared by storage and features.

mod lock_item;
mod note;

pub use lock_item::{ApplicationToken, LockItem};
pub use note::{newest_first, Note};
