use std::collections::BTreeSet;

use crate::features::confirmation::ConfirmationState;
use crate::features::mvi::FeatureState;
use crate::features::Dependencies;
use crate::keys::{AppStorageKey, FileStorageKey, InMemoryKey, LockItemKey, NumberFactKey};
use crate::models::{ApplicationToken, Note};
use crate::sharing::{Shared, SharedReader};

/// Slot names, kept stable so persisted values survive upgrades.
pub const IS_INTRODUCED: &str = "isIntroduced";
pub const COUNT: &str = "count";
pub const NOTE_VALUE: &str = "noteValue";

#[derive(Debug, Clone, PartialEq)]
pub struct IntroduceState {
    pub is_introduced: Shared<AppStorageKey<bool>>,
    pub count: Shared<AppStorageKey<i64>>,
    pub note_value: Shared<InMemoryKey<String>>,
    pub notes: Shared<FileStorageKey<Vec<Note>>>,
    pub number_description: SharedReader<NumberFactKey>,
    pub lock_items: SharedReader<LockItemKey>,
    pub confirmation: Option<ConfirmationState>,
    pub selection: BTreeSet<ApplicationToken>,
}

impl IntroduceState {
    /// Must be called inside a tokio runtime; every handle starts loading.
    pub fn new(dependencies: &Dependencies) -> Self {
        Self {
            is_introduced: Shared::new(
                AppStorageKey::new(IS_INTRODUCED, dependencies.app_storage.clone()),
                false,
            ),
            count: Shared::new(AppStorageKey::new(COUNT, dependencies.app_storage.clone()), 0),
            note_value: Shared::new(
                InMemoryKey::new(NOTE_VALUE, dependencies.in_memory.clone()),
                String::new(),
            ),
            notes: Shared::new(
                FileStorageKey::new(dependencies.notes_path.clone(), dependencies.file_storage.clone()),
                Vec::new(),
            ),
            number_description: SharedReader::new(
                NumberFactKey::api(None, dependencies.numbers.clone()),
                None,
            ),
            lock_items: SharedReader::new(
                LockItemKey::new(dependencies.lock_items.clone()),
                Vec::new(),
            ),
            confirmation: None,
            selection: BTreeSet::new(),
        }
    }

    /// True once every handle has finished its current load.
    pub fn is_settled(&self) -> bool {
        !(self.is_introduced.is_loading()
            || self.count.is_loading()
            || self.note_value.is_loading()
            || self.notes.is_loading()
            || self.number_description.is_loading()
            || self.lock_items.is_loading())
    }
}

impl FeatureState for IntroduceState {}
