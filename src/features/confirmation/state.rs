use crate::features::mvi::FeatureState;
use crate::keys::{FileStorageKey, InMemoryKey};
use crate::models::Note;
use crate::sharing::Shared;

/// State of the confirmation sheet.
///
/// Both fields address the same slots as the presenting screen, so edits
/// here show up there immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationState {
    pub note_value: Shared<InMemoryKey<String>>,
    pub notes: Shared<FileStorageKey<Vec<Note>>>,
}

impl ConfirmationState {
    pub fn new(
        note_value: Shared<InMemoryKey<String>>,
        notes: Shared<FileStorageKey<Vec<Note>>>,
    ) -> Self {
        Self { note_value, notes }
    }
}

impl FeatureState for ConfirmationState {}
