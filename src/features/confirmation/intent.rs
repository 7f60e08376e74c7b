use crate::features::mvi::Intent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationIntent {
    /// Edit the draft note shared with the parent screen.
    SetNoteValue(String),
    /// Append a note dated now.
    SaveNote(String),
}

impl Intent for ConfirmationIntent {}
