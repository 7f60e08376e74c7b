use std::collections::BTreeSet;

use crate::features::confirmation::ConfirmationIntent;
use crate::features::mvi::Intent;
use crate::models::ApplicationToken;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroduceIntent {
    SetIsIntroduced(bool),
    SetNoteValue(String),
    /// Store the count and swap in a number fact key for it.
    SetCount(i64),
    ConfirmButtonTapped,
    Confirmation(ConfirmationIntent),
    DismissConfirmation,
    /// New application selection from the picker.
    SetSelection(BTreeSet<ApplicationToken>),
    ClearLockItems,
}

impl Intent for IntroduceIntent {}
