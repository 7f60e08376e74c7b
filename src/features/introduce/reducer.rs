use std::collections::BTreeSet;

use crate::features::confirmation::{ConfirmationIntent, ConfirmationReducer, ConfirmationState};
use crate::features::mvi::{Effect, Reducer};
use crate::keys::NumberFactKey;
use crate::models::{ApplicationToken, LockItem};

use super::environment::IntroduceTask;
use super::intent::IntroduceIntent;
use super::state::IntroduceState;

pub struct IntroduceReducer;

impl Reducer for IntroduceReducer {
    type State = IntroduceState;
    type Intent = IntroduceIntent;
    type Task = IntroduceTask;

    fn reduce(state: &mut Self::State, intent: Self::Intent) -> Effect<Self::Task> {
        match intent {
            IntroduceIntent::SetIsIntroduced(value) => {
                state.is_introduced.set(value);
                Effect::None
            }
            IntroduceIntent::SetNoteValue(value) => {
                state.note_value.set(value);
                Effect::None
            }
            IntroduceIntent::SetCount(count) => {
                state.count.set(count);
                let client = state.number_description.key().client().clone();
                state
                    .number_description
                    .replace_key(NumberFactKey::api(Some(count), client));
                Effect::None
            }
            IntroduceIntent::ConfirmButtonTapped => {
                state.confirmation = Some(ConfirmationState::new(
                    state.note_value.clone(),
                    state.notes.clone(),
                ));
                Effect::None
            }
            IntroduceIntent::Confirmation(intent) => {
                let Some(confirmation) = state.confirmation.as_mut() else {
                    tracing::debug!(?intent, "confirmation intent without an open sheet");
                    return Effect::None;
                };
                let dismiss = matches!(intent, ConfirmationIntent::SaveNote(_));
                match ConfirmationReducer::reduce(confirmation, intent) {
                    Effect::None => {}
                    Effect::Run(never) => match never {},
                }
                if dismiss {
                    state.confirmation = None;
                }
                Effect::None
            }
            IntroduceIntent::DismissConfirmation => {
                state.confirmation = None;
                Effect::None
            }
            IntroduceIntent::SetSelection(selection) => {
                if selection == state.selection {
                    return Effect::None;
                }
                let stored: BTreeSet<ApplicationToken> = state
                    .lock_items
                    .wrapped()
                    .into_iter()
                    .map(|item| item.token)
                    .collect();
                let added: Vec<LockItem> = selection
                    .iter()
                    .filter(|token| !stored.contains(*token))
                    .cloned()
                    .map(LockItem::new)
                    .collect();
                state.selection = selection;
                if added.is_empty() {
                    Effect::None
                } else {
                    Effect::Run(IntroduceTask::AddLockItems(added))
                }
            }
            IntroduceIntent::ClearLockItems => Effect::Run(IntroduceTask::ClearLockItems),
        }
    }
}
