use std::convert::Infallible;

use crate::features::mvi::{Effect, Reducer};
use crate::models::Note;

use super::intent::ConfirmationIntent;
use super::state::ConfirmationState;

pub struct ConfirmationReducer;

impl Reducer for ConfirmationReducer {
    type State = ConfirmationState;
    type Intent = ConfirmationIntent;
    type Task = Infallible;

    fn reduce(state: &mut Self::State, intent: Self::Intent) -> Effect<Self::Task> {
        match intent {
            ConfirmationIntent::SetNoteValue(value) => {
                state.note_value.set(value);
            }
            ConfirmationIntent::SaveNote(value) => {
                state.notes.with_lock(|notes| notes.push(Note::new(value)));
            }
        }
        Effect::None
    }
}
