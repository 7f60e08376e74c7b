//! Reducer trait for MVI architecture.

use super::effect::Effect;
use super::intent::Intent;
use super::state::FeatureState;

/// Reducer applies intents to state.
///
/// The reducer is the only place where state transitions happen. Anything
/// asynchronous is returned as an [`Effect`] instead of being performed.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: FeatureState;

    /// The intent type this reducer handles.
    type Intent: Intent;

    /// Work this reducer may ask the environment to run.
    type Task: Send + 'static;

    /// Process an intent, mutating `state`, and return the follow-up effect.
    fn reduce(state: &mut Self::State, intent: Self::Intent) -> Effect<Self::Task>;
}
