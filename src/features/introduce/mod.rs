//! Main screen: one section per sharing strategy.

mod environment;
mod intent;
mod reducer;
mod state;

pub use environment::{IntroduceEnvironment, IntroduceTask};
pub use intent::IntroduceIntent;
pub use reducer::IntroduceReducer;
pub use state::IntroduceState;

use crate::features::mvi::FeatureStore;
use crate::features::Dependencies;

pub type IntroduceStore = FeatureStore<IntroduceReducer, IntroduceEnvironment>;

/// Store for the main screen over live dependencies.
pub fn introduce_store(dependencies: &Dependencies) -> IntroduceStore {
    FeatureStore::new(
        IntroduceState::new(dependencies),
        IntroduceEnvironment::new(dependencies.lock_items.clone()),
    )
}
