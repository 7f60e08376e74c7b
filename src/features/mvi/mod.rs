//! Model-View-Intent (MVI) primitives.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ View
//!    ↑          │                    │
//!    │          └──→ Effect ──→ Environment (async)
//!    └───────────────────────────────┘
//! ```
//!
//! - **State**: everything a screen renders, including shared handles
//! - **Intent**: user actions or system events
//! - **Reducer**: applies an intent to the state and names the side effect
//! - **Effect**: work the [`FeatureStore`] runs on the environment

mod effect;
mod intent;
mod reducer;
mod state;
mod store;

pub use effect::{Effect, Environment};
pub use intent::Intent;
pub use reducer::Reducer;
pub use state::FeatureState;
pub use store::FeatureStore;
