//! Note confirmation sheet.

mod intent;
mod reducer;
mod state;

pub use intent::ConfirmationIntent;
pub use reducer::ConfirmationReducer;
pub use state::ConfirmationState;
