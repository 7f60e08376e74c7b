//! Base trait for intents (user/system actions) in MVI architecture.

/// Marker trait for intent objects.
///
/// Intents represent:
/// - User actions (toggles, text edits, button taps)
/// - System events (selection pickers, sheet dismissal)
///
/// Intents are processed by reducers to produce new states.
pub trait Intent: Send + 'static {}
