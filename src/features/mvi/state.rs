//! Base trait for feature state in MVI architecture.

/// Marker trait for feature state objects.
///
/// States should be:
/// - Cloneable (shared handles clone by reference)
/// - Comparable (PartialEq for detecting changes)
pub trait FeatureState: Clone + PartialEq + Send + 'static {}
