//! Screens wired to shared state through MVI reducers.

pub mod confirmation;
mod dependencies;
pub mod introduce;
pub mod mvi;

pub use dependencies::Dependencies;
