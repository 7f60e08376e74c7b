//! Configuration loaded from `~/.config/sharekit/config.toml`.

mod loader;
mod types;

pub use loader::ConfigError;
pub use types::{Config, NumbersConfig, StorageConfig};
