//! CLI command implementations.

pub mod cart;
#[cfg(feature = "postgres")]
pub mod migrate;

use go_marketplace_cart::{CartError, ConfigError, StorageError};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Storage backend could not be opened.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// The command does not apply to the configured backend.
    #[cfg(feature = "postgres")]
    #[error("Unsupported: {0}")]
    Unsupported(&'static str),
}
