//! Error types for the cart store.
//!
//! Storage failures never escape as panics: reads during `load` are folded
//! into a [`LoadOutcome`](crate::LoadOutcome), writes during a mutation come
//! back to the caller as [`CartError::Persist`].

use std::path::PathBuf;

use go_marketplace_core::{CartChange, CartStateError};
use thiserror::Error;

use crate::codec::CodecError;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Database operation failed.
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed.
    #[cfg(feature = "postgres")]
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The configured backend is not available in this build.
    #[error("Storage backend not supported: {0}")]
    Unsupported(String),

    /// Backend-specific failure that has no richer representation.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Application-level error type for cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// A mutating operation was called before `load`.
    #[error("cart store is not initialized; call load() first")]
    NotInitialized,

    /// `load` was called on a store that is already initialized.
    #[error("cart store is already initialized")]
    AlreadyInitialized,

    /// The operation would break a cart invariant.
    #[error("invalid cart operation: {0}")]
    State(#[from] CartStateError),

    /// The cart could not be serialized.
    #[error("failed to encode cart: {0}")]
    Codec(#[from] CodecError),

    /// The in-memory change was applied but writing it to storage failed.
    ///
    /// The change is kept; `sync_status` reports the store as dirty until a
    /// later write or `flush` succeeds.
    #[error("cart change applied but version {version} was not persisted: {source}")]
    Persist {
        /// The change that was applied in memory.
        change: CartChange,
        /// Version of the snapshot that failed to persist.
        version: u64,
        /// Underlying storage failure.
        #[source]
        source: StorageError,
    },

    /// The persistence writer task is gone.
    #[error("persistence writer has stopped")]
    WriterClosed,

    /// Opening the storage backend failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CartError {
    /// The change that was applied in memory despite the error, if any.
    #[must_use]
    pub const fn applied_change(&self) -> Option<&CartChange> {
        match self {
            Self::Persist { change, .. } => Some(change),
            _ => None,
        }
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;
