//! Key-value storage backends for the persisted cart.
//!
//! The store only needs two operations on a named slot: fetch the whole
//! value (or learn it was never written) and replace the whole value.
//!
//! Values are written as text but read back as raw bytes. Whether those bytes
//! are a valid cart, including valid UTF-8, is decided by the codec, so a
//! damaged slot is reported as corrupt data rather than a read failure.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - process-local map, for tests and ephemeral sessions
//! - [`FileStorage`] - device-local directory, one file per key
//! - `PgStorage` - `PostgreSQL` table (requires the `postgres` feature)

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::StorageConfig;
use crate::error::StorageError;

mod file;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

pub use file::FileStorage;
pub use memory::MemoryStorage;
#[cfg(feature = "postgres")]
pub use postgres::PgStorage;

/// A persistent key-value slot store.
#[async_trait]
pub trait Storage: Send + Sync + fmt::Debug {
    /// Fetch the raw value stored under `key`, or `None` if it was never
    /// written.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the value cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Short backend name for logs.
    fn backend(&self) -> &'static str;
}

/// Open the backend described by `config`.
///
/// # Errors
///
/// Returns a [`StorageError`] if the backend cannot be opened, or
/// [`StorageError::Unsupported`] for `postgres` in a build without the
/// `postgres` feature.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageConfig::File { dir } => Ok(Arc::new(FileStorage::create(dir).await?)),
        #[cfg(feature = "postgres")]
        StorageConfig::Postgres { database_url } => {
            Ok(Arc::new(PgStorage::connect(database_url).await?))
        }
        #[cfg(not(feature = "postgres"))]
        StorageConfig::Postgres { .. } => Err(StorageError::Unsupported(
            "postgres (rebuild with the `postgres` feature)".to_string(),
        )),
    }
}
