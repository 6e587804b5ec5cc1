//! Device-local file storage.
//!
//! Each key maps to one file in the storage directory. Keys such as
//! `@GoMarketplace:products` are not safe file names, so the file name is the
//! URL-safe base64 of the key. Writes land in a temporary file that is flushed
//! to disk and then renamed over the old value, so a reader never sees a
//! half-written cart, even after a crash or power loss.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::Storage;
use crate::error::StorageError;

/// Directory-backed slot store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir` as the storage directory without touching the filesystem.
    ///
    /// The directory is created on the first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Use `dir` as the storage directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self::new(dir);
        storage.ensure_dir().await?;
        Ok(storage)
    }

    /// The storage directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.json", URL_SAFE_NO_PAD.encode(key.as_bytes())))
    }

    /// Write `value` to `tmp` and wait until it is on disk.
    async fn write_durable(tmp: &Path, value: &str) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(tmp).await?;
        file.write_all(value.as_bytes()).await?;
        file.sync_all().await
    }

    async fn ensure_dir(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StorageError::Io {
                path: self.dir.clone(),
                source,
            })
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.ensure_dir().await?;

        let path = self.path_for(key);
        let tmp = path.with_extension(format!("json.{}.tmp", std::process::id()));

        if let Err(source) = Self::write_durable(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::Io { path: tmp, source });
        }
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|source| StorageError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), bytes = value.len(), "Wrote storage slot");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
