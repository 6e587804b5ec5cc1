//! Single-writer persistence queue.
//!
//! Every store owns one writer task. Snapshots are enqueued while the store's
//! state lock is held, so the queue order is the mutation order, and the
//! writer applies them strictly in that order. Each snapshot carries the
//! store version it was taken at; the writer skips any snapshot that is not
//! newer than the last one it persisted.
//!
//! Dropping the last [`PersistQueue`] closes the channel. Snapshots already
//! queued are still written before the task exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::error::{CartError, StorageError};
use crate::storage::Storage;

/// Outcome of a single queued write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAck {
    /// The snapshot was written.
    Written,
    /// A newer snapshot had already been persisted; this one was dropped.
    Superseded,
}

/// Reply channel for one queued write.
pub type WriteReceipt = oneshot::Receiver<Result<WriteAck, StorageError>>;

struct WriteRequest {
    version: u64,
    payload: String,
    reply: oneshot::Sender<Result<WriteAck, StorageError>>,
}

/// Handle to a store's writer task.
#[derive(Debug)]
pub struct PersistQueue {
    tx: mpsc::UnboundedSender<WriteRequest>,
    persisted: Arc<AtomicU64>,
}

impl PersistQueue {
    /// Spawn the writer task for `key` on the current tokio runtime.
    ///
    /// `persisted_version` is the version already present in storage.
    #[must_use]
    pub fn spawn(storage: Arc<dyn Storage>, key: String, persisted_version: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let persisted = Arc::new(AtomicU64::new(persisted_version));
        tokio::spawn(run(storage, key, rx, Arc::clone(&persisted)));
        Self { tx, persisted }
    }

    /// Queue a snapshot taken at `version`.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::WriterClosed`] if the writer task has exited.
    pub fn enqueue(&self, version: u64, payload: String) -> Result<WriteReceipt, CartError> {
        let (reply, receipt) = oneshot::channel();
        self.tx
            .send(WriteRequest {
                version,
                payload,
                reply,
            })
            .map_err(|_| CartError::WriterClosed)?;
        Ok(receipt)
    }

    /// Highest version the writer has persisted.
    #[must_use]
    pub fn persisted_version(&self) -> u64 {
        self.persisted.load(Ordering::Acquire)
    }
}

async fn run(
    storage: Arc<dyn Storage>,
    key: String,
    mut rx: mpsc::UnboundedReceiver<WriteRequest>,
    persisted: Arc<AtomicU64>,
) {
    debug!(backend = storage.backend(), key = %key, "Persistence writer started");

    while let Some(request) = rx.recv().await {
        let last = persisted.load(Ordering::Acquire);
        if request.version <= last {
            debug!(
                version = request.version,
                persisted = last,
                "Dropping stale cart snapshot"
            );
            let _ = request.reply.send(Ok(WriteAck::Superseded));
            continue;
        }

        let result = match storage.set(&key, &request.payload).await {
            Ok(()) => {
                persisted.fetch_max(request.version, Ordering::AcqRel);
                debug!(version = request.version, "Persisted cart snapshot");
                Ok(WriteAck::Written)
            }
            Err(e) => {
                warn!(
                    version = request.version,
                    error = %e,
                    "Failed to persist cart snapshot"
                );
                Err(e)
            }
        };

        // The caller may have stopped waiting; the write itself is done.
        let _ = request.reply.send(result);
    }

    info!(key = %key, "Persistence writer stopped");
}
