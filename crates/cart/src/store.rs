//! The cart store.
//!
//! [`CartStore`] is the only way presentation code observes or changes the
//! cart. It wraps a [`CartState`], mirrors every change to a persistent
//! storage slot through the store's [`PersistQueue`], and publishes the
//! current line items on a `watch` channel for re-rendering.
//!
//! # Lifecycle
//!
//! 1. Build the store with [`CartStore::new`] (or [`CartStore::open`]).
//! 2. Call [`load`](CartStore::load) once to read the persisted cart.
//! 3. Use [`add_to_cart`](CartStore::add_to_cart),
//!    [`increment`](CartStore::increment) and
//!    [`decrement`](CartStore::decrement). Before `load` these fail with
//!    [`CartError::NotInitialized`].
//!
//! In-memory mutation is synchronous. Each mutating call then waits only for
//! its own snapshot to be written, so two calls issued back to back do not
//! serialize on I/O, yet their snapshots reach storage in issue order.

use std::sync::Arc;

use go_marketplace_core::{CartChange, CartState, CartStateError, LineItem, NewLineItem};
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use crate::codec::{self, CodecError};
use crate::error::{CartError, Result, StorageError};
use crate::storage::Storage;
use crate::writer::{PersistQueue, WriteReceipt};

/// What `load` found in storage.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The slot was never written; the cart starts empty.
    Empty,
    /// A valid cart was restored.
    Restored {
        /// Number of lines restored.
        items: usize,
    },
    /// The slot held data that is not a valid cart; the cart starts empty.
    Corrupted {
        /// Why the data was rejected.
        error: CodecError,
    },
    /// The slot could not be read; the cart starts empty.
    Unreadable {
        /// The read failure.
        error: StorageError,
    },
}

/// Whether the persisted cart matches the in-memory cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Storage holds the current cart.
    Synced {
        /// Current version.
        version: u64,
    },
    /// Storage lags behind memory, typically after a failed write.
    Dirty {
        /// Version of the in-memory cart.
        memory_version: u64,
        /// Last version written to storage.
        persisted_version: u64,
    },
}

impl SyncStatus {
    /// Whether storage holds the current cart.
    #[must_use]
    pub const fn is_synced(&self) -> bool {
        matches!(self, Self::Synced { .. })
    }
}

/// Persisted shopping cart.
///
/// This struct is cheaply cloneable via `Arc`; clones share one cart.
#[derive(Clone, Debug)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

#[derive(Debug)]
struct CartStoreInner {
    storage: Arc<dyn Storage>,
    key: String,
    state: Mutex<StoreState>,
    products: watch::Sender<Vec<LineItem>>,
}

#[derive(Debug, Default)]
struct StoreState {
    cart: CartState,
    /// Bumped by every change to `cart`.
    version: u64,
    /// Present once `load` has run.
    queue: Option<PersistQueue>,
}

impl CartStore {
    /// Create a store over `storage`, persisting to the slot named `key`.
    ///
    /// The store is empty and uninitialized until [`load`](Self::load) runs.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, key: impl Into<String>) -> Self {
        let (products, _) = watch::channel(Vec::new());
        Self {
            inner: Arc::new(CartStoreInner {
                storage,
                key: key.into(),
                state: Mutex::new(StoreState::default()),
                products,
            }),
        }
    }

    /// Create a store and load it in one step.
    ///
    /// # Errors
    ///
    /// Never fails in practice; storage problems are reported through the
    /// returned [`LoadOutcome`].
    pub async fn open(
        storage: Arc<dyn Storage>,
        key: impl Into<String>,
    ) -> Result<(Self, LoadOutcome)> {
        let store = Self::new(storage, key);
        let outcome = store.load().await?;
        Ok((store, outcome))
    }

    /// Read the persisted cart and start accepting mutations.
    ///
    /// An absent slot leaves the cart empty. A slot holding data that fails
    /// validation, or one that cannot be read, is reported in the outcome and
    /// also leaves the cart empty so the application stays usable.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AlreadyInitialized`] if called more than once.
    #[instrument(skip(self), fields(key = %self.inner.key, backend = self.inner.storage.backend()))]
    pub async fn load(&self) -> Result<LoadOutcome> {
        if self.is_initialized() {
            return Err(CartError::AlreadyInitialized);
        }

        let (cart, outcome) = match self.inner.storage.get(&self.inner.key).await {
            Ok(None) => {
                debug!("No persisted cart");
                (CartState::new(), LoadOutcome::Empty)
            }
            Ok(Some(raw)) => match codec::decode(&raw) {
                Ok(cart) => {
                    info!(items = cart.len(), "Restored persisted cart");
                    let items = cart.len();
                    (cart, LoadOutcome::Restored { items })
                }
                Err(e) => {
                    error!(error = %e, "Persisted cart is corrupt, starting empty");
                    (CartState::new(), LoadOutcome::Corrupted { error: e })
                }
            },
            Err(e) => {
                warn!(error = %e, "Could not read persisted cart, starting empty");
                (CartState::new(), LoadOutcome::Unreadable { error: e })
            }
        };

        let mut state = self.inner.state.lock();
        if state.queue.is_some() {
            return Err(CartError::AlreadyInitialized);
        }
        state.cart = cart;
        state.version = 0;
        state.queue = Some(PersistQueue::spawn(
            Arc::clone(&self.inner.storage),
            self.inner.key.clone(),
            0,
        ));
        self.inner.products.send_replace(state.cart.items().to_vec());
        drop(state);

        Ok(outcome)
    }

    /// Whether [`load`](Self::load) has completed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.inner.state.lock().queue.is_some()
    }

    /// Add a product, or increment it if it is already in the cart.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInitialized`] before `load`
    /// - [`CartError::Persist`] if the change was applied but not written
    /// - [`CartError::State`] if the line's quantity would overflow
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn add_to_cart(&self, item: NewLineItem) -> Result<CartChange> {
        self.apply(|cart| cart.add(item)).await
    }

    /// Increase a line's quantity by one. Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// Same as [`add_to_cart`](Self::add_to_cart).
    #[instrument(skip(self))]
    pub async fn increment(&self, id: &str) -> Result<CartChange> {
        self.apply(|cart| cart.increment(id)).await
    }

    /// Decrease a line's quantity by one, removing the line at zero.
    /// Unknown ids are a no-op.
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInitialized`] before `load`
    /// - [`CartError::Persist`] if the change was applied but not written
    #[instrument(skip(self))]
    pub async fn decrement(&self, id: &str) -> Result<CartChange> {
        self.apply(|cart| Ok(cart.decrement(id))).await
    }

    /// The current lines, in insertion order.
    #[must_use]
    pub fn products(&self) -> Vec<LineItem> {
        self.inner.state.lock().cart.items().to_vec()
    }

    /// The line for `id`, if it is in the cart.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<LineItem> {
        self.inner.state.lock().cart.get(id).cloned()
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.inner.state.lock().cart.total_quantity()
    }

    /// Subscribe to the current lines; the receiver sees every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<LineItem>> {
        self.inner.products.subscribe()
    }

    /// Compare the in-memory version with the last persisted version.
    #[must_use]
    pub fn sync_status(&self) -> SyncStatus {
        let state = self.inner.state.lock();
        let persisted_version = state
            .queue
            .as_ref()
            .map_or(0, PersistQueue::persisted_version);
        if persisted_version >= state.version {
            SyncStatus::Synced {
                version: state.version,
            }
        } else {
            SyncStatus::Dirty {
                memory_version: state.version,
                persisted_version,
            }
        }
    }

    /// Write the current cart if storage is behind.
    ///
    /// This is the retry path after a [`CartError::Persist`].
    ///
    /// # Errors
    ///
    /// - [`CartError::NotInitialized`] before `load`
    /// - [`CartError::Persist`] (with [`CartChange::Unchanged`]) if the write
    ///   fails again
    #[instrument(skip(self))]
    pub async fn flush(&self) -> Result<SyncStatus> {
        let pending = {
            let state = self.inner.state.lock();
            let Some(queue) = state.queue.as_ref() else {
                return Err(CartError::NotInitialized);
            };
            if queue.persisted_version() >= state.version {
                None
            } else {
                let payload = codec::encode(&state.cart)?;
                Some((state.version, queue.enqueue(state.version, payload)?))
            }
        };

        if let Some((version, receipt)) = pending {
            info!(version, "Retrying cart persistence");
            await_write(CartChange::Unchanged, version, receipt).await?;
        }
        Ok(self.sync_status())
    }

    /// Apply `op` to the cart and persist the result if anything changed.
    async fn apply<F>(&self, op: F) -> Result<CartChange>
    where
        F: FnOnce(&mut CartState) -> std::result::Result<CartChange, CartStateError>,
    {
        let (change, pending) = {
            let mut guard = self.inner.state.lock();
            let state = &mut *guard;
            let Some(queue) = state.queue.as_ref() else {
                return Err(CartError::NotInitialized);
            };

            let change = op(&mut state.cart)?;
            if !change.is_change() {
                debug!("No matching line, cart unchanged");
                return Ok(change);
            }

            state.version += 1;
            self.inner.products.send_replace(state.cart.items().to_vec());

            // Enqueue under the lock so the queue order is the mutation order.
            let payload = codec::encode(&state.cart)?;
            let receipt = queue.enqueue(state.version, payload)?;
            (change, (state.version, receipt))
        };

        let (version, receipt) = pending;
        debug!(version, ?change, "Cart changed");
        await_write(change, version, receipt).await
    }
}

async fn await_write(change: CartChange, version: u64, receipt: WriteReceipt) -> Result<CartChange> {
    match receipt.await {
        Ok(Ok(_)) => Ok(change),
        Ok(Err(source)) => Err(CartError::Persist {
            change,
            version,
            source,
        }),
        Err(_) => Err(CartError::WriterClosed),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use go_marketplace_core::{Price, ProductId};
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::DEFAULT_STORAGE_KEY;
    use crate::storage::MemoryStorage;

    /// Memory storage whose writes can be switched off.
    #[derive(Debug, Default)]
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_writes: AtomicBool,
        fail_reads: AtomicBool,
    }

    #[async_trait]
    impl Storage for FlakyStorage {
        async fn get(&self, key: &str) -> std::result::Result<Option<Vec<u8>>, StorageError> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("read refused".to_string()));
            }
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value).await
        }

        fn backend(&self) -> &'static str {
            "flaky"
        }
    }

    fn product(id: &str) -> NewLineItem {
        NewLineItem {
            id: ProductId::parse(id).unwrap(),
            title: "T".to_string(),
            image_url: "u".to_string(),
            price: Price::new(Decimal::new(999, 2)).unwrap(),
        }
    }

    async fn loaded(storage: &MemoryStorage) -> CartStore {
        let (store, _) = CartStore::open(Arc::new(storage.clone()), DEFAULT_STORAGE_KEY)
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_mutations_before_load_fail() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);

        assert!(!store.is_initialized());
        assert!(matches!(
            store.add_to_cart(product("p1")).await,
            Err(CartError::NotInitialized)
        ));
        assert!(matches!(
            store.increment("p1").await,
            Err(CartError::NotInitialized)
        ));
        assert!(matches!(
            store.decrement("p1").await,
            Err(CartError::NotInitialized)
        ));
        assert!(matches!(store.flush().await, Err(CartError::NotInitialized)));
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_load_twice_fails() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;
        assert!(matches!(
            store.load().await,
            Err(CartError::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn test_load_empty_slot() {
        let store = CartStore::new(Arc::new(MemoryStorage::new()), DEFAULT_STORAGE_KEY);
        assert!(matches!(store.load().await.unwrap(), LoadOutcome::Empty));
        assert!(store.products().is_empty());
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_load_restores_cart() {
        let storage = MemoryStorage::with_value(
            DEFAULT_STORAGE_KEY,
            r#"[{"id":"p1","title":"T","image_url":"u","price":9.99,"quantity":3}]"#,
        );
        let store = CartStore::new(Arc::new(storage), DEFAULT_STORAGE_KEY);

        assert!(matches!(
            store.load().await.unwrap(),
            LoadOutcome::Restored { items: 1 }
        ));
        assert_eq!(store.get("p1").unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_load_corrupt_starts_empty() {
        let storage = MemoryStorage::with_value(DEFAULT_STORAGE_KEY, "{not json");
        let store = CartStore::new(Arc::new(storage), DEFAULT_STORAGE_KEY);

        assert!(matches!(
            store.load().await.unwrap(),
            LoadOutcome::Corrupted {
                error: CodecError::Malformed(_)
            }
        ));
        assert!(store.products().is_empty());
        store.add_to_cart(product("p1")).await.unwrap();
    }

    #[tokio::test]
    async fn test_load_unreadable_starts_empty() {
        let storage = FlakyStorage::default();
        storage.fail_reads.store(true, Ordering::SeqCst);
        let store = CartStore::new(Arc::new(storage), DEFAULT_STORAGE_KEY);

        assert!(matches!(
            store.load().await.unwrap(),
            LoadOutcome::Unreadable { .. }
        ));
        assert!(store.products().is_empty());
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_scenario_add_increment_decrement() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;

        store.add_to_cart(product("p1")).await.unwrap();
        assert_eq!(store.products().len(), 1);
        assert_eq!(store.get("p1").unwrap().quantity, 1);

        store.increment("p1").await.unwrap();
        assert_eq!(store.get("p1").unwrap().quantity, 2);

        store.decrement("p1").await.unwrap();
        assert_eq!(store.get("p1").unwrap().quantity, 1);

        let change = store.decrement("p1").await.unwrap();
        assert!(matches!(change, CartChange::Removed { .. }));
        assert!(store.products().is_empty());

        assert_eq!(storage.peek(DEFAULT_STORAGE_KEY).as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_add_existing_matches_increment() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;

        store.add_to_cart(product("p1")).await.unwrap();
        let change = store.add_to_cart(product("p1")).await.unwrap();

        assert!(matches!(change, CartChange::Incremented { quantity: 2, .. }));
        assert_eq!(store.products().len(), 1);
        assert_eq!(store.total_quantity(), 2);
    }

    #[tokio::test]
    async fn test_unknown_id_does_not_write() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;

        assert_eq!(store.increment("ghost").await.unwrap(), CartChange::Unchanged);
        assert_eq!(store.decrement("ghost").await.unwrap(), CartChange::Unchanged);

        assert_eq!(storage.peek(DEFAULT_STORAGE_KEY), None);
        assert_eq!(store.sync_status(), SyncStatus::Synced { version: 0 });
    }

    #[tokio::test]
    async fn test_each_change_is_persisted() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;

        store.add_to_cart(product("p1")).await.unwrap();
        store.add_to_cart(product("p2")).await.unwrap();
        store.increment("p2").await.unwrap();

        let persisted = codec::decode(&storage.peek(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(persisted.items(), store.products().as_slice());
        assert_eq!(store.sync_status(), SyncStatus::Synced { version: 3 });
    }

    #[tokio::test]
    async fn test_write_failure_keeps_change_and_flush_recovers() {
        let storage = Arc::new(FlakyStorage::default());
        let (store, _) = CartStore::open(storage.clone(), DEFAULT_STORAGE_KEY)
            .await
            .unwrap();

        storage.fail_writes.store(true, Ordering::SeqCst);
        let err = store.add_to_cart(product("p1")).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::Persist {
                version: 1,
                change: CartChange::Added { .. },
                ..
            }
        ));
        assert!(err.applied_change().is_some());

        // Not rolled back.
        assert_eq!(store.get("p1").unwrap().quantity, 1);
        assert_eq!(
            store.sync_status(),
            SyncStatus::Dirty {
                memory_version: 1,
                persisted_version: 0
            }
        );

        assert!(matches!(store.flush().await, Err(CartError::Persist { .. })));

        storage.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(
            store.flush().await.unwrap(),
            SyncStatus::Synced { version: 1 }
        );
        assert!(storage.inner.peek(DEFAULT_STORAGE_KEY).unwrap().contains("p1"));
    }

    #[tokio::test]
    async fn test_flush_when_synced_writes_nothing() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;
        assert_eq!(store.flush().await.unwrap(), SyncStatus::Synced { version: 0 });
        assert_eq!(storage.peek(DEFAULT_STORAGE_KEY), None);
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;
        let mut rx = store.subscribe();

        store.add_to_cart(product("p1")).await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        store.increment("missing").await.unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_clones_share_cart() {
        let storage = MemoryStorage::new();
        let store = loaded(&storage).await;
        let other = store.clone();

        other.add_to_cart(product("p1")).await.unwrap();
        assert_eq!(store.get("p1").unwrap().quantity, 1);
    }
}
