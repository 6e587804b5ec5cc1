//! Integration tests for the GoMarketplace cart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p go-marketplace-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_lifecycle` - Load, mutate and reload through real backends
//! - `cart_failures` - Storage failures during load and writes
//! - `cart_ordering` - Concurrent operations and write ordering
//!
//! This crate also provides the shared fixtures those tests use.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use go_marketplace_cart::storage::MemoryStorage;
use go_marketplace_cart::{Storage, StorageError};
use go_marketplace_core::{NewLineItem, Price, ProductId};
use parking_lot::Mutex;
use rust_decimal::Decimal;

/// Build a product offer with a fixed price of 9.99.
///
/// # Panics
///
/// Panics if `id` is empty.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn product(id: &str) -> NewLineItem {
    NewLineItem {
        id: ProductId::parse(id).unwrap(),
        title: format!("Product {id}"),
        image_url: format!("https://cdn.example.com/{id}.png"),
        price: Price::new(Decimal::new(999, 2)).unwrap(),
    }
}

/// Memory-backed storage with switchable failures and a write log.
#[derive(Debug, Default)]
pub struct TestStorage {
    slots: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    write_delay_ms: AtomicU64,
    writes: Mutex<Vec<String>>,
}

impl TestStorage {
    /// Create a storage whose slot `key` already holds `value`.
    #[must_use]
    pub fn with_value(key: &str, value: &str) -> Self {
        Self {
            slots: MemoryStorage::with_value(key, value),
            ..Self::default()
        }
    }

    /// Make every read fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Sleep this long inside every write.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Every value successfully written, oldest first.
    #[must_use]
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }

    /// Current value of a slot.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.slots.peek(key)
    }
}

#[async_trait]
impl Storage for TestStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("read refused".to_string()));
        }
        self.slots.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let delay = self.write_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("disk full".to_string()));
        }
        self.slots.set(key, value).await?;
        self.writes.lock().push(value.to_owned());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "test"
    }
}
