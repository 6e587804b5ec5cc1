use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::Storage;
use crate::error::StorageError;

/// In-memory slot store.
///
/// Clones share the same slots, so a test can hand one clone to a store and
/// inspect or re-open the data through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with one slot already written.
    #[must_use]
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.slots.lock().insert(key.into(), value.into());
        storage
    }

    /// Read a slot without going through the async interface.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.slots.lock().get(key).cloned()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.peek(key).map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.slots.lock().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
