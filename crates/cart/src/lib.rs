//! GoMarketplace Cart - persisted shopping-cart store.
//!
//! Holds the products a shopper has picked, with quantities, and mirrors the
//! whole list to a key-value storage slot after every change.
//!
//! # Architecture
//!
//! - [`store`] - [`CartStore`], the only way to observe or change the cart
//! - [`writer`] - Single-writer queue applying snapshots in issue order
//! - [`codec`] - JSON snapshot format and validation of persisted data
//! - [`storage`] - [`Storage`] trait with memory, file and `PostgreSQL` backends
//! - [`config`] - Environment-driven configuration
//! - [`error`] - Error types
//!
//! # Example
//!
//! ```no_run
//! use go_marketplace_cart::{CartConfig, CartStore, storage};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = CartConfig::from_env()?;
//! let backend = storage::connect(&config.storage).await?;
//! let (store, _outcome) = CartStore::open(backend, config.storage_key).await?;
//!
//! store.increment("p1").await?;
//! for line in store.products() {
//!     println!("{} x{}", line.title, line.quantity);
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod codec;
pub mod config;
pub mod error;
pub mod storage;
pub mod store;
pub mod writer;

pub use config::{CartConfig, ConfigError, StorageConfig};
pub use error::{CartError, Result, StorageError};
pub use storage::Storage;
pub use store::{CartStore, LoadOutcome, SyncStatus};

pub use go_marketplace_core::{CartChange, CartState, LineItem, NewLineItem, Price, ProductId};
