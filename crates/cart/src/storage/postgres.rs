//! `PostgreSQL` storage for server-side deployments of the cart store.
//!
//! # Table: `cart_storage`
//!
//! One row per slot key. Migrations live in `crates/cart/migrations/` and run
//! via:
//! ```bash
//! cargo run -p go-marketplace-cli --features postgres -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use super::Storage;
use crate::error::StorageError;

/// Table-backed slot store.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Wrap an existing connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a connection pool with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Database`] if the connection cannot be
    /// established.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .min_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url.expose_secret())
            .await?;
        Ok(Self::new(pool))
    }

    /// Run the cart storage migrations.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Migration`] if a migration fails.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        info!("Running cart storage migrations...");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("Cart storage migrations complete");
        Ok(())
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let value = sqlx::query_scalar::<_, String>(
            r"
            SELECT value FROM cart_storage
            WHERE key = $1
            ",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO cart_storage (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
            ",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
