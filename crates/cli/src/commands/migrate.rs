//! Storage migration command.
//!
//! # Usage
//!
//! ```bash
//! CART_STORAGE_BACKEND=postgres gm-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `CART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! # Migration Files
//!
//! Cart storage migrations: `crates/cart/migrations/`

use go_marketplace_cart::storage::PgStorage;
use go_marketplace_cart::{CartConfig, StorageConfig};

use super::CommandError;

/// Run cart storage migrations against the configured database.
///
/// # Errors
///
/// Returns an error if the backend is not `postgres`, the database cannot be
/// reached, or a migration fails.
pub async fn run() -> Result<(), CommandError> {
    let config = CartConfig::from_env()?;
    let StorageConfig::Postgres { database_url } = config.storage else {
        return Err(CommandError::Unsupported(
            "migrate requires CART_STORAGE_BACKEND=postgres",
        ));
    };

    tracing::info!("Connecting to cart database...");
    let storage = PgStorage::connect(&database_url).await?;
    storage.migrate().await?;
    Ok(())
}
