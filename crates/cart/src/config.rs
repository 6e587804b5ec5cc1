//! Cart store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_BACKEND` - `file` (default), `memory`, or `postgres`
//! - `CART_STORAGE_DIR` - Directory for the file backend (default: .go-marketplace)
//! - `CART_STORAGE_KEY` - Slot key holding the cart (default: @GoMarketplace:products)
//!
//! ## Required for `postgres`
//! - `CART_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Slot key used by the original mobile client.
pub const DEFAULT_STORAGE_KEY: &str = "@GoMarketplace:products";

/// Storage directory used when `CART_STORAGE_DIR` is unset.
pub const DEFAULT_STORAGE_DIR: &str = ".go-marketplace";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone)]
pub struct CartConfig {
    /// Where the cart is persisted.
    pub storage: StorageConfig,
    /// Slot key holding the serialized cart.
    pub storage_key: String,
}

/// Storage backend selection.
///
/// Implements `Debug` manually to redact the database URL.
#[derive(Clone)]
pub enum StorageConfig {
    /// Process-local map; nothing survives a restart.
    Memory,
    /// One file per key under `dir`.
    File {
        /// Storage directory.
        dir: PathBuf,
    },
    /// `cart_storage` table in `PostgreSQL`.
    Postgres {
        /// Connection string (contains password).
        database_url: SecretString,
    },
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Memory => f.write_str("Memory"),
            Self::File { dir } => f.debug_struct("File").field("dir", dir).finish(),
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
        }
    }
}

impl Default for CartConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::File {
                dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            },
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl CartConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or a variable required
    /// by the selected backend is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = get_or_default(&lookup, "CART_STORAGE_BACKEND", "file");
        let storage = match backend.trim().to_ascii_lowercase().as_str() {
            "memory" => StorageConfig::Memory,
            "file" => StorageConfig::File {
                dir: PathBuf::from(get_or_default(&lookup, "CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            },
            "postgres" => StorageConfig::Postgres {
                database_url: get_database_url(&lookup, "CART_DATABASE_URL")?,
            },
            other => {
                return Err(ConfigError::InvalidEnvVar(
                    "CART_STORAGE_BACKEND".to_string(),
                    format!("unknown backend '{other}' (expected file, memory or postgres)"),
                ));
            }
        };

        let storage_key = get_or_default(&lookup, "CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        Ok(Self {
            storage,
            storage_key,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url<F>(lookup: &F, primary_key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(primary_key)
        .or_else(|| lookup("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}
