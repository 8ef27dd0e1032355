//! Database operations for the Farmstand `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Site authentication and profile addresses
//! - `sessions` - Tower-sessions storage
//! - `products` - Catalog (price, stock, display order, parcel dimensions)
//! - `shipping_details` - Recipient records, one per checkout
//! - `orders` - Order headers (status, tracking, shipping method/cost)
//! - `order_lines` - Per-product lines with unit-price snapshots
//!
//! Queries use the runtime `sqlx` API with internal `FromRow` row types that
//! convert into the domain models.

pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

use farmstand_core::ProductId;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A guarded stock decrement matched no row: the product is missing or
    /// holds less stock than the ordered quantity.
    #[error("insufficient stock for product {0}")]
    InsufficientStock(ProductId),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
