//! Database operations for the storefront `PostgreSQL`.
//!
//! ## Tables
//!
//! - `carts` / `cart_items` - Pre-purchase line items with price snapshots
//! - `orders` / `order_items` - Durable checkout records
//! - `products` / `variants` - Catalog rows (prices and stock counters)
//! - `coupons` - Discount definitions (read-only here)
//! - `addresses` - User address book with the single-default invariant
//! - `inventory_movements` - Audit trail for explicit stock adjustments
//! - `sessions` - Tower-sessions storage
//!
//! Queries use the runtime-checked `sqlx::query`/`query_as` API with
//! `FromRow` row structs, so the workspace builds without a live database.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p thistle-cli -- migrate
//! ```

pub mod addresses;
pub mod carts;
pub mod coupons;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use addresses::AddressRepository;
pub use carts::CartRepository;
pub use coupons::CouponRepository;
pub use orders::{OrderError, OrderRepository};
pub use products::ProductRepository;

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

    /// Constraint violation (e.g., duplicate order number).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// Each transactional operation checks out one connection for the lifetime
/// of its transaction and returns it on completion or error; the pool is the
/// only shared mutable resource in this service.
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
