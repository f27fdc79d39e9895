//! Integration tests for Thistle.
//!
//! Tests in `tests/` exercise the repositories against a real `PostgreSQL`
//! database and are marked `#[ignore]`; run them with a database up:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/thistle_test \
//!     cargo test -p thistle-integration-tests -- --ignored
//! ```
//!
//! The migrations must have been applied first
//! (`cargo run -p thistle-cli -- migrate`).

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use thistle_core::{CartId, ProductId, UserId, VariantId};

/// Connect to the test database from `DATABASE_URL` (or
/// `THISTLE_DATABASE_URL`).
pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .or_else(|_| std::env::var("THISTLE_DATABASE_URL"))
        .expect("DATABASE_URL must be set for integration tests");
    PgPool::connect(&url).await.expect("failed to connect to test database")
}

/// Insert a user with a unique email.
pub async fn seed_user(pool: &PgPool) -> UserId {
    let email = format!("{}@test.thistle.shop", Uuid::new_v4());
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (email, full_name, phone) VALUES ($1, 'Test Shopper', '0123') RETURNING id",
    )
    .bind(email)
    .fetch_one(pool)
    .await
    .expect("failed to seed user");
    UserId::new(id)
}

/// Insert a product with the given list price and stock counter.
pub async fn seed_product(pool: &PgPool, price: i64, stock: i32) -> ProductId {
    let slug = format!("test-product-{}", Uuid::new_v4());
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO products (name, slug, price, stock_quantity) VALUES ('Test Product', $1, $2, $3) RETURNING id",
    )
    .bind(slug)
    .bind(Decimal::from(price))
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("failed to seed product");
    ProductId::new(id)
}

/// Insert a variant under a product with its own stock counter.
pub async fn seed_variant(pool: &PgPool, product_id: ProductId, stock: i32) -> VariantId {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO variants (product_id, variant_name, stock) VALUES ($1, 'Test Variant', $2) RETURNING id",
    )
    .bind(product_id.as_i32())
    .bind(stock)
    .fetch_one(pool)
    .await
    .expect("failed to seed variant");
    VariantId::new(id)
}

/// Insert a session-keyed cart.
pub async fn seed_cart(pool: &PgPool) -> CartId {
    let (id,): (i32,) =
        sqlx::query_as("INSERT INTO carts (session_id) VALUES ($1) RETURNING id")
            .bind(Uuid::new_v4())
            .fetch_one(pool)
            .await
            .expect("failed to seed cart");
    CartId::new(id)
}

/// Insert a cart line item with a price snapshot.
pub async fn seed_cart_item(
    pool: &PgPool,
    cart_id: CartId,
    product_id: ProductId,
    variant_id: Option<VariantId>,
    price_at: i64,
    quantity: i32,
) {
    sqlx::query(
        "INSERT INTO cart_items (cart_id, product_id, variant_id, price_at, quantity) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(cart_id.as_i32())
    .bind(product_id.as_i32())
    .bind(variant_id.map(|v| v.as_i32()))
    .bind(Decimal::from(price_at))
    .bind(quantity)
    .execute(pool)
    .await
    .expect("failed to seed cart item");
}

/// Read a product's stock counter.
pub async fn product_stock(pool: &PgPool, product_id: ProductId) -> i32 {
    let (stock,): (i32,) =
        sqlx::query_as("SELECT stock_quantity FROM products WHERE id = $1")
            .bind(product_id.as_i32())
            .fetch_one(pool)
            .await
            .expect("failed to read product stock");
    stock
}

/// Read a variant's stock counter.
pub async fn variant_stock(pool: &PgPool, variant_id: VariantId) -> i32 {
    let (stock,): (i32,) = sqlx::query_as("SELECT stock FROM variants WHERE id = $1")
        .bind(variant_id.as_i32())
        .fetch_one(pool)
        .await
        .expect("failed to read variant stock");
    stock
}

/// Count the cart's remaining line items.
pub async fn cart_item_count(pool: &PgPool, cart_id: CartId) -> i64 {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE cart_id = $1")
            .bind(cart_id.as_i32())
            .fetch_one(pool)
            .await
            .expect("failed to count cart items");
    count
}
