//! Cart repository: cart identity resolution and line-item mutations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use thistle_core::{CartId, CartItemId, ProductId, UserId, VariantId};

use super::RepositoryError;
use crate::models::cart::{Cart, CartIdentity, CartItem};

/// Internal row type for cart queries.
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i32,
    user_id: Option<i32>,
    session_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: CartId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            session_id: row.session_id,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for cart item queries (joined with catalog names).
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    cart_id: i32,
    product_id: i32,
    variant_id: Option<i32>,
    product_name: String,
    product_slug: String,
    variant_name: Option<String>,
    price_at: Decimal,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            cart_id: CartId::new(row.cart_id),
            product_id: ProductId::new(row.product_id),
            variant_id: row.variant_id.map(VariantId::new),
            product_name: row.product_name,
            product_slug: row.product_slug,
            variant_name: row.variant_name,
            price_at: row.price_at,
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the most recently created cart for an identity, creating one
    /// if none exists.
    ///
    /// This is read-or-insert without a uniqueness constraint: two concurrent
    /// first requests for the same identity may each create a cart. The
    /// result is two empty carts, not a correctness violation, so the race
    /// is accepted rather than locked away.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_or_create(&self, identity: CartIdentity) -> Result<Cart, RepositoryError> {
        let existing: Option<CartRow> = match identity {
            CartIdentity::User(user_id) => {
                sqlx::query_as(
                    r"
                    SELECT id, user_id, session_id, created_at
                    FROM carts
                    WHERE user_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                    ",
                )
                .bind(user_id.as_i32())
                .fetch_optional(self.pool)
                .await?
            }
            CartIdentity::Session(session_id) => {
                sqlx::query_as(
                    r"
                    SELECT id, user_id, session_id, created_at
                    FROM carts
                    WHERE session_id = $1
                    ORDER BY created_at DESC
                    LIMIT 1
                    ",
                )
                .bind(session_id)
                .fetch_optional(self.pool)
                .await?
            }
        };

        if let Some(row) = existing {
            return Ok(row.into());
        }

        let row: CartRow = match identity {
            CartIdentity::User(user_id) => {
                sqlx::query_as(
                    r"
                    INSERT INTO carts (user_id)
                    VALUES ($1)
                    RETURNING id, user_id, session_id, created_at
                    ",
                )
                .bind(user_id.as_i32())
                .fetch_one(self.pool)
                .await?
            }
            CartIdentity::Session(session_id) => {
                sqlx::query_as(
                    r"
                    INSERT INTO carts (session_id)
                    VALUES ($1)
                    RETURNING id, user_id, session_id, created_at
                    ",
                )
                .bind(session_id)
                .fetch_one(self.pool)
                .await?
            }
        };

        tracing::debug!(cart_id = row.id, "created cart");
        Ok(row.into())
    }

    /// Get a cart's line items, newest first, joined with product and
    /// variant display names.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<CartItemRow> = sqlx::query_as(
            r"
            SELECT ci.id, ci.cart_id, ci.product_id, ci.variant_id,
                   p.name AS product_name, p.slug AS product_slug,
                   v.variant_name,
                   ci.price_at, ci.quantity, ci.created_at
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN variants v ON v.id = ci.variant_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at DESC
            ",
        )
        .bind(cart_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Insert a new line item with the given price snapshot.
    ///
    /// Always inserts a fresh row: adding the same product+variant twice
    /// produces two lines. Identical lines are deliberately not merged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        variant_id: Option<VariantId>,
        price_at: Decimal,
        quantity: i32,
    ) -> Result<CartItemId, RepositoryError> {
        let (id,): (i32,) = sqlx::query_as(
            r"
            INSERT INTO cart_items (cart_id, product_id, variant_id, price_at, quantity)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            ",
        )
        .bind(cart_id.as_i32())
        .bind(product_id.as_i32())
        .bind(variant_id.map(|v| v.as_i32()))
        .bind(price_at)
        .bind(quantity)
        .fetch_one(self.pool)
        .await?;

        Ok(CartItemId::new(id))
    }

    /// Set a line item's quantity.
    ///
    /// No validation here; callers clamp to a minimum of 1 before calling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_quantity(
        &self,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2")
            .bind(quantity)
            .bind(item_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }

    /// Delete a line item by id.
    ///
    /// Unconditional: ownership scoping (which cart the item belongs to) is
    /// the router's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(&self, item_id: CartItemId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
