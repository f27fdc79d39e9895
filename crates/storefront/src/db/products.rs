//! Price/stock lookup and explicit inventory adjustments.

use rust_decimal::Decimal;
use sqlx::PgPool;

use thistle_core::{ProductId, VariantId};

use super::RepositoryError;
use crate::models::product::{PriceQuote, StockTarget};

/// Repository for catalog price and stock operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Read the current price and stock for a product or one of its
    /// variants.
    ///
    /// The returned price is the variant's own price when the variant sets
    /// one, else the product's sale price, else its list price; it is what
    /// gets snapshotted into `price_at` on add-to-cart. The stock counter
    /// is the variant's when a variant is asked for, else the product's.
    /// Returns `None` for an unknown product, or a variant that doesn't
    /// belong to the product (a soft not-found; the caller reports it
    /// without detail).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn price_for(
        &self,
        product_id: ProductId,
        variant_id: Option<VariantId>,
    ) -> Result<Option<PriceQuote>, RepositoryError> {
        let row: Option<(Decimal, i32)> = if let Some(variant_id) = variant_id {
            sqlx::query_as(
                r"
                SELECT COALESCE(v.price, p.sale_price, p.price), v.stock
                FROM variants v
                JOIN products p ON p.id = v.product_id
                WHERE v.id = $1 AND v.product_id = $2
                ",
            )
            .bind(variant_id.as_i32())
            .bind(product_id.as_i32())
            .fetch_optional(self.pool)
            .await?
        } else {
            sqlx::query_as(
                r"
                SELECT COALESCE(sale_price, price), stock_quantity
                FROM products
                WHERE id = $1
                ",
            )
            .bind(product_id.as_i32())
            .fetch_optional(self.pool)
            .await?
        };

        Ok(row.map(|(price, stock_quantity)| PriceQuote {
            product_id,
            price,
            stock_quantity,
        }))
    }

    /// Apply an explicit stock adjustment (restock, return, cancellation
    /// reversal) and record it in the `inventory_movements` audit trail.
    ///
    /// Runs as one transaction so the counter and the movement row never
    /// diverge. Order creation decrements do not go through here; the order
    /// transaction engine owns those.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the target row doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn adjust_stock(
        &self,
        target: StockTarget,
        change: i32,
        reason: &str,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let affected = match target {
            StockTarget::Variant(variant_id) => {
                sqlx::query(
                    "INSERT INTO inventory_movements (variant_id, change, reason) VALUES ($1, $2, $3)",
                )
                .bind(variant_id.as_i32())
                .bind(change)
                .bind(reason)
                .execute(&mut *tx)
                .await?;

                sqlx::query("UPDATE variants SET stock = stock + $1 WHERE id = $2")
                    .bind(change)
                    .bind(variant_id.as_i32())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
            StockTarget::Product(product_id) => {
                sqlx::query(
                    "INSERT INTO inventory_movements (product_id, change, reason) VALUES ($1, $2, $3)",
                )
                .bind(product_id.as_i32())
                .bind(change)
                .bind(reason)
                .execute(&mut *tx)
                .await?;

                sqlx::query("UPDATE products SET stock_quantity = stock_quantity + $1 WHERE id = $2")
                    .bind(change)
                    .bind(product_id.as_i32())
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
            }
        };

        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        tracing::info!(%target, change, reason, "stock adjusted");
        Ok(())
    }
}
