//! Order repository: the cart-to-order transaction engine and the status
//! lifecycle.
//!
//! [`OrderRepository::create`] is the only code path allowed to decrement
//! stock and create order rows, and it does both inside one transaction.
//! [`OrderRepository::update_status`] drives the admin transition surface,
//! enforcing the status machine and reversing stock on cancellation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use thiserror::Error;

use thistle_core::{
    CartId, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ShippingMethod, UserId,
    VariantId,
};

use super::RepositoryError;
use crate::models::order::{
    CreateOrder, CustomerSummary, Order, OrderDetails, OrderItem, OrderItemDetail,
};

/// Human-facing order number prefix.
const ORDER_NUMBER_PREFIX: &str = "TS";

/// Errors from order operations, beyond plain repository failures.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A conditional stock decrement matched no row: the product or variant
    /// has less stock than requested (or does not exist). The whole
    /// transaction is rolled back.
    #[error("insufficient stock for product {product_id} (variant {variant_id:?}): requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        variant_id: Option<VariantId>,
        requested: i32,
    },

    /// The requested status change is not a legal transition.
    #[error("invalid order status transition: {from} -> {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
}

impl From<sqlx::Error> for OrderError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

/// Generate an order number: a short prefix plus the low-order eight digits
/// of the millisecond timestamp. Collisions are accepted as negligible at
/// this design's throughput; the unique index is the backstop.
fn generate_order_number(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().rem_euclid(100_000_000);
    format!("{ORDER_NUMBER_PREFIX}{millis:08}")
}

/// Internal row type for order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    order_number: String,
    user_id: Option<i32>,
    cart_id: i32,
    status: String,
    payment_method: String,
    payment_status: String,
    shipping_method: String,
    shipping_fee: Decimal,
    subtotal: Decimal,
    discount_total: Decimal,
    grand_total: Decimal,
    shipping_address: Json<crate::models::order::AddressSnapshot>,
    billing_address: Json<crate::models::order::AddressSnapshot>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;
        let payment_status: PaymentStatus = row.payment_status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid payment status in database: {e}"))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            order_number: row.order_number,
            user_id: row.user_id.map(UserId::new),
            cart_id: CartId::new(row.cart_id),
            status,
            payment_method: row.payment_method,
            payment_status,
            shipping_method: ShippingMethod::parse_or_standard(&row.shipping_method),
            shipping_fee: row.shipping_fee,
            subtotal: row.subtotal,
            discount_total: row.discount_total,
            grand_total: row.grand_total,
            shipping_address: row.shipping_address.0,
            billing_address: row.billing_address.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order item queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    variant_id: Option<i32>,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            id: OrderItemId::new(row.id),
            order_id: OrderId::new(row.order_id),
            product_id: ProductId::new(row.product_id),
            variant_id: row.variant_id.map(VariantId::new),
            quantity: row.quantity,
            unit_price: row.unit_price,
            total_price: row.total_price,
        }
    }
}

/// Internal row type for order item detail queries (joined with catalog).
#[derive(Debug, sqlx::FromRow)]
struct OrderItemDetailRow {
    id: i32,
    order_id: i32,
    product_id: i32,
    variant_id: Option<i32>,
    quantity: i32,
    unit_price: Decimal,
    total_price: Decimal,
    product_name: Option<String>,
    product_slug: Option<String>,
}

impl From<OrderItemDetailRow> for OrderItemDetail {
    fn from(row: OrderItemDetailRow) -> Self {
        Self {
            item: OrderItem {
                id: OrderItemId::new(row.id),
                order_id: OrderId::new(row.order_id),
                product_id: ProductId::new(row.product_id),
                variant_id: row.variant_id.map(VariantId::new),
                quantity: row.quantity,
                unit_price: row.unit_price,
                total_price: row.total_price,
            },
            product_name: row.product_name,
            product_slug: row.product_slug,
        }
    }
}

const SELECT_ORDER: &str = r"
    SELECT id, order_number, user_id, cart_id, status, payment_method,
           payment_status, shipping_method, shipping_fee, subtotal,
           discount_total, grand_total, shipping_address, billing_address,
           created_at, updated_at
    FROM orders
";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Atomically persist an order, its line items, and the matching stock
    /// decrements, then consume the source cart's items.
    ///
    /// All statements run inside one transaction; on any failure nothing is
    /// observable - no partial order, no partial stock decrement. Stock is
    /// decremented conditionally (`WHERE stock >= quantity`), by variant if
    /// the item has one, else by product - exactly one of the two per item.
    ///
    /// Items are expected pre-validated (non-empty, quantities >= 1, prices
    /// resolved); see `services::checkout`. The engine does not re-price.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InsufficientStock` if any decrement matches no
    /// row. Returns `RepositoryError::Conflict` (wrapped) on an order-number
    /// collision, `RepositoryError::Database` for other failures. In every
    /// error case the transaction has been rolled back.
    pub async fn create(&self, input: &CreateOrder) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let order_number = generate_order_number(Utc::now());
        let subtotal = input.subtotal();
        let grand_total = input.grand_total();

        let row: OrderRow = sqlx::query_as(
            r"
            INSERT INTO orders (order_number, user_id, cart_id, status, payment_method,
                                payment_status, shipping_method, shipping_fee, subtotal,
                                discount_total, grand_total, shipping_address, billing_address)
            VALUES ($1, $2, $3, 'new', $4, 'unpaid', $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, order_number, user_id, cart_id, status, payment_method,
                      payment_status, shipping_method, shipping_fee, subtotal,
                      discount_total, grand_total, shipping_address, billing_address,
                      created_at, updated_at
            ",
        )
        .bind(&order_number)
        .bind(input.user_id.map(|u| u.as_i32()))
        .bind(input.cart_id.as_i32())
        .bind(&input.payment.method)
        .bind(input.shipping.method.as_str())
        .bind(input.shipping.fee)
        .bind(subtotal)
        .bind(input.payment.discount)
        .bind(grand_total)
        .bind(Json(&input.shipping.address))
        .bind(Json(&input.shipping.address))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return OrderError::Repository(RepositoryError::Conflict(
                    "order number collision".to_owned(),
                ));
            }
            e.into()
        })?;

        for item in &input.items {
            let total_price = item.price_at * Decimal::from(item.quantity);

            sqlx::query(
                r"
                INSERT INTO order_items (order_id, product_id, variant_id, quantity,
                                         unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(row.id)
            .bind(item.product_id.as_i32())
            .bind(item.variant_id.map(|v| v.as_i32()))
            .bind(item.quantity)
            .bind(item.price_at)
            .bind(total_price)
            .execute(&mut *tx)
            .await?;

            // Exactly one decrement path per item: variant stock when the
            // item has a variant, product stock_quantity otherwise.
            let affected = if let Some(variant_id) = item.variant_id {
                sqlx::query(
                    "UPDATE variants SET stock = stock - $1 WHERE id = $2 AND stock >= $1",
                )
                .bind(item.quantity)
                .bind(variant_id.as_i32())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            } else {
                sqlx::query(
                    r"
                    UPDATE products SET stock_quantity = stock_quantity - $1
                    WHERE id = $2 AND stock_quantity >= $1
                    ",
                )
                .bind(item.quantity)
                .bind(item.product_id.as_i32())
                .execute(&mut *tx)
                .await?
                .rows_affected()
            };

            if affected == 0 {
                // Dropping the transaction rolls everything back.
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id,
                    variant_id: item.variant_id,
                    requested: item.quantity,
                });
            }
        }

        // The cart's items are consumed by the order; its life ends here.
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(input.cart_id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_number, %grand_total, "order created");
        Ok(row.try_into().map_err(OrderError::Repository)?)
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            "{SELECT_ORDER} WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Find an order by its human-facing number, optionally scoped to a
    /// user. A mismatched user sees `None`, not someone else's order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_number(
        &self,
        order_number: &str,
        user_id: Option<UserId>,
    ) -> Result<Option<Order>, RepositoryError> {
        let row: Option<OrderRow> = if let Some(user_id) = user_id {
            sqlx::query_as(&format!(
                "{SELECT_ORDER} WHERE order_number = $1 AND user_id = $2"
            ))
            .bind(order_number)
            .bind(user_id.as_i32())
            .fetch_optional(self.pool)
            .await?
        } else {
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE order_number = $1"))
                .bind(order_number)
                .fetch_optional(self.pool)
                .await?
        };

        row.map(TryInto::try_into).transpose()
    }

    /// Load an order with its line items and customer contact fields for
    /// detail views (admin order screen, account order page).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_details(
        &self,
        order_id: OrderId,
    ) -> Result<Option<OrderDetails>, RepositoryError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = $1"))
            .bind(order_id.as_i32())
            .fetch_optional(self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let order: Order = row.try_into()?;

        let customer: Option<CustomerSummary> = match order.user_id {
            Some(user_id) => sqlx::query_as::<_, (Option<String>, Option<String>, Option<String>)>(
                "SELECT full_name, email, phone FROM users WHERE id = $1",
            )
            .bind(user_id.as_i32())
            .fetch_optional(self.pool)
            .await?
            .map(|(full_name, email, phone)| CustomerSummary {
                full_name,
                email,
                phone,
            }),
            None => None,
        };

        let items: Vec<OrderItemDetailRow> = sqlx::query_as(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, oi.variant_id,
                   oi.quantity, oi.unit_price, oi.total_price,
                   p.name AS product_name, p.slug AS product_slug
            FROM order_items oi
            LEFT JOIN products p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id ASC
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetails {
            order,
            items: items.into_iter().map(Into::into).collect(),
            customer,
        }))
    }

    /// Apply an administrator-initiated status transition.
    ///
    /// The current status is read under a row lock, the transition is
    /// checked against the status machine, and the write happens in the
    /// same transaction. A transition to `cancelled` reverses every line
    /// item's stock decrement (with an `inventory_movements` audit row)
    /// before committing, so an order is never cancelled without its stock
    /// coming back.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::InvalidTransition` for an illegal move, with
    /// nothing written. Returns `RepositoryError::NotFound` (wrapped) if the
    /// order doesn't exist.
    pub async fn update_status(
        &self,
        order_id: OrderId,
        new_status: OrderStatus,
    ) -> Result<Order, OrderError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<OrderRow> =
            sqlx::query_as(&format!("{SELECT_ORDER} WHERE id = $1 FOR UPDATE"))
                .bind(order_id.as_i32())
                .fetch_optional(&mut *tx)
                .await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        let current: OrderStatus = row.status.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order status in database: {e}"))
        })?;

        if !current.can_transition_to(new_status) {
            return Err(OrderError::InvalidTransition {
                from: current,
                to: new_status,
            });
        }

        let (updated_at,): (DateTime<Utc>,) = sqlx::query_as(
            "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING updated_at",
        )
        .bind(new_status.as_str())
        .bind(order_id.as_i32())
        .fetch_one(&mut *tx)
        .await?;

        if new_status == OrderStatus::Cancelled {
            Self::restock_items(&mut tx, order_id).await?;
        }

        tx.commit().await?;

        tracing::info!(order_id = %order_id, from = %current, to = %new_status, "order status updated");

        let mut order: Order = row.try_into().map_err(OrderError::Repository)?;
        order.status = new_status;
        order.updated_at = updated_at;
        Ok(order)
    }

    /// Reverse the stock decrement of every item on an order, inside the
    /// caller's transaction.
    async fn restock_items(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        order_id: OrderId,
    ) -> Result<(), OrderError> {
        let items: Vec<OrderItemRow> = sqlx::query_as(
            r"
            SELECT id, order_id, product_id, variant_id, quantity, unit_price, total_price
            FROM order_items
            WHERE order_id = $1
            ",
        )
        .bind(order_id.as_i32())
        .fetch_all(&mut **tx)
        .await?;

        for item in items {
            if let Some(variant_id) = item.variant_id {
                sqlx::query("UPDATE variants SET stock = stock + $1 WHERE id = $2")
                    .bind(item.quantity)
                    .bind(variant_id)
                    .execute(&mut **tx)
                    .await?;

                sqlx::query(
                    "INSERT INTO inventory_movements (variant_id, change, reason) VALUES ($1, $2, 'cancellation')",
                )
                .bind(variant_id)
                .bind(item.quantity)
                .execute(&mut **tx)
                .await?;
            } else {
                sqlx::query(
                    "UPDATE products SET stock_quantity = stock_quantity + $1 WHERE id = $2",
                )
                .bind(item.quantity)
                .bind(item.product_id)
                .execute(&mut **tx)
                .await?;

                sqlx::query(
                    "INSERT INTO inventory_movements (product_id, change, reason) VALUES ($1, $2, 'cancellation')",
                )
                .bind(item.product_id)
                .bind(item.quantity)
                .execute(&mut **tx)
                .await?;
            }
        }

        Ok(())
    }

    /// Record the payment status reported by the payment collaborator.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    pub async fn set_payment_status(
        &self,
        order_id: OrderId,
        payment_status: PaymentStatus,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE orders SET payment_status = $1, updated_at = NOW() WHERE id = $2")
                .bind(payment_status.as_str())
                .bind(order_id.as_i32())
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap();
        let number = generate_order_number(now);
        assert!(number.starts_with("TS"));
        assert_eq!(number.len(), 10);
        assert!(number.get(2..).is_some_and(|d| d.chars().all(|c| c.is_ascii_digit())));
    }

    #[test]
    fn test_order_number_keeps_low_order_digits() {
        let now = Utc.timestamp_millis_opt(1_756_100_000_042).unwrap();
        // 1756100000042 % 1e8 = 00000042, zero-padded to eight digits.
        assert_eq!(generate_order_number(now), "TS00000042");
    }
}
