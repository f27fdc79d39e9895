//! Cart and cart line-item models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use thistle_core::{CartId, CartItemId, ProductId, UserId, VariantId};

/// Who a cart belongs to.
///
/// A cart row is keyed by exactly one of these. When a signed-in user also
/// carries an anonymous session token, the user identity wins; the session
/// cart is left behind, not merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartIdentity {
    User(UserId),
    Session(Uuid),
}

/// A shopper's cart.
///
/// Created lazily on first add-to-cart and never explicitly deleted; its
/// items are consumed when an order is created from it.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub session_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A line item in a cart.
///
/// `price_at` is the price captured when the item was added. Later catalog
/// price changes never touch it.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub product_slug: String,
    pub variant_name: Option<String>,
    pub price_at: Decimal,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// The line total at the snapshot price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price_at * Decimal::from(self.quantity)
    }
}

/// Sum of `price_at * quantity` over a set of cart items.
#[must_use]
pub fn subtotal(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}
