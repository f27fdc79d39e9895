//! Order models: the durable record of a completed checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use thistle_core::{
    CartId, OrderId, OrderItemId, OrderStatus, PaymentStatus, ProductId, ShippingMethod, UserId,
    VariantId,
};

use super::cart::CartItem;

/// Structured address captured at checkout time.
///
/// Stored as JSONB on the order and immutable afterwards, independent of the
/// user's address book.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressSnapshot {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
}

/// An order, created exactly once per checkout.
///
/// Mutated only through status and payment-status updates; never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub user_id: Option<UserId>,
    pub cart_id: CartId,
    pub status: OrderStatus,
    pub payment_method: String,
    pub payment_status: PaymentStatus,
    pub shipping_method: ShippingMethod,
    pub shipping_fee: Decimal,
    pub subtotal: Decimal,
    pub discount_total: Decimal,
    pub grand_total: Decimal,
    pub shipping_address: AddressSnapshot,
    pub billing_address: AddressSnapshot,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line item snapshot on an order. Immutable after creation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// An order item joined with catalog display fields for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: Option<String>,
    pub product_slug: Option<String>,
}

/// Customer contact fields joined onto an order detail view.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// An order with its line items and (when known) the customer.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub customer: Option<CustomerSummary>,
}

/// Shipping selection passed into order creation.
#[derive(Debug, Clone)]
pub struct ShippingSelection {
    pub method: ShippingMethod,
    pub fee: Decimal,
    pub address: AddressSnapshot,
}

/// Payment selection passed into order creation.
///
/// `discount` is the already-computed coupon discount; the engine does not
/// re-derive it.
#[derive(Debug, Clone)]
pub struct PaymentSelection {
    pub method: String,
    pub discount: Decimal,
}

/// One item to be written onto an order. `price_at` and `quantity` are
/// already resolved; the engine does not re-price.
#[derive(Debug, Clone)]
pub struct CheckoutItem {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    pub price_at: Decimal,
    pub quantity: i32,
}

impl From<&CartItem> for CheckoutItem {
    fn from(item: &CartItem) -> Self {
        Self {
            product_id: item.product_id,
            variant_id: item.variant_id,
            price_at: item.price_at,
            quantity: item.quantity,
        }
    }
}

/// Input to the order transaction engine.
#[derive(Debug, Clone)]
pub struct CreateOrder {
    pub user_id: Option<UserId>,
    pub cart_id: CartId,
    pub shipping: ShippingSelection,
    pub payment: PaymentSelection,
    pub items: Vec<CheckoutItem>,
}

impl CreateOrder {
    /// Sum of `price_at * quantity` over the items.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items
            .iter()
            .map(|it| it.price_at * Decimal::from(it.quantity))
            .sum()
    }

    /// `subtotal + shipping_fee - discount_total`.
    #[must_use]
    pub fn grand_total(&self) -> Decimal {
        self.subtotal() + self.shipping.fee - self.payment.discount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkout_item(price: i64, qty: i32) -> CheckoutItem {
        CheckoutItem {
            product_id: ProductId::new(1),
            variant_id: None,
            price_at: Decimal::from(price),
            quantity: qty,
        }
    }

    fn create_order(items: Vec<CheckoutItem>, fee: i64, discount: i64) -> CreateOrder {
        CreateOrder {
            user_id: None,
            cart_id: CartId::new(1),
            shipping: ShippingSelection {
                method: ShippingMethod::Standard,
                fee: Decimal::from(fee),
                address: AddressSnapshot {
                    full_name: "A. Shopper".to_string(),
                    phone: "0123".to_string(),
                    address_line1: "1 Main St".to_string(),
                    city: None,
                    district: None,
                    province: None,
                },
            },
            payment: PaymentSelection {
                method: "cod".to_string(),
                discount: Decimal::from(discount),
            },
            items,
        }
    }

    #[test]
    fn test_totals_with_applied_coupon() {
        // [{100 x 2}, {50 x 1}], fee 25, discount 30 -> 250 / 245
        let order = create_order(vec![checkout_item(100, 2), checkout_item(50, 1)], 25, 30);
        assert_eq!(order.subtotal(), Decimal::from(250));
        assert_eq!(order.grand_total(), Decimal::from(245));
    }

    #[test]
    fn test_totals_with_inert_coupon() {
        // Same cart, discount forced to 0 -> grand total 275
        let order = create_order(vec![checkout_item(100, 2), checkout_item(50, 1)], 25, 0);
        assert_eq!(order.subtotal(), Decimal::from(250));
        assert_eq!(order.grand_total(), Decimal::from(275));
    }

    #[test]
    fn test_address_snapshot_roundtrips_through_json() {
        let snapshot = AddressSnapshot {
            full_name: "A. Shopper".to_string(),
            phone: "0123".to_string(),
            address_line1: "1 Main St".to_string(),
            city: Some("Hanoi".to_string()),
            district: None,
            province: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        let back: AddressSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.full_name, snapshot.full_name);
        assert_eq!(back.city, snapshot.city);
        assert_eq!(back.district, None);
    }
}
