//! Payment initiation stub.
//!
//! A real gateway would return a hosted checkout URL here. Until one is
//! wired in, every order is sent straight to the thank-you page and stays
//! `unpaid`; reconciliation happens out of band.

use crate::models::order::Order;

/// Where to send the shopper after order creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    pub url: String,
}

/// Initiate payment for a freshly created order.
#[must_use]
pub fn initiate(order: &Order) -> PaymentRedirect {
    PaymentRedirect {
        url: format!("/thank-you?order={}", order.order_number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::order::AddressSnapshot;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use thistle_core::{CartId, OrderId, OrderStatus, PaymentStatus, ShippingMethod};

    #[test]
    fn test_redirect_targets_thank_you_page() {
        let snapshot = AddressSnapshot {
            full_name: "A. Shopper".to_string(),
            phone: "0123".to_string(),
            address_line1: "1 Main St".to_string(),
            city: None,
            district: None,
            province: None,
        };
        let order = Order {
            id: OrderId::new(1),
            order_number: "TS00000042".to_string(),
            user_id: None,
            cart_id: CartId::new(1),
            status: OrderStatus::New,
            payment_method: "cod".to_string(),
            payment_status: PaymentStatus::Unpaid,
            shipping_method: ShippingMethod::Standard,
            shipping_fee: Decimal::from(25_000),
            subtotal: Decimal::from(100_000),
            discount_total: Decimal::ZERO,
            grand_total: Decimal::from(125_000),
            shipping_address: snapshot.clone(),
            billing_address: snapshot,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert_eq!(initiate(&order).url, "/thank-you?order=TS00000042");
    }
}
