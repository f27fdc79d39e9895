//! Checkout orchestration: cart to order.
//!
//! Gathers and validates everything the order transaction engine needs -
//! cart items, coupon outcome, shipping quote - then hands the engine one
//! immutable [`CreateOrder`] and initiates payment on the result.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use thistle_core::{CartId, ShippingMethod, UserId};

use crate::db::{CartRepository, CouponRepository, OrderError, OrderRepository, RepositoryError};
use crate::models::cart;
use crate::models::order::{
    AddressSnapshot, CheckoutItem, CreateOrder, Order, PaymentSelection, ShippingSelection,
};
use crate::services::discount::apply_coupon;
use crate::services::payment::{self, PaymentRedirect};
use crate::services::shipping::{self, DEFAULT_CART_WEIGHT_KG};

/// Checkout form payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: AddressSnapshot,
    /// Lenient: unknown methods price as standard.
    #[serde(default)]
    pub shipping_method: String,
    pub payment_method: String,
    pub coupon_code: Option<String>,
}

/// Errors surfaced by checkout orchestration.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart has no items; there is nothing to order.
    #[error("cart is empty")]
    EmptyCart,

    /// A cart line carries a non-positive quantity.
    #[error("invalid quantity on cart line")]
    InvalidQuantity,

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A completed checkout: the durable order plus where to send the shopper.
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub redirect: PaymentRedirect,
}

/// Quoted totals for a cart before the shopper commits.
#[derive(Debug, Clone)]
pub struct CheckoutQuote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_fee: Decimal,
    pub shipping_eta: String,
    pub grand_total: Decimal,
}

/// Price a cart without creating anything: subtotal, coupon outcome, and
/// shipping quote. The same arithmetic checkout itself uses, so the quote a
/// shopper sees is the total they are charged.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty cart, or a wrapped
/// repository error.
pub async fn quote(
    pool: &PgPool,
    cart_id: CartId,
    shipping_method: ShippingMethod,
    coupon_code: Option<&str>,
) -> Result<CheckoutQuote, CheckoutError> {
    let items = CartRepository::new(pool).items(cart_id).await?;
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let subtotal = cart::subtotal(&items);
    let discount = resolve_discount(pool, subtotal, coupon_code).await?;
    let shipping = shipping::estimate(shipping_method, DEFAULT_CART_WEIGHT_KG);

    Ok(CheckoutQuote {
        subtotal,
        discount,
        grand_total: subtotal - discount + shipping.fee,
        shipping_fee: shipping.fee,
        shipping_eta: shipping.eta,
    })
}

/// Turn a cart into an order.
///
/// Validates the cart (non-empty, positive quantities), resolves the coupon
/// and shipping fee, then calls the order transaction engine. Stock checks
/// are NOT done here; the engine's conditional decrements are the only
/// authority, so a shelf that empties between this call and the commit
/// still fails cleanly.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` or `CheckoutError::InvalidQuantity`
/// for bad input, `OrderError::InsufficientStock` (wrapped) when stock ran
/// out, or a wrapped repository error.
pub async fn place_order(
    pool: &PgPool,
    user_id: Option<UserId>,
    cart_id: CartId,
    request: &CheckoutRequest,
) -> Result<CheckoutOutcome, CheckoutError> {
    let items = CartRepository::new(pool).items(cart_id).await?;
    if items.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if items.iter().any(|item| item.quantity < 1) {
        return Err(CheckoutError::InvalidQuantity);
    }

    let subtotal = cart::subtotal(&items);
    let discount = resolve_discount(pool, subtotal, request.coupon_code.as_deref()).await?;

    let method = ShippingMethod::parse_or_standard(&request.shipping_method);
    let shipping_quote = shipping::estimate(method, DEFAULT_CART_WEIGHT_KG);

    let input = CreateOrder {
        user_id,
        cart_id,
        shipping: ShippingSelection {
            method,
            fee: shipping_quote.fee,
            address: request.shipping_address.clone(),
        },
        payment: PaymentSelection {
            method: request.payment_method.clone(),
            discount,
        },
        items: items.iter().map(CheckoutItem::from).collect(),
    };

    let order = OrderRepository::new(pool).create(&input).await?;
    let redirect = payment::initiate(&order);

    tracing::info!(order_number = %order.order_number, "checkout completed");
    Ok(CheckoutOutcome { order, redirect })
}

/// Look up a coupon code and compute its effective discount against the
/// subtotal. Unknown, inactive, or expired codes contribute zero. The
/// discount is capped at the subtotal (via the calculator's zero-clamped
/// total), so downstream totals can never go negative.
async fn resolve_discount(
    pool: &PgPool,
    subtotal: Decimal,
    coupon_code: Option<&str>,
) -> Result<Decimal, RepositoryError> {
    let Some(code) = coupon_code.filter(|c| !c.trim().is_empty()) else {
        return Ok(Decimal::ZERO);
    };

    let coupon = CouponRepository::new(pool)
        .find_active_by_code(code.trim())
        .await?;

    Ok(coupon
        .map(|c| subtotal - apply_coupon(subtotal, &c).total)
        .unwrap_or(Decimal::ZERO))
}
