//! Coupon model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use thistle_core::{CouponId, CouponType};

/// A discount coupon. Read-only to the checkout core.
///
/// Validity (the `active` flag and the `[start_at, end_at]` window) is
/// checked at lookup time by the repository; the discount calculator trusts
/// whatever coupon it is handed.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub coupon_type: CouponType,
    pub value: Decimal,
    pub min_order_value: Option<Decimal>,
    pub active: bool,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}
