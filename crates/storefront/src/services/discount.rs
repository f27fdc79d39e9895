//! Coupon discount arithmetic.
//!
//! Pure functions over a subtotal and a coupon definition; validity-window
//! and active checks happen at lookup time in `db::coupons`.

use rust_decimal::{Decimal, RoundingStrategy};

use thistle_core::CouponType;

use crate::models::coupon::Coupon;

/// Result of applying a coupon to a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscountOutcome {
    /// Amount subtracted from the subtotal. Zero when the coupon's minimum
    /// order value isn't met.
    pub discount: Decimal,
    /// `max(0, subtotal - discount)`.
    pub total: Decimal,
}

/// Apply a coupon to a subtotal.
///
/// A percent coupon takes `value`% of the subtotal, rounded half-up to a
/// whole amount; a fixed coupon takes `value` directly. If the coupon
/// carries a `min_order_value` the subtotal doesn't reach, the discount is
/// zero - the coupon is inert, not an error. The resulting total is clamped
/// at zero so an oversized fixed coupon never produces a negative order.
#[must_use]
pub fn apply_coupon(subtotal: Decimal, coupon: &Coupon) -> DiscountOutcome {
    let meets_minimum = coupon
        .min_order_value
        .is_none_or(|minimum| subtotal >= minimum);

    let discount = if !meets_minimum {
        Decimal::ZERO
    } else {
        match coupon.coupon_type {
            CouponType::Percent => (subtotal * coupon.value / Decimal::from(100))
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero),
            CouponType::Fixed => coupon.value,
        }
    };

    let total = (subtotal - discount).max(Decimal::ZERO);
    DiscountOutcome { discount, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use thistle_core::CouponId;

    fn coupon(coupon_type: CouponType, value: i64, min_order_value: Option<i64>) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "TEST".to_string(),
            coupon_type,
            value: Decimal::from(value),
            min_order_value: min_order_value.map(Decimal::from),
            active: true,
            start_at: Utc::now() - Duration::days(1),
            end_at: Utc::now() + Duration::days(1),
        }
    }

    #[test]
    fn test_percent_discount_rounds_half_up() {
        // 15% of 333 = 49.95 -> 50
        let outcome = apply_coupon(Decimal::from(333), &coupon(CouponType::Percent, 15, None));
        assert_eq!(outcome.discount, Decimal::from(50));
        assert_eq!(outcome.total, Decimal::from(283));

        // 10% of 245 = 24.5, the midpoint rounds away from zero -> 25
        let outcome = apply_coupon(Decimal::from(245), &coupon(CouponType::Percent, 10, None));
        assert_eq!(outcome.discount, Decimal::from(25));
    }

    #[test]
    fn test_fixed_discount_is_taken_verbatim() {
        let outcome = apply_coupon(Decimal::from(250), &coupon(CouponType::Fixed, 30, None));
        assert_eq!(outcome.discount, Decimal::from(30));
        assert_eq!(outcome.total, Decimal::from(220));
    }

    #[test]
    fn test_unmet_minimum_yields_zero_discount() {
        let outcome = apply_coupon(Decimal::from(250), &coupon(CouponType::Fixed, 30, Some(300)));
        assert_eq!(outcome.discount, Decimal::ZERO);
        assert_eq!(outcome.total, Decimal::from(250));
    }

    #[test]
    fn test_minimum_met_exactly_applies() {
        let outcome = apply_coupon(Decimal::from(300), &coupon(CouponType::Fixed, 30, Some(300)));
        assert_eq!(outcome.discount, Decimal::from(30));
    }

    #[test]
    fn test_oversized_fixed_discount_clamps_total_at_zero() {
        let outcome = apply_coupon(Decimal::from(20), &coupon(CouponType::Fixed, 50, None));
        assert_eq!(outcome.discount, Decimal::from(50));
        assert_eq!(outcome.total, Decimal::ZERO);
    }

    #[test]
    fn test_hundred_percent_discount_zeroes_the_total() {
        let outcome = apply_coupon(Decimal::from(777), &coupon(CouponType::Percent, 100, None));
        assert_eq!(outcome.discount, Decimal::from(777));
        assert_eq!(outcome.total, Decimal::ZERO);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal_for_percent() {
        for subtotal in [1_i64, 99, 100, 12_345] {
            for pct in [1_i64, 33, 50, 99, 100] {
                let outcome = apply_coupon(
                    Decimal::from(subtotal),
                    &coupon(CouponType::Percent, pct, None),
                );
                assert!(outcome.total >= Decimal::ZERO);
                assert_eq!(outcome.total, (Decimal::from(subtotal) - outcome.discount).max(Decimal::ZERO));
            }
        }
    }
}
