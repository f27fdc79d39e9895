//! Shipping fee estimation.
//!
//! A static rate table; no carrier integration. Fees scale with the cart's
//! billable weight, which is the total weight rounded up to whole kilograms.

use rust_decimal::Decimal;

use thistle_core::ShippingMethod;

/// Weight assumed for a cart until per-product weights exist.
pub const DEFAULT_CART_WEIGHT_KG: f64 = 0.5;

/// One row of the rate table.
#[derive(Debug, Clone, Copy)]
struct Rate {
    base: i64,
    per_kg: i64,
    eta_days: (u8, u8),
}

const fn rate_for(method: ShippingMethod) -> Rate {
    match method {
        ShippingMethod::Economy => Rate {
            base: 15_000,
            per_kg: 5_000,
            eta_days: (3, 6),
        },
        ShippingMethod::Standard => Rate {
            base: 25_000,
            per_kg: 7_000,
            eta_days: (2, 4),
        },
        ShippingMethod::Express => Rate {
            base: 40_000,
            per_kg: 9_000,
            eta_days: (1, 2),
        },
    }
}

/// A computed shipping quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingQuote {
    pub method: ShippingMethod,
    pub fee: Decimal,
    /// Human-facing delivery window, e.g. `"2-4 days"`.
    pub eta: String,
}

/// Estimate the shipping fee for a cart weight.
///
/// `fee = base + ceil(weight_kg) * per_kg`; weight never bills below one
/// kilogram. Negative or NaN weights are treated as zero weight.
#[must_use]
pub fn estimate(method: ShippingMethod, weight_kg: f64) -> ShippingQuote {
    let rate = rate_for(method);

    let billable_kg = if weight_kg.is_finite() && weight_kg > 0.0 {
        #[allow(clippy::cast_possible_truncation)]
        {
            weight_kg.ceil() as i64
        }
    } else {
        0
    };

    let fee = Decimal::from(rate.base) + Decimal::from(billable_kg) * Decimal::from(rate.per_kg);
    let (lo, hi) = rate.eta_days;

    ShippingQuote {
        method,
        fee,
        eta: format!("{lo}-{hi} days"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weight_bills_one_kilogram() {
        let quote = estimate(ShippingMethod::Standard, DEFAULT_CART_WEIGHT_KG);
        assert_eq!(quote.fee, Decimal::from(32_000)); // 25000 + 1 * 7000
        assert_eq!(quote.eta, "2-4 days");
    }

    #[test]
    fn test_fractional_weight_rounds_up() {
        let quote = estimate(ShippingMethod::Express, 1.2);
        assert_eq!(quote.fee, Decimal::from(58_000)); // 40000 + 2 * 9000
        assert_eq!(quote.eta, "1-2 days");
    }

    #[test]
    fn test_economy_rate() {
        let quote = estimate(ShippingMethod::Economy, 3.0);
        assert_eq!(quote.fee, Decimal::from(30_000)); // 15000 + 3 * 5000
        assert_eq!(quote.eta, "3-6 days");
    }

    #[test]
    fn test_zero_weight_bills_base_only() {
        let quote = estimate(ShippingMethod::Standard, 0.0);
        assert_eq!(quote.fee, Decimal::from(25_000));
    }

    #[test]
    fn test_fee_is_monotone_in_weight() {
        let mut last = Decimal::ZERO;
        for tenths in 0..100 {
            let quote = estimate(ShippingMethod::Economy, f64::from(tenths) / 10.0);
            assert!(quote.fee >= last);
            last = quote.fee;
        }
    }

    #[test]
    fn test_unknown_method_string_prices_as_standard() {
        let parsed = ShippingMethod::parse_or_standard("overnight-drone");
        let quote = estimate(parsed, 1.0);
        assert_eq!(quote.fee, estimate(ShippingMethod::Standard, 1.0).fee);
    }
}
