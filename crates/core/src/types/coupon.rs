//! Coupon discount types.

use serde::{Deserialize, Serialize};

/// How a coupon's `value` is interpreted when computing a discount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponType {
    /// `value` is a percentage of the subtotal (0-100).
    Percent,
    /// `value` is a flat amount off the subtotal.
    Fixed,
}

impl CouponType {
    /// String form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }
}

impl std::fmt::Display for CouponType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CouponType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percent" => Ok(Self::Percent),
            "fixed" => Ok(Self::Fixed),
            _ => Err(format!("invalid coupon type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_type_roundtrip() {
        assert_eq!("percent".parse::<CouponType>().unwrap(), CouponType::Percent);
        assert_eq!("fixed".parse::<CouponType>().unwrap(), CouponType::Fixed);
        assert!("bogo".parse::<CouponType>().is_err());
    }
}
