//! Shipping method selection.

use serde::{Deserialize, Serialize};

/// Supported shipping methods.
///
/// Parsing is lenient: an unrecognized method falls back to [`Standard`],
/// so a stale or tampered form value degrades to the default rate rather
/// than failing checkout.
///
/// [`Standard`]: ShippingMethod::Standard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    Economy,
    #[default]
    Standard,
    Express,
}

impl ShippingMethod {
    /// String form stored in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Standard => "standard",
            Self::Express => "express",
        }
    }

    /// Parse a method name, falling back to `Standard` for unknown values.
    #[must_use]
    pub fn parse_or_standard(s: &str) -> Self {
        match s {
            "economy" => Self::Economy,
            "express" => Self::Express,
            _ => Self::Standard,
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
