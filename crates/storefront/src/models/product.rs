//! Price/stock lookup models.

use rust_decimal::Decimal;
use serde::Serialize;

use thistle_core::{ProductId, VariantId};

/// Current price and stock for a product at the moment of a cart mutation.
///
/// `price` is the sale price when one is set, else the list price. This is
/// the value snapshotted into `price_at` on add-to-cart.
#[derive(Debug, Clone, Serialize)]
pub struct PriceQuote {
    pub product_id: ProductId,
    pub price: Decimal,
    pub stock_quantity: i32,
}

/// Which stock counter an inventory adjustment targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockTarget {
    Variant(VariantId),
    Product(ProductId),
}

impl std::fmt::Display for StockTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Variant(id) => write!(f, "variant {id}"),
            Self::Product(id) => write!(f, "product {id}"),
        }
    }
}
