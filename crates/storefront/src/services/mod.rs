//! Business logic above the repositories: pricing arithmetic, shipping
//! quotes, and checkout orchestration.

pub mod checkout;
pub mod discount;
pub mod payment;
pub mod shipping;
