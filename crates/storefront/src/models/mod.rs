//! Domain models for the storefront.

pub mod address;
pub mod cart;
pub mod coupon;
pub mod order;
pub mod product;
pub mod session;

pub use session::session_keys;
