//! Core types for Thistle.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod coupon;
pub mod id;
pub mod shipping;
pub mod status;

pub use coupon::CouponType;
pub use id::*;
pub use shipping::ShippingMethod;
pub use status::{OrderStatus, PaymentStatus};
