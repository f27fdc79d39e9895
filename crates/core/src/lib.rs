//! Thistle Core - Shared types library.
//!
//! This crate provides common types used across all Thistle components:
//! - `storefront` - Public-facing e-commerce site and admin order surface
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs plus the order, payment, coupon, and shipping enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
