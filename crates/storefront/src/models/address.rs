//! Address-book models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use thistle_core::{AddressId, UserId};

/// A saved address. At most one per user carries `is_default = true`.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub label: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an address.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAddress {
    pub label: Option<String>,
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Partial update for an address: every field optional and typed, so the
/// set of updatable columns is fixed at compile time. `None` leaves the
/// stored value unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressUpdate {
    pub label: Option<String>,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub ward: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
}
