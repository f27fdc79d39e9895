//! Session key constants.
//!
//! The auth collaborator writes `USER_ID` after verifying a login; this core
//! only reads it. `CART_SESSION` is the anonymous token that keys a cart for
//! shoppers who are not signed in.

/// Keys used to store data in the tower-sessions session.
pub mod session_keys {
    /// Authenticated user id, set by the external auth layer.
    pub const USER_ID: &str = "user_id";
    /// Anonymous cart session token (UUID), created lazily on first cart use.
    pub const CART_SESSION: &str = "cart_sid";
}
