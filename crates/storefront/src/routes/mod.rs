//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Cart
//! GET    /cart                      - Cart contents and subtotal
//! POST   /cart/add                  - Add a line item (price snapshotted)
//! POST   /cart/update               - Set a line item's quantity
//! POST   /cart/remove               - Remove a line item
//!
//! # Checkout
//! GET  /checkout/quote              - Price the cart (shipping + coupon)
//! POST /checkout                    - Place the order
//!
//! # Account (requires session user)
//! GET    /account/orders            - Order history
//! GET    /account/orders/{number}   - Order detail by number
//! GET    /account/addresses         - Address book
//! POST   /account/addresses         - Create address
//! POST   /account/addresses/{id}    - Partial update
//! DELETE /account/addresses/{id}    - Delete address
//! POST   /account/addresses/{id}/default - Make default
//!
//! # Admin (auth handled upstream)
//! GET  /admin/orders/{id}           - Order detail with legal transitions
//! POST /admin/orders/{id}/status    - Apply a status transition
//! POST /admin/orders/{id}/payment   - Record externally reported payment
//! POST /admin/stock/adjust          - Explicit stock adjustment (audited)
//! ```

pub mod account;
pub mod admin;
pub mod cart;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    use axum::routing::delete;

    Router::new()
        .route("/orders", get(account::orders))
        .route("/orders/{number}", get(account::order_detail))
        .route(
            "/addresses",
            get(account::addresses).post(account::create_address),
        )
        .route(
            "/addresses/{id}",
            post(account::update_address).delete(account::delete_address),
        )
        .route("/addresses/{id}/default", post(account::set_default_address))
}

/// Create the admin order routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}", get(admin::order_detail))
        .route("/orders/{id}/status", post(admin::update_status))
        .route("/orders/{id}/payment", post(admin::update_payment_status))
        .route("/stock/adjust", post(admin::adjust_stock))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .route("/checkout/quote", get(cart::checkout_quote))
        .nest("/account", account_routes())
        .nest("/admin", admin_routes())
}
