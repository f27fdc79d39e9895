//! Cart and checkout route handlers.
//!
//! The cart is keyed by the session: the authenticated `user_id` when
//! present, else a lazily created anonymous cart token. Handlers return
//! JSON; rendering is a separate frontend's concern.

use axum::{Json, extract::Query, extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use thistle_core::{CartItemId, ProductId, ShippingMethod, UserId, VariantId};

use crate::db::{CartRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::cart::{self, Cart, CartIdentity, CartItem};
use crate::models::session_keys;
use crate::services::checkout::{self, CheckoutRequest};
use crate::state::AppState;

/// Resolve the cart identity for this session.
///
/// A signed-in user's id wins; otherwise the anonymous cart token is used,
/// created and stored on first need. No merging happens at sign-in - the
/// anonymous cart is simply left behind.
async fn cart_identity(session: &Session) -> Result<CartIdentity> {
    if let Some(user_id) = session.get::<i32>(session_keys::USER_ID).await? {
        return Ok(CartIdentity::User(UserId::new(user_id)));
    }

    if let Some(token) = session.get::<Uuid>(session_keys::CART_SESSION).await? {
        return Ok(CartIdentity::Session(token));
    }

    let token = Uuid::new_v4();
    session.insert(session_keys::CART_SESSION, token).await?;
    Ok(CartIdentity::Session(token))
}

/// Resolve the session's cart and its items.
async fn resolve_cart(state: &AppState, session: &Session) -> Result<(Cart, Vec<CartItem>)> {
    let identity = cart_identity(session).await?;
    let repo = CartRepository::new(state.pool());
    let cart = repo.get_or_create(identity).await?;
    let items = repo.items(cart.id).await?;
    Ok((cart, items))
}

/// Cart contents response.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub cart_id: thistle_core::CartId,
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
}

/// GET /cart - the session's cart with items and subtotal.
pub async fn show(State(state): State<AppState>, session: Session) -> Result<Json<CartResponse>> {
    let (cart, items) = resolve_cart(&state, &session).await?;
    let subtotal = cart::subtotal(&items);
    Ok(Json(CartResponse {
        cart_id: cart.id,
        items,
        subtotal,
    }))
}

/// Add-to-cart payload.
#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

const fn default_quantity() -> i32 {
    1
}

/// POST /cart/add - add a line item, snapshotting the current price.
///
/// Quantity is clamped to a minimum of 1. Adding the same product twice
/// produces two lines.
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<AddItemRequest>,
) -> Result<impl IntoResponse> {
    let identity = cart_identity(&session).await?;
    let cart = CartRepository::new(state.pool())
        .get_or_create(identity)
        .await?;

    let quote = ProductRepository::new(state.pool())
        .price_for(payload.product_id, payload.variant_id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;

    let quantity = payload.quantity.max(1);
    let item_id = CartRepository::new(state.pool())
        .add_item(
            cart.id,
            payload.product_id,
            payload.variant_id,
            quote.price,
            quantity,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({ "item_id": item_id }))))
}

/// Quantity update payload.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub item_id: CartItemId,
    pub quantity: i32,
}

/// POST /cart/update - set a line item's quantity (clamped to >= 1).
///
/// The item must belong to the session's cart; anything else is not-found.
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<CartResponse>> {
    let (cart, items) = resolve_cart(&state, &session).await?;
    if !items.iter().any(|item| item.id == payload.item_id) {
        return Err(AppError::NotFound("cart item".to_string()));
    }

    let repo = CartRepository::new(state.pool());
    repo.update_quantity(payload.item_id, payload.quantity.max(1))
        .await?;

    let items = repo.items(cart.id).await?;
    let subtotal = cart::subtotal(&items);
    Ok(Json(CartResponse {
        cart_id: cart.id,
        items,
        subtotal,
    }))
}

/// Item removal payload.
#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub item_id: CartItemId,
}

/// POST /cart/remove - delete a line item from the session's cart.
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<RemoveItemRequest>,
) -> Result<Json<CartResponse>> {
    let (cart, items) = resolve_cart(&state, &session).await?;
    if !items.iter().any(|item| item.id == payload.item_id) {
        return Err(AppError::NotFound("cart item".to_string()));
    }

    let repo = CartRepository::new(state.pool());
    repo.remove_item(payload.item_id).await?;

    let items = repo.items(cart.id).await?;
    let subtotal = cart::subtotal(&items);
    Ok(Json(CartResponse {
        cart_id: cart.id,
        items,
        subtotal,
    }))
}

/// Quote query parameters.
#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    #[serde(default)]
    pub shipping_method: String,
    pub coupon_code: Option<String>,
}

/// GET /checkout/quote - price the cart without committing anything.
pub async fn checkout_quote(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<QuoteParams>,
) -> Result<impl IntoResponse> {
    let (cart, _) = resolve_cart(&state, &session).await?;

    let method = ShippingMethod::parse_or_standard(&params.shipping_method);
    let quote = checkout::quote(
        state.pool(),
        cart.id,
        method,
        params.coupon_code.as_deref(),
    )
    .await?;

    Ok(Json(serde_json::json!({
        "subtotal": quote.subtotal,
        "discount": quote.discount,
        "shipping_fee": quote.shipping_fee,
        "shipping_eta": quote.shipping_eta,
        "grand_total": quote.grand_total,
    })))
}

/// POST /checkout - turn the session's cart into an order.
#[tracing::instrument(skip(state, session, payload))]
pub async fn checkout(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let identity = cart_identity(&session).await?;
    let cart = CartRepository::new(state.pool())
        .get_or_create(identity)
        .await?;

    let user_id = match identity {
        CartIdentity::User(user_id) => Some(user_id),
        CartIdentity::Session(_) => None,
    };

    let outcome = checkout::place_order(state.pool(), user_id, cart.id, &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "ok": true,
            "order_number": outcome.order.order_number,
            "grand_total": outcome.order.grand_total,
            "redirect_url": outcome.redirect.url,
        })),
    ))
}
