//! Account route handlers: order history and the address book.
//!
//! Every handler requires the `user_id` session key the upstream auth layer
//! writes; without it the response is 401.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tower_sessions::Session;

use thistle_core::{AddressId, UserId};

use crate::db::{AddressRepository, OrderRepository};
use crate::error::{AppError, Result};
use crate::models::address::{Address, AddressUpdate, NewAddress};
use crate::models::order::{Order, OrderDetails};
use crate::models::session_keys;
use crate::state::AppState;

/// Read the authenticated user from the session or refuse.
async fn require_user(session: &Session) -> Result<UserId> {
    session
        .get::<i32>(session_keys::USER_ID)
        .await?
        .map(UserId::new)
        .ok_or_else(|| AppError::Unauthorized("login required".to_string()))
}

/// GET /account/orders - the user's order history, newest first.
pub async fn orders(State(state): State<AppState>, session: Session) -> Result<Json<Vec<Order>>> {
    let user_id = require_user(&session).await?;
    let orders = OrderRepository::new(state.pool())
        .list_by_user(user_id)
        .await?;
    Ok(Json(orders))
}

/// GET /account/orders/{number} - one order by its human-facing number.
///
/// Scoped to the session user; another user's order number is a 404.
pub async fn order_detail(
    State(state): State<AppState>,
    session: Session,
    Path(number): Path<String>,
) -> Result<Json<OrderDetails>> {
    let user_id = require_user(&session).await?;
    let repo = OrderRepository::new(state.pool());

    let order = repo
        .find_by_number(&number, Some(user_id))
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    let details = repo
        .find_details(order.id)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    Ok(Json(details))
}

/// GET /account/addresses - the user's address book, default first.
pub async fn addresses(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<Address>>> {
    let user_id = require_user(&session).await?;
    let addresses = AddressRepository::new(state.pool())
        .list_by_user(user_id)
        .await?;
    Ok(Json(addresses))
}

/// POST /account/addresses - create an address.
///
/// `is_default: true` routes through the same clear-then-set transaction as
/// the explicit default endpoint.
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NewAddress>,
) -> Result<impl IntoResponse> {
    let user_id = require_user(&session).await?;
    let address = AddressRepository::new(state.pool())
        .create(user_id, &payload)
        .await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// POST /account/addresses/{id} - partial update; absent fields keep their
/// stored values.
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<AddressUpdate>,
) -> Result<Json<Address>> {
    let user_id = require_user(&session).await?;
    let address = AddressRepository::new(state.pool())
        .update(AddressId::new(id), user_id, &payload)
        .await?;
    Ok(Json(address))
}

/// DELETE /account/addresses/{id}.
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let user_id = require_user(&session).await?;
    let deleted = AddressRepository::new(state.pool())
        .delete(AddressId::new(id), user_id)
        .await?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound("address".to_string()))
    }
}

/// POST /account/addresses/{id}/default - make this the user's only
/// default address.
pub async fn set_default_address(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let user_id = require_user(&session).await?;
    AddressRepository::new(state.pool())
        .set_default(AddressId::new(id), user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
