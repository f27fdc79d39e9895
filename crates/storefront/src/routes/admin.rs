//! Admin order route handlers.
//!
//! Admin authentication and authorization live in the upstream gateway;
//! these handlers assume the caller is already vetted and deal only with
//! order state.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use axum::http::StatusCode;

use thistle_core::{OrderId, OrderStatus, PaymentStatus, ProductId, VariantId};

use crate::db::{OrderRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::order::{Order, OrderDetails};
use crate::models::product::StockTarget;
use crate::state::AppState;

/// Order detail plus the transitions an operator may apply from here.
#[derive(Debug, Serialize)]
pub struct AdminOrderResponse {
    #[serde(flatten)]
    pub details: OrderDetails,
    pub allowed_transitions: Vec<OrderStatus>,
}

/// GET /admin/orders/{id} - full order detail with the legal next statuses.
pub async fn order_detail(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<AdminOrderResponse>> {
    let details = OrderRepository::new(state.pool())
        .find_details(OrderId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    let current = details.order.status;
    let allowed_transitions = OrderStatus::ALL
        .into_iter()
        .filter(|&to| current.can_transition_to(to))
        .collect();

    Ok(Json(AdminOrderResponse {
        details,
        allowed_transitions,
    }))
}

/// Status transition payload.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /admin/orders/{id}/status - apply a status transition.
///
/// An unknown status name is a 400; a known one that the status machine
/// refuses from the current state is a 422. Cancellation restocks the
/// order's items as part of the same transaction.
#[tracing::instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let new_status: OrderStatus = payload
        .status
        .parse()
        .map_err(|_| AppError::BadRequest(format!("unknown order status: {}", payload.status)))?;

    let order = OrderRepository::new(state.pool())
        .update_status(OrderId::new(id), new_status)
        .await?;

    Ok(Json(order))
}

/// Payment status payload.
#[derive(Debug, Deserialize)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}

/// POST /admin/orders/{id}/payment - record the payment status reported by
/// the payment collaborator. This core never verifies settlement itself.
pub async fn update_payment_status(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdatePaymentStatusRequest>,
) -> Result<StatusCode> {
    let payment_status: PaymentStatus = payload.payment_status.parse().map_err(|_| {
        AppError::BadRequest(format!(
            "unknown payment status: {}",
            payload.payment_status
        ))
    })?;

    OrderRepository::new(state.pool())
        .set_payment_status(OrderId::new(id), payment_status)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Stock adjustment payload. Exactly one of `variant_id`/`product_id`.
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub change: i32,
    pub reason: String,
}

/// POST /admin/stock/adjust - apply an explicit stock adjustment (restock,
/// return) with an audit trail entry.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<StatusCode> {
    let target = match (payload.variant_id, payload.product_id) {
        (Some(variant_id), None) => StockTarget::Variant(variant_id),
        (None, Some(product_id)) => StockTarget::Product(product_id),
        _ => {
            return Err(AppError::BadRequest(
                "exactly one of variant_id or product_id is required".to_string(),
            ));
        }
    };

    ProductRepository::new(state.pool())
        .adjust_stock(target, payload.change, &payload.reason)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
