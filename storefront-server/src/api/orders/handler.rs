//! Order API Handlers
//!
//! Checkout and order history for the authenticated user. The heavy lifting
//! lives in [`crate::orders::ReconciliationEngine`]; handlers only scope
//! access and shape responses.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Order, OrderDetail};
use crate::db::repository::order;
use crate::gateway::OrderCosts;
use crate::orders::CheckoutRequest;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub order: OrderDetail,
    pub costs: OrderCosts,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmPaymentRequest {
    pub order_id: i64,
}

/// POST /api/checkout - create a provider draft order from the cart
pub async fn checkout(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CheckoutRequest>,
) -> AppResult<(StatusCode, Json<CheckoutResponse>)> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let outcome = state.engine.checkout(&user, &req).await?;
    let order = order::with_items(&state.pool, outcome.order).await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            order,
            costs: outcome.costs,
        }),
    ))
}

/// POST /api/confirm-payment - mark an order paid and submit it for
/// production. The webhook receiver is the normal caller in production;
/// this endpoint covers manual and out-of-band confirmations.
pub async fn confirm_payment(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<ConfirmPaymentRequest>,
) -> AppResult<Json<Order>> {
    // Owner or admin only; checked before any state change
    let existing = order::find_by_id(&state.pool, req.order_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", req.order_id)))?;
    if existing.user_id != user.id && !user.is_admin {
        return Err(AppError::not_found(format!("Order {} not found", req.order_id)));
    }

    let order = state.engine.confirm_payment(req.order_id).await?;
    Ok(Json(order))
}

/// GET /api/orders - the user's order history, newest first
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = order::list_for_user(&state.pool, user.id).await?;
    Ok(Json(orders))
}

/// GET /api/orders/:id - one order with its item snapshots (owner-scoped)
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let found = order::find_for_user(&state.pool, id, user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    let detail = order::with_items(&state.pool, found).await?;
    Ok(Json(detail))
}
