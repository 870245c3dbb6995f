//! Admin Order API Handlers
//!
//! Cross-user order views plus the on-demand fulfillment-status sync.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use crate::core::ServerState;
use crate::db::models::{Order, OrderDetail};
use crate::db::repository::order;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct SyncStatusResponse {
    pub order: Order,
    /// Raw status string reported by the provider
    pub provider_status: String,
}

/// GET /api/admin/orders - all orders, newest first
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Order>>> {
    let orders = order::list_all(&state.pool).await?;
    Ok(Json(orders))
}

/// GET /api/admin/orders/:id - any order with its item snapshots
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrderDetail>> {
    let found = order::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", id)))?;
    let detail = order::with_items(&state.pool, found).await?;
    Ok(Json(detail))
}

/// POST /api/admin/orders/:id/status - refresh the fulfillment status from
/// the provider
pub async fn sync_status(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<SyncStatusResponse>> {
    let outcome = state.engine.sync_fulfillment_status(id).await?;
    Ok(Json(SyncStatusResponse {
        order: outcome.order,
        provider_status: outcome.provider_status,
    }))
}
