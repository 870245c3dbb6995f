//! Product API Handlers
//!
//! Reads serve the local catalog mirror only; no provider call is on the
//! request path. `sync` refreshes the mirror from the provider.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::core::ServerState;
use crate::db::models::ProductWithVariants;
use crate::db::repository::catalog;
use crate::services::SyncReport;
use crate::utils::{AppError, AppResult};

/// GET /api/products - list the mirrored catalog
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<ProductWithVariants>>> {
    let products = catalog::find_all(&state.pool).await?;
    Ok(Json(products))
}

/// GET /api/products/:id - one product with its variants
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductWithVariants>> {
    let product = catalog::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {} not found", id)))?;
    Ok(Json(product))
}

/// POST /api/products/sync - refresh the mirror from the provider (admin)
pub async fn sync(State(state): State<ServerState>) -> AppResult<Json<SyncReport>> {
    let report = state.catalog_sync.sync_catalog().await?;
    Ok(Json(report))
}
