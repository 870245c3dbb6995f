//! Cart API Handlers
//!
//! All operations are scoped to the authenticated user; a cart line id
//! belonging to another user behaves like a missing line.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::CartItemDetail;
use crate::db::repository::cart;
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    pub product_id: i64,
    pub variant_id: i64,
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 1, message = "quantity must be at least 1"))]
    pub quantity: i64,
}

/// GET /api/cart - list the user's cart lines
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<CartItemDetail>>> {
    let items = cart::list_for_user(&state.pool, user.id).await?;
    Ok(Json(items))
}

/// POST /api/cart - add a variant (merges into an existing line)
pub async fn add_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<AddItemRequest>,
) -> AppResult<Json<CartItemDetail>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let item = cart::add_item(&state.pool, user.id, req.product_id, req.variant_id, req.quantity)
        .await?;
    Ok(Json(item))
}

/// PUT /api/cart/:id - set a line's quantity
pub async fn update_quantity(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateQuantityRequest>,
) -> AppResult<Json<CartItemDetail>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let item = cart::update_quantity(&state.pool, user.id, id, req.quantity).await?;
    Ok(Json(item))
}

/// DELETE /api/cart/:id - remove a line
pub async fn remove_item(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    cart::remove(&state.pool, user.id, id).await?;
    Ok(Json(true))
}
