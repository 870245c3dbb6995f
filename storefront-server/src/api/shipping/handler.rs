//! Shipping API Handlers
//!
//! Quotes shipping rates for the user's current cart against a destination
//! address. The quote comes straight from the fulfillment provider; nothing
//! is persisted.

use axum::{Json, extract::State};
use serde::Deserialize;
use validator::Validate;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::ShippingRecipient;
use crate::db::repository::cart;
use crate::gateway::{RateQueryItem, ShippingRate};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingOptionsRequest {
    #[validate(length(min = 1, message = "address1 is required"))]
    pub address1: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: String,
    #[validate(length(equal = 2, message = "country_code must be 2 characters"))]
    pub country_code: String,
}

/// POST /api/shipping-options - quote rates for the user's cart
pub async fn shipping_options(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<ShippingOptionsRequest>,
) -> AppResult<Json<Vec<ShippingRate>>> {
    req.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let cart_items = cart::list_for_user(&state.pool, user.id).await?;
    if cart_items.is_empty() {
        return Err(AppError::validation("Cart is empty"));
    }

    // Only lines with a provider variant id can be quoted
    let items: Vec<RateQueryItem> = cart_items
        .iter()
        .filter_map(|line| {
            line.printful_variant_id.map(|variant_id| RateQueryItem {
                variant_id,
                quantity: line.quantity,
            })
        })
        .collect();
    if items.is_empty() {
        return Err(AppError::empty_checkout(
            "No item in the cart can be shipped by the fulfillment provider",
        ));
    }

    let recipient = ShippingRecipient {
        name: user.name.clone(),
        address1: req.address1,
        city: req.city,
        zip: req.zip,
        country_code: req.country_code,
    };

    let rates = state
        .fulfillment
        .get_shipping_rates(&recipient, &items)
        .await?;
    Ok(Json(rates))
}
