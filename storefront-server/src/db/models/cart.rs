//! Cart Models

use serde::Serialize;

/// Cart row joined with its catalog product/variant (API + checkout shape)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub product_name: String,
    pub variant_name: String,
    /// Current catalog price; snapshotted into the order item at checkout
    pub retail_price: f64,
    /// External provider variant id; lines without one are dropped from
    /// fulfillment payloads
    pub printful_variant_id: Option<i64>,
}
