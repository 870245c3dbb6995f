//! Catalog Mirror Models
//!
//! Local read replica of the Printful sync-product catalog. Rows are matched
//! to upstream records by their external ids (`printful_id`,
//! `printful_variant_id`) on every sync, never by local id.

use serde::{Deserialize, Serialize};

/// Mirrored product
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogProduct {
    pub id: i64,
    /// Printful sync-product id (upsert key)
    pub printful_id: i64,
    pub name: String,
    pub thumbnail: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Mirrored variant
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CatalogVariant {
    pub id: i64,
    pub product_id: i64,
    /// Printful sync-variant id (upsert key). A variant without one cannot
    /// be submitted to the fulfillment provider.
    pub printful_variant_id: Option<i64>,
    pub name: String,
    pub retail_price: f64,
    /// Provider-side cost, when the catalog exposes it
    pub printful_price: Option<f64>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub updated_at: String,
}

/// Product with its variants attached (API shape)
#[derive(Debug, Clone, Serialize)]
pub struct ProductWithVariants {
    #[serde(flatten)]
    pub product: CatalogProduct,
    pub variants: Vec<CatalogVariant>,
}
