//! External Gateway Module
//!
//! Thin RPC client abstractions over the fulfillment provider (Printful) and
//! the payment processor (Stripe). The reconciliation engine and handlers
//! depend on the traits here, never on the concrete clients, so tests can
//! substitute in-process fakes.
//!
//! Any malformed or missing expected field in a provider response is a
//! gateway error — never a default value substitution, especially for
//! money-relevant fields (order id, quoted total).

pub mod printful;
pub mod stripe;

pub use printful::PrintfulClient;
pub use stripe::{StripeClient, verify_webhook_signature};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::db::models::{Order, ShippingRecipient};
use crate::utils::AppResult;

// =============================================================================
// Fulfillment gateway
// =============================================================================

/// Line item submitted to the fulfillment provider
#[derive(Debug, Clone, Serialize)]
pub struct DraftOrderItem {
    pub sync_variant_id: i64,
    pub quantity: i64,
}

/// Line item for shipping-rate queries
#[derive(Debug, Clone, Serialize)]
pub struct RateQueryItem {
    pub variant_id: i64,
    pub quantity: i64,
}

/// Provider cost breakdown. `total` is the authoritative order price.
#[derive(Debug, Clone, Serialize)]
pub struct OrderCosts {
    pub currency: Option<String>,
    pub subtotal: Option<f64>,
    pub shipping: Option<f64>,
    pub tax: Option<f64>,
    pub total: f64,
}

/// Provider-side draft order (created but not confirmed for production)
#[derive(Debug, Clone)]
pub struct DraftOrder {
    pub provider_order_id: String,
    pub status: String,
    pub costs: OrderCosts,
}

/// Provider-side order after confirmation
#[derive(Debug, Clone)]
pub struct ConfirmedOrder {
    pub provider_order_id: String,
    pub status: String,
}

/// A shipping rate option quoted by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRate {
    pub id: String,
    pub name: String,
    pub rate: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub min_delivery_days: Option<i64>,
    #[serde(default)]
    pub max_delivery_days: Option<i64>,
}

/// Summary row from the provider's sync-product listing
#[derive(Debug, Clone)]
pub struct SyncProductSummary {
    pub id: i64,
    pub name: String,
    pub thumbnail_url: Option<String>,
}

/// Variant detail from the provider catalog
#[derive(Debug, Clone)]
pub struct SyncVariant {
    pub id: i64,
    pub name: String,
    /// Retail price as quoted upstream; absent values are skipped by the
    /// catalog sync rather than defaulted
    pub retail_price: Option<f64>,
    pub printful_price: Option<f64>,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Full product detail (summary + variants)
#[derive(Debug, Clone)]
pub struct SyncProductDetail {
    pub product: SyncProductSummary,
    pub variants: Vec<SyncVariant>,
}

/// Fulfillment provider operations required by the core
#[async_trait]
pub trait FulfillmentGateway: Send + Sync {
    /// Create a provider-side draft order (not yet confirmed for production)
    async fn create_draft_order(
        &self,
        recipient: &ShippingRecipient,
        items: &[DraftOrderItem],
        shipping_method: &str,
    ) -> AppResult<DraftOrder>;

    /// Confirm an existing draft order for production/shipping
    async fn confirm_order(&self, provider_order_id: &str) -> AppResult<ConfirmedOrder>;

    /// Fetch the provider's current status string for an order
    async fn get_order_status(&self, provider_order_id: &str) -> AppResult<String>;

    /// Quote shipping rates for a recipient + item set
    async fn get_shipping_rates(
        &self,
        recipient: &ShippingRecipient,
        items: &[RateQueryItem],
    ) -> AppResult<Vec<ShippingRate>>;

    /// List sync products (catalog mirror refresh)
    async fn list_sync_products(&self) -> AppResult<Vec<SyncProductSummary>>;

    /// Fetch one sync product with its variants
    async fn get_sync_product(&self, product_id: i64) -> AppResult<SyncProductDetail>;
}

// =============================================================================
// Payment gateway
// =============================================================================

/// Line item for a hosted payment page
#[derive(Debug, Clone)]
pub struct PaymentLineItem {
    pub name: String,
    /// Unit amount in the currency's minor unit (cents)
    pub unit_amount_cents: i64,
    pub quantity: i64,
}

/// Hosted checkout session created with the payment processor
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Payment processor operations required by the core
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        order: &Order,
        line_items: &[PaymentLineItem],
    ) -> AppResult<CheckoutSession>;
}
