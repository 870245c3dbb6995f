//! Printful API Client
//!
//! Implements [`FulfillmentGateway`] over Printful's REST API
//! (`POST /orders`, `POST /orders/{id}/confirm`, `GET /orders/{id}`,
//! `POST /shipping/rates`, `GET /store/products`).
//!
//! Printful wraps every payload in `{code, result, error}` and quotes money
//! as strings. Raw response types below keep every field optional; the
//! conversion into the gateway DTOs is where "missing id/total = error"
//! is enforced.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{
    ConfirmedOrder, DraftOrder, DraftOrderItem, FulfillmentGateway, OrderCosts, RateQueryItem,
    ShippingRate, SyncProductDetail, SyncProductSummary, SyncVariant,
};
use crate::db::models::ShippingRecipient;
use crate::utils::{AppError, AppResult};

/// Printful REST client
#[derive(Debug, Clone)]
pub struct PrintfulClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PrintfulClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, timeout_ms: u64) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> AppResult<T> {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Printful request failed: {}", e)))?;
        Self::handle_response(path, response).await
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> AppResult<T> {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Printful request failed: {}", e)))?;
        Self::handle_response(path, response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::gateway(format!("Printful response read failed: {}", e)))?;

        if !status.is_success() {
            tracing::error!(
                path = %path,
                status = %status,
                body = %text,
                "Printful returned an error status"
            );
            return Err(AppError::gateway(format!(
                "Printful {} returned {}",
                path, status
            )));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(path = %path, body = %text, error = %e, "Malformed Printful response");
            AppError::gateway(format!("Malformed Printful response for {}", path))
        })?;

        envelope.result.ok_or_else(|| {
            tracing::error!(path = %path, body = %text, "Printful response has no result");
            AppError::gateway(format!("Printful response for {} has no result", path))
        })
    }
}

#[async_trait]
impl FulfillmentGateway for PrintfulClient {
    async fn create_draft_order(
        &self,
        recipient: &ShippingRecipient,
        items: &[DraftOrderItem],
        shipping_method: &str,
    ) -> AppResult<DraftOrder> {
        let payload = json!({
            "recipient": recipient,
            "items": items,
            "shipping": shipping_method,
        });
        let raw: RawOrder = self.post_json("/orders", &payload).await?;
        raw.into_draft_order()
    }

    async fn confirm_order(&self, provider_order_id: &str) -> AppResult<ConfirmedOrder> {
        let raw: RawOrder = self
            .post_json(&format!("/orders/{}/confirm", provider_order_id), &json!({}))
            .await?;
        let id = raw.require_id()?;
        let status = raw
            .status
            .ok_or_else(|| AppError::gateway("Printful confirmation has no status"))?;
        Ok(ConfirmedOrder {
            provider_order_id: id,
            status,
        })
    }

    async fn get_order_status(&self, provider_order_id: &str) -> AppResult<String> {
        let raw: RawOrder = self.get_json(&format!("/orders/{}", provider_order_id)).await?;
        raw.status
            .ok_or_else(|| AppError::gateway("Printful order has no status field"))
    }

    async fn get_shipping_rates(
        &self,
        recipient: &ShippingRecipient,
        items: &[RateQueryItem],
    ) -> AppResult<Vec<ShippingRate>> {
        let payload = json!({
            "recipient": recipient,
            "items": items,
        });
        self.post_json("/shipping/rates", &payload).await
    }

    async fn list_sync_products(&self) -> AppResult<Vec<SyncProductSummary>> {
        let raw: Vec<RawSyncProduct> = self.get_json("/store/products").await?;
        raw.into_iter().map(RawSyncProduct::into_summary).collect()
    }

    async fn get_sync_product(&self, product_id: i64) -> AppResult<SyncProductDetail> {
        let raw: RawSyncProductDetail = self
            .get_json(&format!("/store/products/{}", product_id))
            .await?;
        let product = raw
            .sync_product
            .ok_or_else(|| AppError::gateway("Printful product detail has no sync_product"))?
            .into_summary()?;
        let variants = raw
            .sync_variants
            .unwrap_or_default()
            .into_iter()
            .map(RawSyncVariant::into_variant)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(SyncProductDetail { product, variants })
    }
}

// =============================================================================
// Raw response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[allow(dead_code)]
    #[serde(default)]
    code: Option<i64>,
    result: Option<T>,
}

/// Order ids arrive as JSON numbers from Printful but are treated as opaque
/// strings locally.
fn id_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_money(value: &str, field: &str) -> AppResult<f64> {
    value
        .parse::<f64>()
        .map_err(|_| AppError::gateway(format!("Unparseable Printful {} '{}'", field, value)))
}

#[derive(Debug, Deserialize)]
struct RawOrder {
    id: Option<serde_json::Value>,
    status: Option<String>,
    costs: Option<RawCosts>,
}

#[derive(Debug, Deserialize)]
struct RawCosts {
    currency: Option<String>,
    subtotal: Option<String>,
    shipping: Option<String>,
    tax: Option<String>,
    total: Option<String>,
}

impl RawOrder {
    fn require_id(&self) -> AppResult<String> {
        self.id
            .as_ref()
            .and_then(id_to_string)
            .ok_or_else(|| AppError::gateway("Printful order response has no order id"))
    }

    fn into_draft_order(self) -> AppResult<DraftOrder> {
        let provider_order_id = self.require_id()?;
        let status = self.status.unwrap_or_else(|| "draft".to_string());
        let costs = self
            .costs
            .ok_or_else(|| AppError::gateway("Printful draft order has no costs"))?;
        let total = costs
            .total
            .as_deref()
            .ok_or_else(|| AppError::gateway("Printful draft order costs have no total"))?;
        let total = parse_money(total, "total")?;

        let opt = |v: Option<String>, field: &str| -> AppResult<Option<f64>> {
            v.as_deref().map(|s| parse_money(s, field)).transpose()
        };

        Ok(DraftOrder {
            provider_order_id,
            status,
            costs: OrderCosts {
                currency: costs.currency,
                subtotal: opt(costs.subtotal, "subtotal")?,
                shipping: opt(costs.shipping, "shipping")?,
                tax: opt(costs.tax, "tax")?,
                total,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSyncProduct {
    id: Option<i64>,
    name: Option<String>,
    thumbnail_url: Option<String>,
}

impl RawSyncProduct {
    fn into_summary(self) -> AppResult<SyncProductSummary> {
        let id = self
            .id
            .ok_or_else(|| AppError::gateway("Printful sync product has no id"))?;
        let name = self
            .name
            .ok_or_else(|| AppError::gateway("Printful sync product has no name"))?;
        Ok(SyncProductSummary {
            id,
            name,
            thumbnail_url: self.thumbnail_url,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSyncProductDetail {
    sync_product: Option<RawSyncProduct>,
    sync_variants: Option<Vec<RawSyncVariant>>,
}

#[derive(Debug, Deserialize)]
struct RawSyncVariant {
    id: Option<i64>,
    name: Option<String>,
    retail_price: Option<String>,
    #[serde(default)]
    cost: Option<String>,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    color: Option<String>,
}

impl RawSyncVariant {
    fn into_variant(self) -> AppResult<SyncVariant> {
        let id = self
            .id
            .ok_or_else(|| AppError::gateway("Printful sync variant has no id"))?;
        let name = self
            .name
            .ok_or_else(|| AppError::gateway("Printful sync variant has no name"))?;
        // Prices stay None when absent; the catalog sync decides whether to
        // skip the row. Present-but-unparseable is still an error.
        let retail_price = self
            .retail_price
            .as_deref()
            .map(|s| parse_money(s, "retail_price"))
            .transpose()?;
        let printful_price = self
            .cost
            .as_deref()
            .map(|s| parse_money(s, "cost"))
            .transpose()?;
        Ok(SyncVariant {
            id,
            name,
            retail_price,
            printful_price,
            size: self.size,
            color: self.color,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_order_requires_an_id() {
        let raw = RawOrder {
            id: None,
            status: Some("draft".into()),
            costs: Some(RawCosts {
                currency: None,
                subtotal: None,
                shipping: None,
                tax: None,
                total: Some("23.50".into()),
            }),
        };
        assert!(matches!(raw.into_draft_order(), Err(AppError::Gateway(_))));
    }

    #[test]
    fn draft_order_requires_a_total() {
        let raw = RawOrder {
            id: Some(serde_json::json!(12345)),
            status: Some("draft".into()),
            costs: Some(RawCosts {
                currency: Some("USD".into()),
                subtotal: None,
                shipping: None,
                tax: None,
                total: None,
            }),
        };
        assert!(matches!(raw.into_draft_order(), Err(AppError::Gateway(_))));
    }

    #[test]
    fn draft_order_parses_quoted_money_and_numeric_id() {
        let raw = RawOrder {
            id: Some(serde_json::json!(12345)),
            status: None,
            costs: Some(RawCosts {
                currency: Some("USD".into()),
                subtotal: Some("20.00".into()),
                shipping: Some("3.50".into()),
                tax: Some("0.00".into()),
                total: Some("23.50".into()),
            }),
        };
        let draft = raw.into_draft_order().unwrap();
        assert_eq!(draft.provider_order_id, "12345");
        assert_eq!(draft.costs.total, 23.5);
        assert_eq!(draft.costs.shipping, Some(3.5));
    }
}
