//! Stripe API Client
//!
//! Implements [`PaymentGateway`] over the Stripe Checkout Sessions API
//! (form-encoded, secret-key bearer auth), plus webhook signature
//! verification for the asynchronous payment notification receiver.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CheckoutSession, PaymentGateway, PaymentLineItem};
use crate::db::models::Order;
use crate::utils::time::now_unix;
use crate::utils::{AppError, AppResult};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";

/// Stripe REST client
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl StripeClient {
    pub fn new(
        secret_key: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: secret_key.into(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
        }
    }

    /// Override the API host (tests, mock servers)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        order: &Order,
        line_items: &[PaymentLineItem],
    ) -> AppResult<CheckoutSession> {
        let mut params: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("payment_method_types[0]".into(), "card".into()),
            ("success_url".into(), self.success_url.clone()),
            ("cancel_url".into(), self.cancel_url.clone()),
            ("metadata[order_id]".into(), order.id.to_string()),
            ("metadata[user_id]".into(), order.user_id.to_string()),
        ];
        for (i, item) in line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                "usd".into(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount_cents.to_string(),
            ));
            params.push((format!("line_items[{i}][quantity]"), item.quantity.to_string()));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::gateway(format!("Stripe request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::gateway(format!("Stripe response read failed: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<StripeErrorEnvelope>(&text)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or_else(|| text.clone());
            tracing::error!(
                order_id = order.id,
                status = %status,
                error = %detail,
                "Stripe checkout session creation failed"
            );
            return Err(AppError::gateway(format!("Stripe returned {}: {}", status, detail)));
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(order_id = order.id, body = %text, error = %e, "Malformed Stripe response");
            AppError::gateway("Malformed Stripe checkout session response")
        })
    }
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

// =============================================================================
// Webhook verification & event parsing
// =============================================================================

/// Asynchronous payment notification
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> AppResult<Self> {
        serde_json::from_slice(payload)
            .map_err(|e| AppError::validation(format!("Invalid webhook payload: {}", e)))
    }

    /// Session id of the event object, when present
    pub fn session_id(&self) -> Option<&str> {
        self.data.object.get("id").and_then(|v| v.as_str())
    }

    /// `metadata.order_id` of the event object, when present
    pub fn order_id(&self) -> Option<i64> {
        self.data
            .object
            .get("metadata")
            .and_then(|m| m.get("order_id"))
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
    }
}

/// Verify a `Stripe-Signature` header (`t=<unix>,v1=<hex hmac>`) against the
/// shared webhook secret. The signed message is `"{t}.{payload}"`; any `v1`
/// entry may match. Timestamps older than `tolerance_secs` are rejected to
/// limit replay.
pub fn verify_webhook_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    tolerance_secs: i64,
) -> AppResult<()> {
    let mut timestamp: Option<i64> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();

    for part in signature_header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(v)) => timestamp = v.parse().ok(),
            (Some("v1"), Some(v)) => {
                if let Ok(bytes) = hex::decode(v) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let timestamp =
        timestamp.ok_or_else(|| AppError::validation("Webhook signature has no timestamp"))?;
    if signatures.is_empty() {
        return Err(AppError::validation("Webhook signature has no v1 entry"));
    }
    if (now_unix() - timestamp).abs() > tolerance_secs {
        return Err(AppError::validation("Webhook signature timestamp out of tolerance"));
    }

    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_bytes());
    let mut message = Vec::with_capacity(payload.len() + 16);
    message.extend_from_slice(timestamp.to_string().as_bytes());
    message.push(b'.');
    message.extend_from_slice(payload);

    for signature in &signatures {
        if ring::hmac::verify(&key, &message, signature).is_ok() {
            return Ok(());
        }
    }
    Err(AppError::validation("Webhook signature mismatch"))
}
