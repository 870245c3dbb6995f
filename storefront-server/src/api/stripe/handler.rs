//! Stripe API Handlers
//!
//! Session creation charges the provider-quoted order total, never a locally
//! recomputed item sum. The webhook receiver is idempotent: a redelivered
//! `checkout.session.completed` is acknowledged with 200 so Stripe stops
//! retrying, while the order is left untouched.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::PaymentStatus;
use crate::db::repository::order;
use crate::gateway::PaymentLineItem;
use crate::gateway::stripe::WebhookEvent;
use crate::gateway::verify_webhook_signature;
use crate::utils::{AppError, AppResult};

/// Maximum webhook signature age
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// POST /api/stripe/checkout - create a hosted payment session for an order
pub async fn create_session(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<CreateSessionRequest>,
) -> AppResult<Json<CreateSessionResponse>> {
    let found = order::find_for_user(&state.pool, req.order_id, user.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Order {} not found", req.order_id)))?;

    if found.payment_status != PaymentStatus::Pending {
        return Err(AppError::already_processed(format!(
            "Order {} is not awaiting payment",
            found.id
        )));
    }

    // One line for the provider-quoted total; item-level recomputation would
    // drift from the authoritative price.
    let line_items = [PaymentLineItem {
        name: format!("Order #{}", found.id),
        unit_amount_cents: (found.total_price * 100.0).round() as i64,
        quantity: 1,
    }];

    let session = state.payment.create_checkout_session(&found, &line_items).await?;
    order::set_stripe_session_id(&state.pool, found.id, &session.id).await?;

    tracing::info!(
        order_id = found.id,
        user_id = user.id,
        session_id = %session.id,
        "Stripe checkout session created"
    );
    Ok(Json(CreateSessionResponse { url: session.url }))
}

/// POST /api/stripe/webhook - asynchronous payment notifications
///
/// Raw body is required: the signature covers the exact payload bytes.
pub async fn webhook(
    State(state): State<ServerState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Json<WebhookAck>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::validation("Missing Stripe-Signature header"))?;

    verify_webhook_signature(
        &body,
        signature,
        &state.config.stripe_webhook_secret,
        WEBHOOK_TOLERANCE_SECS,
    )?;

    let event = WebhookEvent::parse(&body)?;
    if event.event_type != "checkout.session.completed" {
        tracing::debug!(event_type = %event.event_type, "Ignoring webhook event");
        return Ok(Json(WebhookAck { received: true }));
    }

    let order_id = event
        .order_id()
        .ok_or_else(|| AppError::validation("Webhook session has no order_id metadata"))?;

    match state.engine.confirm_payment(order_id).await {
        Ok(order) => {
            tracing::info!(
                order_id = order.id,
                session_id = event.session_id().unwrap_or_default(),
                "Webhook payment confirmation processed"
            );
            Ok(Json(WebhookAck { received: true }))
        }
        // Redelivery: acknowledge so Stripe stops retrying
        Err(AppError::AlreadyProcessed(msg)) => {
            tracing::info!(order_id, reason = %msg, "Duplicate webhook acknowledged");
            Ok(Json(WebhookAck { received: true }))
        }
        Err(e) => Err(e),
    }
}
