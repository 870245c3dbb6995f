//! Stripe API Module

mod handler;

use axum::{Router, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/stripe/checkout", post(handler::create_session))
        // Public route; authenticated by signature verification instead
        .route("/api/stripe/webhook", post(handler::webhook))
}
