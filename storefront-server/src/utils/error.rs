//! Unified Error Handling
//!
//! Application-wide error type and the JSON error envelope it renders to.
//!
//! Error taxonomy (see also the status codes in `IntoResponse`):
//!
//! - validation errors → 400/422, recoverable by the caller
//! - state-conflict errors (already processed, missing fulfillment
//!   reference) → 400, never retried automatically
//! - upstream gateway errors → 502, logged with full context, not retried
//! - auth errors → 401/403, no state change

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API response envelope used for error bodies
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Authentication Errors ==========
    #[error("Authentication required")]
    Unauthorized,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Permission denied: {0}")]
    Forbidden(String),

    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    // ========== Order Reconciliation Errors ==========
    /// Payment confirmation attempted on an order that is no longer
    /// `pending`. Surfaced as 400 so the caller knows a retry is unnecessary.
    #[error("Already processed: {0}")]
    AlreadyProcessed(String),

    /// Order has no provider-side draft order id; nothing to confirm or sync.
    #[error("Missing fulfillment reference: {0}")]
    MissingFulfillmentReference(String),

    /// Every cart line was dropped while building the fulfillment payload.
    #[error("Empty checkout: {0}")]
    EmptyCheckout(String),

    // ========== System Errors ==========
    #[error("Upstream gateway error: {0}")]
    Gateway(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "E3001", "Please login first".to_string())
            }
            AppError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "E3003", "Token expired".to_string())
            }
            AppError::InvalidToken(_) => {
                (StatusCode::UNAUTHORIZED, "E3002", "Invalid token".to_string())
            }

            // Authorization errors (403)
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "E2001", msg.clone()),

            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg.clone()),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg.clone()),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg.clone()),

            // Business rule (422)
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E0005", msg.clone())
            }

            // Reconciliation state conflicts (400)
            AppError::AlreadyProcessed(msg) => (StatusCode::BAD_REQUEST, "E1001", msg.clone()),
            AppError::MissingFulfillmentReference(msg) => {
                (StatusCode::BAD_REQUEST, "E1002", msg.clone())
            }
            AppError::EmptyCheckout(msg) => (StatusCode::BAD_REQUEST, "E1003", msg.clone()),

            // Upstream gateway errors (502)
            AppError::Gateway(msg) => {
                error!(target: "gateway", error = %msg, "Upstream gateway error");
                (
                    StatusCode::BAD_GATEWAY,
                    "E9003",
                    "Upstream gateway error".to_string(),
                )
            }

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

// Convenience constructors (call sites read `AppError::not_found(..)`)
impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized
    }

    pub fn token_expired() -> Self {
        AppError::TokenExpired
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        AppError::InvalidToken(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        AppError::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn business_rule(msg: impl Into<String>) -> Self {
        AppError::BusinessRule(msg.into())
    }

    pub fn already_processed(msg: impl Into<String>) -> Self {
        AppError::AlreadyProcessed(msg.into())
    }

    pub fn missing_fulfillment_reference(msg: impl Into<String>) -> Self {
        AppError::MissingFulfillmentReference(msg.into())
    }

    pub fn empty_checkout(msg: impl Into<String>) -> Self {
        AppError::EmptyCheckout(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::Gateway(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        AppError::Database(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::not_found("Resource not found"),
            other => AppError::database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::internal(format!("JSON error: {}", e))
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::internal(e.to_string())
    }
}
