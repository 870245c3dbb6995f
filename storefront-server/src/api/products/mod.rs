//! Product API Module

mod handler;

use axum::{
    Router,
    middleware,
    routing::{get, post},
};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        // Catalog sync mutates the mirror; admin only
        .route(
            "/sync",
            post(handler::sync).route_layer(middleware::from_fn(require_admin)),
        )
}
