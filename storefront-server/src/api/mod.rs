//! API Route Modules
//!
//! One module per resource, each exposing a `router()` that nests itself
//! under its `/api/...` prefix:
//!
//! - [`health`] - liveness check
//! - [`auth`] - register / login / current user
//! - [`products`] - catalog mirror (list, detail, admin sync)
//! - [`cart`] - per-user shopping cart
//! - [`shipping`] - provider shipping-rate quotes
//! - [`orders`] - checkout, payment confirmation, order history
//! - [`stripe`] - hosted payment sessions and the webhook receiver
//! - [`admin_orders`] - admin order views and fulfillment-status sync

pub mod admin_orders;
pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod shipping;
pub mod stripe;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
