//! Storefront Server - print-on-demand e-commerce backend
//!
//! # Architecture
//!
//! - **Catalog mirror** (`services`, `db`): local read replica of the
//!   Printful sync-product catalog
//! - **Cart & checkout** (`api`, `orders`): per-user cart, checkout against
//!   a provider-quoted draft order
//! - **Order reconciliation** (`orders`): payment confirmation and
//!   fulfillment-status sync across three systems of record
//! - **Gateways** (`gateway`): Printful and Stripe REST clients behind
//!   traits
//! - **Auth** (`auth`): JWT + Argon2
//!
//! # Module layout
//!
//! ```text
//! storefront-server/src/
//! ├── core/          # config, state, server
//! ├── auth/          # JWT auth, password hashing, middleware
//! ├── api/           # HTTP routes and handlers
//! ├── orders/        # reconciliation engine, status mapping
//! ├── gateway/       # Printful / Stripe clients
//! ├── services/      # catalog sync
//! ├── db/            # pool, migrations, models, repositories
//! └── utils/         # errors, logging, time
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod gateway;
pub mod orders;
pub mod services;
pub mod utils;

// Re-export public types
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use orders::{ReconciliationEngine, map_provider_status};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env` and initialize logging. Call once, before anything that logs.
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(None, log_dir.as_deref());
    Ok(())
}
