use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::gateway::{FulfillmentGateway, PaymentGateway, PrintfulClient, StripeClient};
use crate::orders::ReconciliationEngine;
use crate::services::CatalogSyncService;
use crate::utils::AppResult;

/// Shared application state, cloned into every handler
///
/// | Field | Description |
/// |-------|-------------|
/// | config | immutable configuration |
/// | pool | SQLite connection pool |
/// | jwt_service | token generation/validation |
/// | fulfillment | fulfillment provider gateway |
/// | payment | payment processor gateway |
/// | engine | order reconciliation core |
/// | catalog_sync | catalog mirror refresh |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub fulfillment: Arc<dyn FulfillmentGateway>,
    pub payment: Arc<dyn PaymentGateway>,
    pub engine: ReconciliationEngine,
    pub catalog_sync: CatalogSyncService,
}

impl ServerState {
    /// Build state from explicit components (tests swap in gateway fakes)
    pub fn new(
        config: Config,
        pool: SqlitePool,
        fulfillment: Arc<dyn FulfillmentGateway>,
        payment: Arc<dyn PaymentGateway>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));
        let engine = ReconciliationEngine::new(pool.clone(), fulfillment.clone());
        let catalog_sync = CatalogSyncService::new(pool.clone(), fulfillment.clone());
        Self {
            config,
            pool,
            jwt_service,
            fulfillment,
            payment,
            engine,
            catalog_sync,
        }
    }

    /// Initialize all services from configuration: database (with
    /// migrations) and the production gateway clients
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_url).await?;

        let fulfillment: Arc<dyn FulfillmentGateway> = Arc::new(PrintfulClient::new(
            &config.printful_base_url,
            &config.printful_api_key,
            config.gateway_timeout_ms,
        ));
        let payment: Arc<dyn PaymentGateway> = Arc::new(StripeClient::new(
            &config.stripe_secret_key,
            &config.checkout_success_url,
            &config.checkout_cancel_url,
            config.gateway_timeout_ms,
        ));

        Ok(Self::new(config.clone(), db.pool, fulfillment, payment))
    }
}
