//! Catalog Sync Service
//!
//! Pulls the provider's sync-product catalog into the local mirror. The
//! mirror is a read replica: upstream is the source of truth and repeated
//! syncs converge on it via external-id upserts.

use std::sync::Arc;

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository::catalog;
use crate::gateway::FulfillmentGateway;
use crate::utils::AppResult;

/// Counts from one catalog sync run
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub products_synced: i64,
    pub variants_synced: i64,
    /// Variants dropped because upstream quoted no retail price
    pub variants_skipped: i64,
}

#[derive(Clone)]
pub struct CatalogSyncService {
    pool: SqlitePool,
    fulfillment: Arc<dyn FulfillmentGateway>,
}

impl CatalogSyncService {
    pub fn new(pool: SqlitePool, fulfillment: Arc<dyn FulfillmentGateway>) -> Self {
        Self { pool, fulfillment }
    }

    /// Mirror the full provider catalog: one listing call, then one detail
    /// call per product. Variants without a retail price are skipped with a
    /// warning; a price of zero would be sellable.
    pub async fn sync_catalog(&self) -> AppResult<SyncReport> {
        let summaries = self.fulfillment.list_sync_products().await?;
        info!(product_count = summaries.len(), "Catalog sync started");

        let mut report = SyncReport::default();
        for summary in summaries {
            let detail = self.fulfillment.get_sync_product(summary.id).await?;
            let local_product_id = catalog::upsert_product(
                &self.pool,
                detail.product.id,
                &detail.product.name,
                detail.product.thumbnail_url.as_deref(),
            )
            .await?;
            report.products_synced += 1;

            for variant in detail.variants {
                let Some(retail_price) = variant.retail_price else {
                    warn!(
                        printful_id = detail.product.id,
                        printful_variant_id = variant.id,
                        variant_name = %variant.name,
                        "Variant has no retail price, skipped"
                    );
                    report.variants_skipped += 1;
                    continue;
                };
                catalog::upsert_variant(
                    &self.pool,
                    local_product_id,
                    variant.id,
                    &variant.name,
                    retail_price,
                    variant.printful_price,
                    variant.size.as_deref(),
                    variant.color.as_deref(),
                )
                .await?;
                report.variants_synced += 1;
            }
        }

        info!(
            products = report.products_synced,
            variants = report.variants_synced,
            skipped = report.variants_skipped,
            "Catalog sync finished"
        );
        Ok(report)
    }
}
