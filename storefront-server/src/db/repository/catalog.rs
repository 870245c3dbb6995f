//! Catalog Mirror Repository
//!
//! Upserts are keyed by the provider's external ids (`printful_id`,
//! `printful_variant_id`), never by local id, so repeated syncs converge on
//! the upstream catalog instead of duplicating rows.

use sqlx::SqlitePool;

use crate::db::models::{CatalogProduct, CatalogVariant, ProductWithVariants};
use crate::utils::AppResult;
use crate::utils::time::now_rfc3339;

/// Upsert a mirrored product by its external id; returns the local id
pub async fn upsert_product(
    pool: &SqlitePool,
    printful_id: i64,
    name: &str,
    thumbnail: Option<&str>,
) -> AppResult<i64> {
    let now = now_rfc3339();
    sqlx::query(
        "INSERT INTO catalog_products (printful_id, name, thumbnail, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?)
         ON CONFLICT(printful_id) DO UPDATE SET
             name = excluded.name,
             thumbnail = excluded.thumbnail,
             updated_at = excluded.updated_at",
    )
    .bind(printful_id)
    .bind(name)
    .bind(thumbnail)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM catalog_products WHERE printful_id = ?")
        .bind(printful_id)
        .fetch_one(pool)
        .await?;
    Ok(id)
}

/// Upsert a mirrored variant by its external id; returns the local id
#[allow(clippy::too_many_arguments)]
pub async fn upsert_variant(
    pool: &SqlitePool,
    product_id: i64,
    printful_variant_id: i64,
    name: &str,
    retail_price: f64,
    printful_price: Option<f64>,
    size: Option<&str>,
    color: Option<&str>,
) -> AppResult<i64> {
    sqlx::query(
        "INSERT INTO catalog_variants
             (product_id, printful_variant_id, name, retail_price, printful_price, size, color, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT(printful_variant_id) DO UPDATE SET
             product_id = excluded.product_id,
             name = excluded.name,
             retail_price = excluded.retail_price,
             printful_price = excluded.printful_price,
             size = excluded.size,
             color = excluded.color,
             updated_at = excluded.updated_at",
    )
    .bind(product_id)
    .bind(printful_variant_id)
    .bind(name)
    .bind(retail_price)
    .bind(printful_price)
    .bind(size)
    .bind(color)
    .bind(now_rfc3339())
    .execute(pool)
    .await?;

    let id: i64 =
        sqlx::query_scalar("SELECT id FROM catalog_variants WHERE printful_variant_id = ?")
            .bind(printful_variant_id)
            .fetch_one(pool)
            .await?;
    Ok(id)
}

pub async fn find_all(pool: &SqlitePool) -> AppResult<Vec<ProductWithVariants>> {
    let products =
        sqlx::query_as::<_, CatalogProduct>("SELECT * FROM catalog_products ORDER BY id")
            .fetch_all(pool)
            .await?;
    let variants =
        sqlx::query_as::<_, CatalogVariant>("SELECT * FROM catalog_variants ORDER BY product_id, id")
            .fetch_all(pool)
            .await?;

    let mut result: Vec<ProductWithVariants> = products
        .into_iter()
        .map(|product| ProductWithVariants {
            product,
            variants: Vec::new(),
        })
        .collect();
    for variant in variants {
        if let Some(entry) = result.iter_mut().find(|p| p.product.id == variant.product_id) {
            entry.variants.push(variant);
        }
    }
    Ok(result)
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<ProductWithVariants>> {
    let product =
        sqlx::query_as::<_, CatalogProduct>("SELECT * FROM catalog_products WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    let Some(product) = product else {
        return Ok(None);
    };

    let variants = sqlx::query_as::<_, CatalogVariant>(
        "SELECT * FROM catalog_variants WHERE product_id = ? ORDER BY id",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(ProductWithVariants { product, variants }))
}

pub async fn variant_exists(pool: &SqlitePool, variant_id: i64, product_id: i64) -> AppResult<bool> {
    let found: Option<i64> = sqlx::query_scalar(
        "SELECT id FROM catalog_variants WHERE id = ? AND product_id = ?",
    )
    .bind(variant_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(found.is_some())
}
