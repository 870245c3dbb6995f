//! Cart Repository
//!
//! One row per (user, variant); adding an existing variant increments the
//! quantity atomically via UPSERT. Concurrent mutations of the same line are
//! last-write-wins. The cart is cleared inside the checkout transaction in
//! [`super::order`], never here.

use sqlx::SqlitePool;

use crate::db::models::CartItemDetail;
use crate::utils::{AppError, AppResult};

const DETAIL_SELECT: &str = "SELECT ci.id, ci.product_id, ci.variant_id, ci.quantity,
        p.name AS product_name, v.name AS variant_name,
        v.retail_price, v.printful_variant_id
     FROM cart_items ci
     JOIN catalog_variants v ON v.id = ci.variant_id
     JOIN catalog_products p ON p.id = ci.product_id";

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<CartItemDetail>> {
    let items = sqlx::query_as::<_, CartItemDetail>(&format!(
        "{DETAIL_SELECT} WHERE ci.user_id = ? ORDER BY ci.id"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Add a variant to the cart, or increment its quantity if already present
pub async fn add_item(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    variant_id: i64,
    quantity: i64,
) -> AppResult<CartItemDetail> {
    if !super::catalog::variant_exists(pool, variant_id, product_id).await? {
        return Err(AppError::not_found(format!(
            "Variant {} for product {} not found",
            variant_id, product_id
        )));
    }

    sqlx::query(
        "INSERT INTO cart_items (user_id, product_id, variant_id, quantity)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(user_id, variant_id) DO UPDATE SET
             quantity = cart_items.quantity + excluded.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(variant_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    let item = sqlx::query_as::<_, CartItemDetail>(&format!(
        "{DETAIL_SELECT} WHERE ci.user_id = ? AND ci.variant_id = ?"
    ))
    .bind(user_id)
    .bind(variant_id)
    .fetch_one(pool)
    .await?;
    Ok(item)
}

/// Set the quantity of a cart line (owner-scoped)
pub async fn update_quantity(
    pool: &SqlitePool,
    user_id: i64,
    item_id: i64,
    quantity: i64,
) -> AppResult<CartItemDetail> {
    let result = sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ? AND user_id = ?")
        .bind(quantity)
        .bind(item_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Cart item {} not found", item_id)));
    }

    let item = sqlx::query_as::<_, CartItemDetail>(&format!("{DETAIL_SELECT} WHERE ci.id = ?"))
        .bind(item_id)
        .fetch_one(pool)
        .await?;
    Ok(item)
}

/// Remove a cart line (owner-scoped)
pub async fn remove(pool: &SqlitePool, user_id: i64, item_id: i64) -> AppResult<()> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND user_id = ?")
        .bind(item_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found(format!("Cart item {} not found", item_id)));
    }
    Ok(())
}
