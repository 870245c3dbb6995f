//! Order Repository
//!
//! Orders are append-only; rows are never deleted. Two invariants are
//! enforced here rather than in application code:
//!
//! - checkout persists Order + OrderItems + cart clear in one transaction,
//!   so a draft order that failed to persist leaves the cart untouched
//! - the `pending → paid` payment transition is a single conditional UPDATE
//!   (compare-and-swap), closing the race between two concurrent
//!   confirmation calls for the same order

use sqlx::SqlitePool;

use crate::db::models::{
    NewOrderItem, Order, OrderDetail, OrderItemDetail, OrderStatus, PaymentStatus,
    ShippingRecipient,
};
use crate::utils::{AppError, AppResult};
use crate::utils::time::now_rfc3339;

/// Raw order row; status columns are TEXT and converted on the way out
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: i64,
    printful_order_id: Option<String>,
    stripe_session_id: Option<String>,
    shipping_recipient: String,
    shipping_method: String,
    total_price: f64,
    status: String,
    payment_status: String,
    created_at: String,
    updated_at: String,
}

impl OrderRow {
    fn into_order(self) -> AppResult<Order> {
        let shipping_recipient: ShippingRecipient =
            serde_json::from_str(&self.shipping_recipient).map_err(|e| {
                AppError::database(format!(
                    "Malformed shipping_recipient on order {}: {}",
                    self.id, e
                ))
            })?;
        let payment_status = PaymentStatus::parse(&self.payment_status).ok_or_else(|| {
            AppError::database(format!(
                "Unknown payment_status '{}' on order {}",
                self.payment_status, self.id
            ))
        })?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            printful_order_id: self.printful_order_id,
            stripe_session_id: self.stripe_session_id,
            shipping_recipient,
            shipping_method: self.shipping_method,
            total_price: self.total_price,
            status: OrderStatus::from(self.status.as_str()),
            payment_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Persist a successful checkout: order + item snapshots + cart clear,
/// all-or-nothing. Called only after the provider accepted the draft order.
pub async fn create_with_items(
    pool: &SqlitePool,
    user_id: i64,
    printful_order_id: &str,
    recipient: &ShippingRecipient,
    shipping_method: &str,
    total_price: f64,
    items: &[NewOrderItem],
) -> AppResult<Order> {
    let recipient_json = serde_json::to_string(recipient)?;
    let now = now_rfc3339();

    let mut tx = pool.begin().await?;

    let order_id = sqlx::query(
        "INSERT INTO orders
             (user_id, printful_order_id, shipping_recipient, shipping_method,
              total_price, status, payment_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(printful_order_id)
    .bind(&recipient_json)
    .bind(shipping_method)
    .bind(total_price)
    .bind(OrderStatus::DraftCreated.as_str())
    .bind(PaymentStatus::Pending.as_str())
    .bind(&now)
    .bind(&now)
    .execute(&mut *tx)
    .await?
    .last_insert_rowid();

    for item in items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, variant_id, quantity, retail_price)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.variant_id)
        .bind(item.quantity)
        .bind(item.retail_price)
        .execute(&mut *tx)
        .await?;
    }

    // Clear the cart only in the same transaction as the order rows; a
    // partial write rolls everything back and the cart remains the
    // recovery path.
    sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    find_by_id(pool, order_id)
        .await?
        .ok_or_else(|| AppError::database("Order row vanished after insert"))
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(OrderRow::into_order).transpose()
}

pub async fn find_for_user(pool: &SqlitePool, id: i64, user_id: i64) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    row.map(OrderRow::into_order).transpose()
}

pub async fn list_for_user(pool: &SqlitePool, user_id: i64) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(
        "SELECT * FROM orders WHERE user_id = ? ORDER BY id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(OrderRow::into_order).collect()
}

pub async fn list_all(pool: &SqlitePool) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders ORDER BY id DESC")
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(OrderRow::into_order).collect()
}

pub async fn items_for_order(pool: &SqlitePool, order_id: i64) -> AppResult<Vec<OrderItemDetail>> {
    let items = sqlx::query_as::<_, OrderItemDetail>(
        "SELECT oi.id, oi.product_id, oi.variant_id, v.name AS variant_name,
                oi.quantity, oi.retail_price
         FROM order_items oi
         LEFT JOIN catalog_variants v ON v.id = oi.variant_id
         WHERE oi.order_id = ?
         ORDER BY oi.id",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(items)
}

/// Attach items to an order for API responses
pub async fn with_items(pool: &SqlitePool, order: Order) -> AppResult<OrderDetail> {
    let items = items_for_order(pool, order.id).await?;
    Ok(OrderDetail { order, items })
}

/// Atomic `pending → paid` transition. Returns false when the order was not
/// `pending` (already paid, failed confirmation, ...): the caller must treat
/// that as "already processed", not retry.
pub async fn mark_paid_if_pending(pool: &SqlitePool, order_id: i64) -> AppResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET payment_status = ?, updated_at = ?
         WHERE id = ? AND payment_status = ?",
    )
    .bind(PaymentStatus::Paid.as_str())
    .bind(now_rfc3339())
    .bind(order_id)
    .bind(PaymentStatus::Pending.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_payment_status(
    pool: &SqlitePool,
    order_id: i64,
    payment_status: PaymentStatus,
) -> AppResult<()> {
    sqlx::query("UPDATE orders SET payment_status = ?, updated_at = ? WHERE id = ?")
        .bind(payment_status.as_str())
        .bind(now_rfc3339())
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_status(pool: &SqlitePool, order_id: i64, status: &OrderStatus) -> AppResult<()> {
    sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now_rfc3339())
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_stripe_session_id(
    pool: &SqlitePool,
    order_id: i64,
    session_id: &str,
) -> AppResult<()> {
    sqlx::query("UPDATE orders SET stripe_session_id = ?, updated_at = ? WHERE id = ?")
        .bind(session_id)
        .bind(now_rfc3339())
        .bind(order_id)
        .execute(pool)
        .await?;
    Ok(())
}
