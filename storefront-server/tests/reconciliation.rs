//! Checkout, payment confirmation and status-sync flows against an
//! in-memory database and an in-process fulfillment fake.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use storefront_server::auth::CurrentUser;
use storefront_server::db::MIGRATOR;
use storefront_server::db::models::{Order, OrderStatus, PaymentStatus, ShippingRecipient};
use storefront_server::db::repository::{cart, catalog, order};
use storefront_server::gateway::{
    CheckoutSession, ConfirmedOrder, DraftOrder, DraftOrderItem, FulfillmentGateway, OrderCosts,
    PaymentGateway, PaymentLineItem, RateQueryItem, ShippingRate, SyncProductDetail,
    SyncProductSummary, SyncVariant,
};
use storefront_server::orders::{CheckoutRequest, ReconciliationEngine};
use storefront_server::services::CatalogSyncService;
use storefront_server::utils::{AppError, AppResult};

// =============================================================================
// Fulfillment fake
// =============================================================================

#[derive(Default)]
struct MockFulfillment {
    fail_draft: bool,
    fail_confirm: bool,
    provider_status: Mutex<String>,
    draft_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
}

impl MockFulfillment {
    fn new() -> Self {
        Self {
            provider_status: Mutex::new("draft".to_string()),
            ..Default::default()
        }
    }

    fn set_provider_status(&self, status: &str) {
        *self.provider_status.lock().unwrap() = status.to_string();
    }
}

#[async_trait]
impl FulfillmentGateway for MockFulfillment {
    async fn create_draft_order(
        &self,
        _recipient: &ShippingRecipient,
        items: &[DraftOrderItem],
        _shipping_method: &str,
    ) -> AppResult<DraftOrder> {
        self.draft_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_draft {
            return Err(AppError::gateway("draft order rejected"));
        }
        assert!(!items.is_empty(), "draft order submitted with no items");
        Ok(DraftOrder {
            provider_order_id: "PF1".to_string(),
            status: "draft".to_string(),
            costs: OrderCosts {
                currency: Some("USD".to_string()),
                subtotal: Some(20.0),
                shipping: Some(3.5),
                tax: Some(0.0),
                total: 23.5,
            },
        })
    }

    async fn confirm_order(&self, provider_order_id: &str) -> AppResult<ConfirmedOrder> {
        self.confirm_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_confirm {
            return Err(AppError::gateway("confirmation rejected"));
        }
        Ok(ConfirmedOrder {
            provider_order_id: provider_order_id.to_string(),
            status: "pending".to_string(),
        })
    }

    async fn get_order_status(&self, _provider_order_id: &str) -> AppResult<String> {
        Ok(self.provider_status.lock().unwrap().clone())
    }

    async fn get_shipping_rates(
        &self,
        _recipient: &ShippingRecipient,
        _items: &[RateQueryItem],
    ) -> AppResult<Vec<ShippingRate>> {
        Ok(vec![ShippingRate {
            id: "STANDARD".to_string(),
            name: "Flat Rate".to_string(),
            rate: "3.50".to_string(),
            currency: Some("USD".to_string()),
            min_delivery_days: Some(3),
            max_delivery_days: Some(7),
        }])
    }

    async fn list_sync_products(&self) -> AppResult<Vec<SyncProductSummary>> {
        Ok(vec![SyncProductSummary {
            id: 301,
            name: "Classic Tee".to_string(),
            thumbnail_url: None,
        }])
    }

    async fn get_sync_product(&self, product_id: i64) -> AppResult<SyncProductDetail> {
        Ok(SyncProductDetail {
            product: SyncProductSummary {
                id: product_id,
                name: "Classic Tee".to_string(),
                thumbnail_url: None,
            },
            variants: vec![
                SyncVariant {
                    id: 4011,
                    name: "Classic Tee / M".to_string(),
                    retail_price: Some(10.0),
                    printful_price: Some(6.0),
                    size: Some("M".to_string()),
                    color: Some("Black".to_string()),
                },
                SyncVariant {
                    id: 4012,
                    name: "Classic Tee / L".to_string(),
                    retail_price: None,
                    printful_price: None,
                    size: Some("L".to_string()),
                    color: Some("Black".to_string()),
                },
            ],
        })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

async fn test_pool() -> SqlitePool {
    // Single connection so every query sees the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}

async fn seed_user(pool: &SqlitePool) -> CurrentUser {
    sqlx::query(
        "INSERT INTO users (name, email, password_hash, is_admin, created_at)
         VALUES ('Alice', 'alice@example.com', 'x', 0, '2025-01-01T00:00:00Z')",
    )
    .execute(pool)
    .await
    .unwrap();
    CurrentUser {
        id: 1,
        name: "Alice".to_string(),
        email: "alice@example.com".to_string(),
        is_admin: false,
    }
}

/// Seed one mirrored product with a fulfillable variant and put 2 units in
/// the user's cart. Returns (product_id, variant_id).
async fn seed_cart(pool: &SqlitePool, user: &CurrentUser) -> (i64, i64) {
    let product_id = catalog::upsert_product(pool, 301, "Classic Tee", None)
        .await
        .unwrap();
    let variant_id = catalog::upsert_variant(
        pool,
        product_id,
        4011,
        "Classic Tee / M",
        10.0,
        Some(6.0),
        Some("M"),
        Some("Black"),
    )
    .await
    .unwrap();
    cart::add_item(pool, user.id, product_id, variant_id, 2)
        .await
        .unwrap();
    (product_id, variant_id)
}

fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        address1: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        zip: "12345".to_string(),
        country_code: "US".to_string(),
        shipping_method: "STANDARD".to_string(),
    }
}

fn engine_with(pool: &SqlitePool, mock: Arc<MockFulfillment>) -> ReconciliationEngine {
    ReconciliationEngine::new(pool.clone(), mock)
}

// =============================================================================
// Database bootstrap
// =============================================================================

#[tokio::test]
async fn db_service_creates_and_migrates_a_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("store.db");
    let db = storefront_server::db::DbService::new(path.to_str().unwrap())
        .await
        .unwrap();

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn checkout_persists_provider_quote_and_clears_cart() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let (product_id, variant_id) = seed_cart(&pool, &user).await;

    let mock = Arc::new(MockFulfillment::new());
    let engine = engine_with(&pool, mock.clone());

    let outcome = engine.checkout(&user, &checkout_request()).await.unwrap();

    assert_eq!(outcome.order.printful_order_id.as_deref(), Some("PF1"));
    assert_eq!(outcome.order.total_price, 23.5);
    assert_eq!(outcome.order.status, OrderStatus::DraftCreated);
    assert_eq!(outcome.order.payment_status, PaymentStatus::Pending);
    assert_eq!(outcome.costs.shipping, Some(3.5));
    assert_eq!(mock.draft_calls.load(Ordering::SeqCst), 1);

    // Item snapshot carries the cart quantity and the catalog price
    let items = order::items_for_order(&pool, outcome.order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, product_id);
    assert_eq!(items[0].variant_id, variant_id);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].retail_price, 10.0);

    // Cart cleared in the same transaction
    let remaining = cart::list_for_user(&pool, user.id).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn failed_draft_creation_leaves_no_trace() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    seed_cart(&pool, &user).await;

    let mock = Arc::new(MockFulfillment {
        fail_draft: true,
        ..MockFulfillment::new()
    });
    let engine = engine_with(&pool, mock);

    let result = engine.checkout(&user, &checkout_request()).await;
    assert!(matches!(result, Err(AppError::Gateway(_))));

    // No order row, cart untouched
    let orders = order::list_for_user(&pool, user.id).await.unwrap();
    assert!(orders.is_empty());
    let remaining = cart::list_for_user(&pool, user.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].quantity, 2);
}

#[tokio::test]
async fn checkout_rejects_cart_with_no_fulfillable_line() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;

    // Variant without an external provider id
    let product_id = catalog::upsert_product(&pool, 302, "Local Only", None)
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO catalog_variants (product_id, name, retail_price, updated_at)
         VALUES (?, 'Local Only / One Size', 5.0, '2025-01-01T00:00:00Z')",
    )
    .bind(product_id)
    .execute(&pool)
    .await
    .unwrap();
    let variant_id: i64 = sqlx::query_scalar("SELECT id FROM catalog_variants WHERE product_id = ?")
        .bind(product_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    cart::add_item(&pool, user.id, product_id, variant_id, 1)
        .await
        .unwrap();

    let mock = Arc::new(MockFulfillment::new());
    let engine = engine_with(&pool, mock.clone());

    let result = engine.checkout(&user, &checkout_request()).await;
    assert!(matches!(result, Err(AppError::EmptyCheckout(_))));
    // The provider was never called
    assert_eq!(mock.draft_calls.load(Ordering::SeqCst), 0);
    // Cart untouched
    assert_eq!(cart::list_for_user(&pool, user.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn checkout_rejects_an_empty_cart() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;

    let engine = engine_with(&pool, Arc::new(MockFulfillment::new()));
    let result = engine.checkout(&user, &checkout_request()).await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn adding_the_same_variant_merges_cart_lines() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let (product_id, variant_id) = seed_cart(&pool, &user).await;

    cart::add_item(&pool, user.id, product_id, variant_id, 3)
        .await
        .unwrap();

    let items = cart::list_for_user(&pool, user.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 5);
}

// =============================================================================
// Payment confirmation
// =============================================================================

async fn checked_out_order(
    pool: &SqlitePool,
    user: &CurrentUser,
    mock: Arc<MockFulfillment>,
) -> i64 {
    seed_cart(pool, user).await;
    let engine = engine_with(pool, mock);
    engine
        .checkout(user, &checkout_request())
        .await
        .unwrap()
        .order
        .id
}

#[tokio::test]
async fn confirm_payment_submits_the_draft_exactly_once() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let engine = engine_with(&pool, mock.clone());
    let confirmed = engine.confirm_payment(order_id).await.unwrap();
    assert_eq!(confirmed.payment_status, PaymentStatus::Paid);
    assert_eq!(confirmed.status, OrderStatus::SubmittedToProvider);
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 1);

    // Redelivered notification: rejected, no second provider call
    let second = engine.confirm_payment(order_id).await;
    assert!(matches!(second, Err(AppError::AlreadyProcessed(_))));
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 1);

    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::SubmittedToProvider);
}

#[tokio::test]
async fn failed_provider_confirmation_keeps_the_payment_record() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment {
        fail_confirm: true,
        ..MockFulfillment::new()
    });
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let engine = engine_with(&pool, mock.clone());
    let result = engine.confirm_payment(order_id).await;
    assert!(matches!(result, Err(AppError::Gateway(_))));

    // Divergence is recorded, not rolled back
    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::FailedConfirmation);
    assert_eq!(order.status, OrderStatus::DraftCreated);

    // The order is no longer pending, so a retry is refused
    let retry = engine.confirm_payment(order_id).await;
    assert!(matches!(retry, Err(AppError::AlreadyProcessed(_))));
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn confirm_without_provider_reference_stays_paid() {
    let pool = test_pool().await;
    seed_user(&pool).await;

    // Hand-recovered row without a draft order id
    sqlx::query(
        "INSERT INTO orders
             (user_id, printful_order_id, shipping_recipient, shipping_method,
              total_price, status, payment_status, created_at, updated_at)
         VALUES (1, NULL, '{\"name\":\"Alice\",\"address1\":\"1 Main St\",\"city\":\"Springfield\",\"zip\":\"12345\",\"country_code\":\"US\"}',
                 'STANDARD', 23.5, 'draft_created', 'pending',
                 '2025-01-01T00:00:00Z', '2025-01-01T00:00:00Z')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let mock = Arc::new(MockFulfillment::new());
    let engine = engine_with(&pool, mock.clone());

    let result = engine.confirm_payment(1).await;
    assert!(matches!(result, Err(AppError::MissingFulfillmentReference(_))));
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 0);

    // The payment event is kept even though nothing could be submitted
    let order = order::find_by_id(&pool, 1).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::DraftCreated);
}

#[tokio::test]
async fn confirm_payment_of_a_missing_order_is_not_found() {
    let pool = test_pool().await;
    let engine = engine_with(&pool, Arc::new(MockFulfillment::new()));
    let result = engine.confirm_payment(99).await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

// =============================================================================
// Fulfillment status sync
// =============================================================================

#[tokio::test]
async fn sync_maps_known_provider_statuses() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let engine = engine_with(&pool, mock.clone());

    mock.set_provider_status("shipped");
    let outcome = engine.sync_fulfillment_status(order_id).await.unwrap();
    assert_eq!(outcome.provider_status, "shipped");
    assert_eq!(outcome.order.status, OrderStatus::Completed);

    // Repeated sync with the same upstream state is a no-op
    let again = engine.sync_fulfillment_status(order_id).await.unwrap();
    assert_eq!(again.order.status, OrderStatus::Completed);
}

#[tokio::test]
async fn sync_passes_unknown_provider_statuses_through() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let engine = engine_with(&pool, mock.clone());

    mock.set_provider_status("onhold");
    let outcome = engine.sync_fulfillment_status(order_id).await.unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Other("onhold".to_string()));
    assert_eq!(outcome.order.status.as_str(), "onhold");

    // The stored value survives a reload unchanged
    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.status.as_str(), "onhold");
}

#[tokio::test]
async fn sync_does_not_touch_the_payment_axis() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let engine = engine_with(&pool, mock.clone());
    engine.confirm_payment(order_id).await.unwrap();

    mock.set_provider_status("fulfilled");
    let outcome = engine.sync_fulfillment_status(order_id).await.unwrap();
    assert_eq!(outcome.order.status, OrderStatus::Transit);
    assert_eq!(outcome.order.payment_status, PaymentStatus::Paid);
}

// =============================================================================
// Webhook receiver
// =============================================================================

struct MockPayment;

#[async_trait]
impl PaymentGateway for MockPayment {
    async fn create_checkout_session(
        &self,
        order: &Order,
        _line_items: &[PaymentLineItem],
    ) -> AppResult<CheckoutSession> {
        Ok(CheckoutSession {
            id: format!("cs_{}", order.id),
            url: "https://pay.example/session".to_string(),
        })
    }
}

fn stripe_signature(payload: &[u8], secret: &str) -> String {
    let timestamp = storefront_server::utils::time::now_unix();
    let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret.as_bytes());
    let mut message = timestamp.to_string().into_bytes();
    message.push(b'.');
    message.extend_from_slice(payload);
    let tag = ring::hmac::sign(&key, &message);
    format!("t={},v1={}", timestamp, hex::encode(tag.as_ref()))
}

async fn post_webhook(
    router: &axum::Router,
    payload: &[u8],
    signature: &str,
) -> (axum::http::StatusCode, serde_json::Value) {
    use tower::ServiceExt;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/api/stripe/webhook")
        .header("stripe-signature", signature)
        .body(axum::body::Body::from(payload.to_vec()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, body)
}

#[tokio::test]
async fn webhook_acknowledges_redelivered_session_completions() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let mut config = storefront_server::Config::from_env();
    config.stripe_webhook_secret = "whsec_test".to_string();
    let state = storefront_server::ServerState::new(
        config,
        pool.clone(),
        mock.clone(),
        Arc::new(MockPayment),
    );
    let router = storefront_server::Server::build_router(state);

    let payload = serde_json::json!({
        "id": "evt_1",
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_1", "metadata": {"order_id": order_id.to_string()}}}
    });
    let payload = serde_json::to_vec(&payload).unwrap();
    let signature = stripe_signature(&payload, "whsec_test");

    // First delivery confirms the payment and submits the draft
    let (status, body) = post_webhook(&router, &payload, &signature).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["received"], serde_json::Value::Bool(true));
    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::SubmittedToProvider);
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 1);

    // Redelivery: still 200 so the processor stops retrying, no second
    // provider call, order untouched
    let (status, body) = post_webhook(&router, &payload, &signature).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(body["received"], serde_json::Value::Bool(true));
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 1);
    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, OrderStatus::SubmittedToProvider);
}

#[tokio::test]
async fn webhook_rejects_a_bad_signature() {
    let pool = test_pool().await;
    let user = seed_user(&pool).await;
    let mock = Arc::new(MockFulfillment::new());
    let order_id = checked_out_order(&pool, &user, mock.clone()).await;

    let mut config = storefront_server::Config::from_env();
    config.stripe_webhook_secret = "whsec_test".to_string();
    let state = storefront_server::ServerState::new(
        config,
        pool.clone(),
        mock.clone(),
        Arc::new(MockPayment),
    );
    let router = storefront_server::Server::build_router(state);

    let payload = serde_json::json!({
        "type": "checkout.session.completed",
        "data": {"object": {"id": "cs_1", "metadata": {"order_id": order_id.to_string()}}}
    });
    let payload = serde_json::to_vec(&payload).unwrap();
    let signature = stripe_signature(&payload, "whsec_other");

    let (status, _) = post_webhook(&router, &payload, &signature).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);

    // No state change on a rejected notification
    let order = order::find_by_id(&pool, order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(mock.confirm_calls.load(Ordering::SeqCst), 0);
}

// =============================================================================
// Catalog sync
// =============================================================================

#[tokio::test]
async fn catalog_sync_mirrors_products_and_skips_unpriced_variants() {
    let pool = test_pool().await;
    let mock = Arc::new(MockFulfillment::new());
    let sync = CatalogSyncService::new(pool.clone(), mock);

    let report = sync.sync_catalog().await.unwrap();
    assert_eq!(report.products_synced, 1);
    assert_eq!(report.variants_synced, 1);
    assert_eq!(report.variants_skipped, 1);

    let products = catalog::find_all(&pool).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].product.printful_id, 301);
    assert_eq!(products[0].variants.len(), 1);
    assert_eq!(products[0].variants[0].printful_variant_id, Some(4011));
    assert_eq!(products[0].variants[0].retail_price, 10.0);

    // Repeated sync converges instead of duplicating rows
    let report = sync.sync_catalog().await.unwrap();
    assert_eq!(report.products_synced, 1);
    let products = catalog::find_all(&pool).await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].variants.len(), 1);
}
