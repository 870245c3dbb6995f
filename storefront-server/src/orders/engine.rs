//! Order Reconciliation Engine
//!
//! Orchestrates checkout, payment confirmation and fulfillment-status sync.
//! Payment capture and fulfillment confirmation are two systems of record
//! that cannot be committed atomically; the ordering here always favors not
//! losing a recorded payment event over keeping the systems in lockstep, and
//! models divergence as the explicit `failed_confirmation` state instead of
//! rolling back.

use std::sync::Arc;

use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{error, info, warn};
use validator::Validate;

use crate::auth::CurrentUser;
use crate::db::models::{NewOrderItem, Order, OrderStatus, PaymentStatus, ShippingRecipient};
use crate::db::repository::{cart, order};
use crate::gateway::{DraftOrderItem, FulfillmentGateway, OrderCosts};
use crate::orders::status_map::map_provider_status;
use crate::utils::{AppError, AppResult};

/// Checkout request body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "address1 is required"))]
    pub address1: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "zip is required"))]
    pub zip: String,
    /// ISO 3166-1 alpha-2
    #[validate(length(equal = 2, message = "country_code must be 2 characters"))]
    pub country_code: String,
    #[validate(length(min = 1, message = "shipping_method is required"))]
    pub shipping_method: String,
}

/// Result of a successful checkout
#[derive(Debug, Clone)]
pub struct CheckoutOutcome {
    pub order: Order,
    /// Provider cost breakdown, echoed back to the client
    pub costs: OrderCosts,
}

/// Result of a fulfillment status sync
#[derive(Debug, Clone)]
pub struct StatusSyncOutcome {
    pub order: Order,
    /// Raw provider status the local status was derived from
    pub provider_status: String,
}

/// The reconciliation core. Cheap to clone; handlers hold it via
/// [`crate::core::ServerState`].
#[derive(Clone)]
pub struct ReconciliationEngine {
    pool: SqlitePool,
    fulfillment: Arc<dyn FulfillmentGateway>,
}

impl ReconciliationEngine {
    pub fn new(pool: SqlitePool, fulfillment: Arc<dyn FulfillmentGateway>) -> Self {
        Self { pool, fulfillment }
    }

    /// Checkout: build a provider-side draft order from the user's cart,
    /// then persist the local order.
    ///
    /// The provider call comes first; if it fails (or returns no order id)
    /// no local state is written at all. On success the order row, its item
    /// snapshots and the cart clear commit in one transaction, so the cart
    /// survives any partial write. Concurrent checkouts by the same user are
    /// not deduplicated; each produces its own provider draft.
    pub async fn checkout(
        &self,
        user: &CurrentUser,
        request: &CheckoutRequest,
    ) -> AppResult<CheckoutOutcome> {
        let cart_items = cart::list_for_user(&self.pool, user.id).await?;
        if cart_items.is_empty() {
            warn!(user_id = user.id, "Checkout with empty cart");
            return Err(AppError::validation("Cart is empty"));
        }

        // Cart lines without a provider variant id cannot be fulfilled;
        // drop them with a warning rather than failing the whole checkout.
        let mut draft_items = Vec::with_capacity(cart_items.len());
        let mut snapshots = Vec::with_capacity(cart_items.len());
        for line in &cart_items {
            match line.printful_variant_id {
                Some(external_id) => {
                    draft_items.push(DraftOrderItem {
                        sync_variant_id: external_id,
                        quantity: line.quantity,
                    });
                    snapshots.push(NewOrderItem {
                        product_id: line.product_id,
                        variant_id: line.variant_id,
                        quantity: line.quantity,
                        retail_price: line.retail_price,
                    });
                }
                None => {
                    warn!(
                        user_id = user.id,
                        cart_item_id = line.id,
                        variant_id = line.variant_id,
                        "Cart line has no provider variant id, dropped from checkout"
                    );
                }
            }
        }

        if draft_items.is_empty() {
            warn!(
                user_id = user.id,
                cart_item_count = cart_items.len(),
                "Checkout failed: no cart line resolves to a provider variant"
            );
            return Err(AppError::empty_checkout(
                "No item in the cart can be submitted to the fulfillment provider",
            ));
        }

        let recipient = ShippingRecipient {
            name: user.name.clone(),
            address1: request.address1.clone(),
            city: request.city.clone(),
            zip: request.zip.clone(),
            country_code: request.country_code.clone(),
        };

        let draft = self
            .fulfillment
            .create_draft_order(&recipient, &draft_items, &request.shipping_method)
            .await
            .inspect_err(|e| {
                error!(user_id = user.id, error = %e, "Provider draft order creation failed");
            })?;

        // total_price is the provider's quote; taxes and markups make a
        // locally recomputed sum wrong.
        let order = order::create_with_items(
            &self.pool,
            user.id,
            &draft.provider_order_id,
            &recipient,
            &request.shipping_method,
            draft.costs.total,
            &snapshots,
        )
        .await?;

        info!(
            user_id = user.id,
            order_id = order.id,
            printful_order_id = %draft.provider_order_id,
            total_price = order.total_price,
            "Checkout successful, draft order created"
        );

        Ok(CheckoutOutcome {
            order,
            costs: draft.costs,
        })
    }

    /// Confirm payment for an order and submit the provider draft for
    /// production.
    ///
    /// The local `paid` mark is committed *before* the provider call: the
    /// money has already moved, and a lost payment record is worse than a
    /// divergent fulfillment state. The `pending → paid` transition is a
    /// conditional UPDATE, so duplicate notifications (webhook redelivery,
    /// concurrent calls) get `AlreadyProcessed` instead of double effects.
    pub async fn confirm_payment(&self, order_id: i64) -> AppResult<Order> {
        let existing = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;

        if !order::mark_paid_if_pending(&self.pool, order_id).await? {
            warn!(
                order_id,
                payment_status = %existing.payment_status,
                "Payment confirmation rejected: order already processed"
            );
            return Err(AppError::already_processed(format!(
                "Order {} is already paid or submitted",
                order_id
            )));
        }
        info!(order_id, user_id = existing.user_id, "Payment recorded as paid");

        let Some(provider_order_id) = existing.printful_order_id.clone() else {
            error!(
                order_id,
                "Payment confirmed but order has no provider draft order id"
            );
            return Err(AppError::missing_fulfillment_reference(format!(
                "Order {} has no fulfillment draft order to confirm",
                order_id
            )));
        };

        match self.fulfillment.confirm_order(&provider_order_id).await {
            Ok(confirmed) => {
                order::set_status(&self.pool, order_id, &OrderStatus::SubmittedToProvider).await?;
                info!(
                    order_id,
                    printful_order_id = %confirmed.provider_order_id,
                    provider_status = %confirmed.status,
                    "Provider draft order confirmed"
                );
            }
            Err(e) => {
                // Do not roll back the paid mark: record the divergence and
                // leave it for manual reconciliation.
                error!(
                    order_id,
                    printful_order_id = %provider_order_id,
                    error = %e,
                    "Provider confirmation failed after payment, marking failed_confirmation"
                );
                order::set_payment_status(&self.pool, order_id, PaymentStatus::FailedConfirmation)
                    .await?;
                return Err(e);
            }
        }

        order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::database(format!("Order {} vanished during confirmation", order_id)))
    }

    /// Refresh the local fulfillment status from the provider.
    ///
    /// Pure refresh: no payment side effects, safe to call repeatedly.
    pub async fn sync_fulfillment_status(&self, order_id: i64) -> AppResult<StatusSyncOutcome> {
        let existing = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;

        let Some(provider_order_id) = existing.printful_order_id.clone() else {
            return Err(AppError::missing_fulfillment_reference(format!(
                "Order {} has no fulfillment order to sync",
                order_id
            )));
        };

        let provider_status = self
            .fulfillment
            .get_order_status(&provider_order_id)
            .await
            .inspect_err(|e| {
                error!(
                    order_id,
                    printful_order_id = %provider_order_id,
                    error = %e,
                    "Fulfillment status fetch failed"
                );
            })?;

        let mapped = map_provider_status(&provider_status);
        if mapped != existing.status {
            order::set_status(&self.pool, order_id, &mapped).await?;
            info!(
                order_id,
                printful_order_id = %provider_order_id,
                provider_status = %provider_status,
                status = %mapped,
                "Fulfillment status synced"
            );
        }

        let order = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or_else(|| AppError::database(format!("Order {} vanished during sync", order_id)))?;

        Ok(StatusSyncOutcome {
            order,
            provider_status,
        })
    }
}
