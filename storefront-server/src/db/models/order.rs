//! Order Models
//!
//! An order carries two independent lifecycle axes:
//!
//! - [`PaymentStatus`] — payment lifecycle (closed vocabulary)
//! - [`OrderStatus`] — fulfillment lifecycle (open vocabulary: unknown
//!   upstream statuses pass through as [`OrderStatus::Other`] instead of
//!   being coerced to a known value)
//!
//! The two vocabularies are deliberately separate types so that the payment
//! `pending` state can never be confused with a fulfillment state.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// =============================================================================
// Status vocabularies
// =============================================================================

/// Payment lifecycle. `pending → paid` happens exactly once; a failed
/// provider confirmation after the paid mark lands in `failed_confirmation`,
/// which is terminal for automation and requires manual reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    FailedConfirmation,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::FailedConfirmation => "failed_confirmation",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed_confirmation" => Some(PaymentStatus::FailedConfirmation),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fulfillment lifecycle. `Other` carries any upstream status the mapping
/// table does not know, unchanged, so new provider vocabulary stays visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderStatus {
    DraftCreated,
    SubmittedToProvider,
    Processing,
    Pickup,
    Transit,
    Completed,
    Cancelled,
    Failed,
    Other(String),
}

impl OrderStatus {
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::DraftCreated => "draft_created",
            OrderStatus::SubmittedToProvider => "submitted_to_provider",
            OrderStatus::Processing => "processing",
            OrderStatus::Pickup => "pickup",
            OrderStatus::Transit => "transit",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Failed => "failed",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s {
            "draft_created" => OrderStatus::DraftCreated,
            "submitted_to_provider" => OrderStatus::SubmittedToProvider,
            "processing" => OrderStatus::Processing,
            "pickup" => OrderStatus::Pickup,
            "transit" => OrderStatus::Transit,
            "completed" => OrderStatus::Completed,
            "cancelled" => OrderStatus::Cancelled,
            "failed" => OrderStatus::Failed,
            other => OrderStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for OrderStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OrderStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(OrderStatus::from(s.as_str()))
    }
}

// =============================================================================
// Entities
// =============================================================================

/// Recipient address snapshot. Stored as JSON on the order so the order
/// stays valid even if the user later changes their address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingRecipient {
    pub name: String,
    pub address1: String,
    pub city: String,
    pub zip: String,
    pub country_code: String,
}

/// Local order record — the unit of reconciliation. Never deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    /// External fulfillment draft-order id; None only for rows predating
    /// draft creation failures recovered by hand (checkout never persists
    /// an order without one)
    pub printful_order_id: Option<String>,
    /// External payment session id; None until payment is initiated
    pub stripe_session_id: Option<String>,
    pub shipping_recipient: ShippingRecipient,
    pub shipping_method: String,
    /// Provider-quoted total — authoritative, never a locally recomputed sum
    pub total_price: f64,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Order item — immutable purchase-time snapshot owned by exactly one order
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemDetail {
    pub id: i64,
    pub product_id: i64,
    pub variant_id: i64,
    pub variant_name: Option<String>,
    pub quantity: i64,
    /// Retail price at time of purchase, independent of later catalog changes
    pub retail_price: f64,
}

/// Order with its items attached (API shape)
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
}

/// Input for order item creation at checkout time
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub variant_id: i64,
    pub quantity: i64,
    pub retail_price: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_status_round_trips_known_values() {
        for s in [
            "draft_created",
            "submitted_to_provider",
            "processing",
            "pickup",
            "transit",
            "completed",
            "cancelled",
            "failed",
        ] {
            assert_eq!(OrderStatus::from(s).as_str(), s);
        }
    }

    #[test]
    fn order_status_preserves_unknown_values() {
        let status = OrderStatus::from("onhold");
        assert_eq!(status, OrderStatus::Other("onhold".to_string()));
        assert_eq!(status.as_str(), "onhold");
    }

    #[test]
    fn payment_status_rejects_unknown_values() {
        assert_eq!(PaymentStatus::parse("paid"), Some(PaymentStatus::Paid));
        assert_eq!(PaymentStatus::parse("bogus"), None);
    }
}
