//! Provider Status Mapping
//!
//! Fixed lookup table from the fulfillment provider's status vocabulary to
//! the local one. A provider status not present in the table passes through
//! unchanged (as [`OrderStatus::Other`]) so new upstream vocabulary is
//! visible instead of silently dropped.

use crate::db::models::OrderStatus;

/// Map a provider status string to the local fulfillment status
pub fn map_provider_status(provider_status: &str) -> OrderStatus {
    match provider_status {
        "draft" => OrderStatus::DraftCreated,
        "pending" => OrderStatus::Processing,
        "inprocess" => OrderStatus::Pickup,
        "fulfilled" => OrderStatus::Transit,
        "shipped" => OrderStatus::Completed,
        "cancelled" => OrderStatus::Cancelled,
        "failed" => OrderStatus::Failed,
        other => OrderStatus::Other(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_the_known_vocabulary() {
        assert_eq!(map_provider_status("draft"), OrderStatus::DraftCreated);
        assert_eq!(map_provider_status("pending"), OrderStatus::Processing);
        assert_eq!(map_provider_status("inprocess"), OrderStatus::Pickup);
        assert_eq!(map_provider_status("fulfilled"), OrderStatus::Transit);
        assert_eq!(map_provider_status("shipped"), OrderStatus::Completed);
        assert_eq!(map_provider_status("cancelled"), OrderStatus::Cancelled);
        assert_eq!(map_provider_status("failed"), OrderStatus::Failed);
    }

    #[test]
    fn unknown_statuses_pass_through_unchanged() {
        assert_eq!(
            map_provider_status("onhold"),
            OrderStatus::Other("onhold".to_string())
        );
        assert_eq!(map_provider_status("onhold").as_str(), "onhold");
    }
}
