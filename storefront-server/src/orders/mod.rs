//! Order Reconciliation Module
//!
//! The core of the system: moves an order through
//! draft → payment-pending → paid → submitted-to-provider →
//! fulfillment-status-synced, across three independently failing systems of
//! record (local database, payment processor, fulfillment provider).

pub mod engine;
pub mod status_map;

pub use engine::{CheckoutOutcome, CheckoutRequest, ReconciliationEngine, StatusSyncOutcome};
pub use status_map::map_provider_status;
