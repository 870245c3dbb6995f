//! Application Services

pub mod catalog_sync;

pub use catalog_sync::{CatalogSyncService, SyncReport};
