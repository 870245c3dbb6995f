//! Repository Module
//!
//! Data access as free functions per resource, each taking `&SqlitePool`.
//! All money-bearing order mutations live in [`order`]; the conditional
//! payment transition there is the sole concurrency-safety mechanism for
//! duplicate payment confirmations.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod user;
