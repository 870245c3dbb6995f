//! Unified Result Types

use crate::utils::AppError;

/// Application-level Result type
///
/// Used in HTTP handlers, services and the reconciliation engine.
pub type AppResult<T> = Result<T, AppError>;
