//! Page assembly and the write paths behind the HTTP handlers.
//!
//! Each function takes the [`Store`](crate::store::Store) as a trait object
//! and returns a payload from [`types`] or an [`AppError`].

pub mod accounts;
pub mod catalog;
pub mod profile;
pub mod reviews;
pub mod types;

use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// Serializes a page payload for use as a validation error context.
fn context(page: &impl Serialize) -> Result<Value, AppError> {
    serde_json::to_value(page).map_err(|e| AppError::Internal(e.into()))
}
