//! Request DTOs for the cache service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::MAX_KEY_LENGTH;
use crate::resolver::SubmitRecord;

/// Maximum records accepted by one resolve call
pub const MAX_RESOLVE_BATCH: usize = 500;

/// Request body for PUT /cache/:group/:key and PUT /cache/:group/:key/:field
///
/// # Fields
/// - `value`: Any JSON value to cache
#[derive(Debug, Clone, Deserialize)]
pub struct SetValueRequest {
    pub value: Value,
}

/// Request body for POST /urls/resolve
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub records: Vec<SubmitRecord>,
}

impl ResolveRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.records.len() > MAX_RESOLVE_BATCH {
            return Some(format!(
                "At most {} records can be resolved per request",
                MAX_RESOLVE_BATCH
            ));
        }
        None
    }
}

/// Validates a key or field taken from the request path.
///
/// Returns an error message if validation fails, None if valid.
pub fn validate_key(kind: &str, key: &str) -> Option<String> {
    if key.is_empty() {
        return Some(format!("{kind} cannot be empty"));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "{kind} exceeds maximum length of {MAX_KEY_LENGTH} bytes"
        ));
    }
    None
}
