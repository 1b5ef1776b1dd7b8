//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::cache::LocalStats;
use crate::resolver::ResolvedUrls;

/// Response body for GET /cache/:group/:key and GET /cache/:group/:key/:field
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub group: String,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub value: Value,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(group: impl Into<String>, key: impl Into<String>, value: Value) -> Self {
        Self {
            group: group.into(),
            key: key.into(),
            field: None,
            value,
        }
    }

    /// Marks the response as a hash-field read.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Response body for PUT /cache/:group/:key
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(group: &str, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set in group '{}'", key, group),
            key,
        }
    }
}

/// Response body for DELETE /cache/:group/:key
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(group: &str, key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted from group '{}'", key, group),
            key,
        }
    }
}

/// Local-tier statistics of one group
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub group: String,
    pub enabled: bool,
    #[serde(flatten)]
    pub stats: LocalStats,
    pub hit_rate: f64,
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub groups: Vec<GroupStats>,
}

/// Response body for POST /urls/resolve
#[derive(Debug, Clone, Serialize)]
pub struct ResolveResponse {
    pub urls: HashMap<i64, ResolvedUrls>,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_response_omits_field_for_plain_keys() {
        let json = serde_json::to_value(GetResponse::new("user", "42", json!(1))).unwrap();
        assert_eq!(json, json!({"group": "user", "key": "42", "value": 1}));
    }

    #[test]
    fn test_get_response_with_field() {
        let resp = GetResponse::new("user", "42", json!("x")).with_field("name");
        let json = serde_json::to_value(resp).unwrap();
        assert_eq!(json["field"], "name");
    }

    #[test]
    fn test_set_response_message() {
        let resp = SetResponse::new("user", "my_key");
        assert_eq!(resp.message, "Key 'my_key' set in group 'user'");
    }

    #[test]
    fn test_group_stats_flattened() {
        let stats = GroupStats {
            group: "user".into(),
            enabled: true,
            stats: LocalStats {
                hits: 3,
                misses: 1,
                ..Default::default()
            },
            hit_rate: 0.75,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["hits"], 3);
        assert_eq!(json["misses"], 1);
        assert_eq!(json["hit_rate"], 0.75);
    }

    #[test]
    fn test_resolve_response_keys_are_strings() {
        let mut urls = HashMap::new();
        urls.insert(5, ResolvedUrls::default());
        let json = serde_json::to_value(ResolveResponse { urls }).unwrap();
        assert!(json["urls"]["5"].is_object());
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("error"));
        assert!(json.contains("Something went wrong"));
    }
}
