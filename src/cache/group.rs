//! Cache Group Module
//!
//! Per-group cache configuration, loaded once at startup and read-only afterwards.

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::duration_ms;
use crate::error::{AppError, Result};

// == Cache Group ==
/// Configuration of one named cache partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GroupDef")]
pub struct CacheGroup {
    /// Unique group name (e.g. "user", "session")
    pub name: String,
    /// When false, every operation goes straight to the remote tier
    pub enabled: bool,
    /// Maximum age of a local entry, in milliseconds
    pub local_ttl_ms: u64,
    /// Prepended to every key before it reaches the remote tier
    pub key_prefix: String,
    /// Expiration set on remote writes, in milliseconds; 0 means no expiration
    pub remote_ttl_ms: u64,
}

/// Group as written in configuration. The remote TTL may be given in
/// milliseconds or seconds; milliseconds win when both are present.
#[derive(Debug, Deserialize)]
struct GroupDef {
    name: String,
    #[serde(default = "default_enabled")]
    enabled: bool,
    local_ttl_ms: u64,
    #[serde(default)]
    key_prefix: String,
    #[serde(default)]
    remote_ttl_ms: Option<u64>,
    #[serde(default)]
    remote_ttl_secs: Option<u64>,
}

fn default_enabled() -> bool {
    true
}

impl From<GroupDef> for CacheGroup {
    fn from(def: GroupDef) -> Self {
        let remote_ttl_ms = def
            .remote_ttl_ms
            .or_else(|| def.remote_ttl_secs.map(|secs| secs.saturating_mul(1_000)))
            .unwrap_or(0);

        Self {
            name: def.name,
            enabled: def.enabled,
            local_ttl_ms: def.local_ttl_ms,
            key_prefix: def.key_prefix,
            remote_ttl_ms,
        }
    }
}

impl CacheGroup {
    /// Creates an enabled group without a key prefix.
    pub fn new(name: impl Into<String>, local_ttl: Duration, remote_ttl: Duration) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            local_ttl_ms: duration_ms(local_ttl),
            key_prefix: String::new(),
            remote_ttl_ms: duration_ms(remote_ttl),
        }
    }

    /// Sets the remote key prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Turns the local tier off for this group.
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn local_ttl(&self) -> Duration {
        Duration::from_millis(self.local_ttl_ms)
    }

    pub fn remote_ttl(&self) -> Duration {
        Duration::from_millis(self.remote_ttl_ms)
    }

    /// Key under which `key` is stored on the remote tier.
    pub fn remote_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

// == Validation ==
/// Rejects empty and duplicate group names.
pub fn validate_groups(groups: &[CacheGroup]) -> Result<()> {
    let mut seen = HashSet::with_capacity(groups.len());
    for group in groups {
        if group.name.trim().is_empty() {
            return Err(AppError::Config("cache group name cannot be empty".to_string()));
        }
        if !seen.insert(group.name.as_str()) {
            return Err(AppError::Config(format!(
                "cache group '{}' is configured more than once",
                group.name
            )));
        }
    }
    Ok(())
}

/// Parses a JSON array of groups and validates it.
pub fn parse_groups(json: &str) -> Result<Vec<CacheGroup>> {
    let groups: Vec<CacheGroup> = serde_json::from_str(json)
        .map_err(|e| AppError::Config(format!("invalid cache group list: {e}")))?;
    validate_groups(&groups)?;
    Ok(groups)
}
