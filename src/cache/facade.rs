//! Cache Facade Module
//!
//! Look-aside caching over the remote tier, organised into named groups that
//! each decide whether the local tier is used, how long local entries live,
//! how remote keys are prefixed and how long remote entries live.
//!
//! Local and remote writes are independent. A remote failure is returned to
//! the caller but never undoes a local write or delete already performed, so
//! the local tier can briefly run ahead of a failed remote write until the
//! entry's TTL lapses or it is overwritten.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::cache::{codec, validate_groups, CacheGroup, Clock, LocalStats, SystemClock, TtlStore};
use crate::error::{AppError, Result};
use crate::remote::RemoteStore;

// == Local Key ==
/// Key of a local-tier entry. Always the caller's unprefixed key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocalKey {
    Plain(String),
    Field(String, String),
}

impl LocalKey {
    /// The caller's key, for plain and field entries alike.
    pub fn key(&self) -> &str {
        match self {
            LocalKey::Plain(key) | LocalKey::Field(key, _) => key,
        }
    }
}

// == Cache Facade ==
/// Two-tier cache: per-group TTL store in front of a shared remote store.
pub struct CacheFacade {
    groups: HashMap<String, CacheGroup>,
    local: TtlStore<LocalKey, Value>,
    remote: Arc<dyn RemoteStore>,
}

impl CacheFacade {
    // == Constructor ==
    /// Builds the facade from validated group configuration.
    pub fn new(groups: Vec<CacheGroup>, remote: Arc<dyn RemoteStore>) -> Result<Self> {
        Self::with_clock(groups, remote, Arc::new(SystemClock))
    }

    /// Builds the facade with an explicit clock for the local tier.
    pub fn with_clock(
        groups: Vec<CacheGroup>,
        remote: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        validate_groups(&groups)?;

        let local = TtlStore::with_clock(
            groups.iter().map(|g| (g.name.clone(), g.local_ttl())),
            clock,
        );
        let groups = groups.into_iter().map(|g| (g.name.clone(), g)).collect();

        Ok(Self {
            groups,
            local,
            remote,
        })
    }

    /// Resolves a group name to its configuration.
    pub fn group(&self, name: &str) -> Result<&CacheGroup> {
        self.groups
            .get(name)
            .ok_or_else(|| AppError::ConfigMissing(name.to_string()))
    }

    /// Configured groups, sorted by name.
    pub fn groups(&self) -> Vec<&CacheGroup> {
        let mut groups: Vec<&CacheGroup> = self.groups.values().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    // == Get ==
    /// Reads `key` from `group`, filling the local tier on a remote hit.
    pub async fn get<T: DeserializeOwned>(&self, group: &str, key: &str) -> Result<Option<T>> {
        let config = self.group(group)?;
        let remote_key = config.remote_key(key);

        if !config.enabled {
            let bytes = self.remote.get(&remote_key).await?;
            return decode_typed(bytes.as_deref());
        }

        let local_key = LocalKey::Plain(key.to_string());
        if let Some(value) = self.local.get(group, &local_key) {
            debug!(group, key, "local tier hit");
            return codec::from_value(&value).map(Some);
        }

        let bytes = self.remote.get(&remote_key).await?;
        self.fill_local(group, local_key, bytes.as_deref())
    }

    // == Set ==
    /// Writes `value` to the local tier (if enabled) and to the remote tier.
    pub async fn set<T: Serialize + ?Sized>(&self, group: &str, key: &str, value: &T) -> Result<()> {
        let config = self.group(group)?;
        let encoded = codec::encode(value)?;

        if config.enabled {
            self.local
                .set(group, LocalKey::Plain(key.to_string()), encoded.value);
        }

        self.remote
            .set(&config.remote_key(key), encoded.bytes, config.remote_ttl())
            .await
    }

    // == Delete ==
    /// Deletes `key` locally (if enabled), then always remotely.
    ///
    /// The remote delete removes a hash at `key` as a whole, so every local
    /// field entry under `key` goes with the plain entry.
    pub async fn delete(&self, group: &str, key: &str) -> Result<()> {
        let config = self.group(group)?;

        if config.enabled {
            self.local
                .delete_where(group, |local_key| local_key.key() == key);
        }

        self.remote.delete(&config.remote_key(key)).await
    }

    // == Hash Get ==
    /// Reads `field` of the remote hash at `key`, with the same look-aside discipline.
    pub async fn hget<T: DeserializeOwned>(
        &self,
        group: &str,
        key: &str,
        field: &str,
    ) -> Result<Option<T>> {
        let config = self.group(group)?;
        let remote_key = config.remote_key(key);

        if !config.enabled {
            let bytes = self.remote.hget(&remote_key, field).await?;
            return decode_typed(bytes.as_deref());
        }

        let local_key = LocalKey::Field(key.to_string(), field.to_string());
        if let Some(value) = self.local.get(group, &local_key) {
            debug!(group, key, field, "local tier hit");
            return codec::from_value(&value).map(Some);
        }

        let bytes = self.remote.hget(&remote_key, field).await?;
        self.fill_local(group, local_key, bytes.as_deref())
    }

    // == Hash Set ==
    /// Writes `field` of the remote hash at `key`, and the local tier if enabled.
    ///
    /// Hash fields carry no remote expiration.
    pub async fn hset<T: Serialize + ?Sized>(
        &self,
        group: &str,
        key: &str,
        field: &str,
        value: &T,
    ) -> Result<()> {
        let config = self.group(group)?;
        let encoded = codec::encode(value)?;

        if config.enabled {
            self.local.set(
                group,
                LocalKey::Field(key.to_string(), field.to_string()),
                encoded.value,
            );
        }

        self.remote
            .hset(&config.remote_key(key), field, encoded.bytes)
            .await
    }

    // == Stats ==
    /// Local-tier activity for one group.
    pub fn local_stats(&self, group: &str) -> Result<LocalStats> {
        self.group(group)?;
        Ok(self.local.stats(group).unwrap_or_default())
    }

    /// Decodes a remote payload and, if present, stores it locally.
    ///
    /// The value is converted to `T` before the local write, so a payload the
    /// caller cannot decode never enters the local tier.
    fn fill_local<T: DeserializeOwned>(
        &self,
        group: &str,
        local_key: LocalKey,
        bytes: Option<&[u8]>,
    ) -> Result<Option<T>> {
        let Some(value) = bytes.map(codec::decode).transpose()?.flatten() else {
            debug!(group, "remote tier miss");
            return Ok(None);
        };

        let typed = codec::from_value(&value)?;
        self.local.set(group, local_key, value);
        Ok(Some(typed))
    }
}

fn decode_typed<T: DeserializeOwned>(bytes: Option<&[u8]>) -> Result<Option<T>> {
    match bytes.map(codec::decode).transpose()?.flatten() {
        Some(value) => codec::from_value(&value).map(Some),
        None => Ok(None),
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::remote::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn setup() -> (Arc<ManualClock>, Arc<MemoryStore>, CacheFacade) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let remote = Arc::new(MemoryStore::with_clock(clock.clone()));
        let groups = vec![
            CacheGroup::new("user", Duration::from_secs(1), Duration::from_secs(60))
                .with_prefix("app:"),
            CacheGroup::new("raw", Duration::from_secs(1), Duration::from_secs(60)).disabled(),
        ];
        let facade = CacheFacade::with_clock(groups, remote.clone(), clock.clone()).unwrap();
        (clock, remote, facade)
    }

    #[tokio::test]
    async fn test_duplicate_groups_rejected() {
        let remote = Arc::new(MemoryStore::new());
        let groups = vec![
            CacheGroup::new("user", Duration::from_secs(1), Duration::from_secs(1)),
            CacheGroup::new("user", Duration::from_secs(2), Duration::from_secs(2)),
        ];
        assert!(matches!(
            CacheFacade::new(groups, remote),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_hit_fills_local() {
        let (_, remote, facade) = setup();
        remote
            .set("app:7", br#"{"n":7}"#.to_vec(), Duration::ZERO)
            .await
            .unwrap();

        let first: Option<Value> = facade.get("user", "7").await.unwrap();
        let second: Option<Value> = facade.get("user", "7").await.unwrap();

        assert_eq!(first, Some(json!({"n": 7})));
        assert_eq!(second, first);
        assert_eq!(remote.op_counts().gets, 1, "second read served locally");
        assert_eq!(facade.local_stats("user").unwrap().entries, 1);
    }

    #[tokio::test]
    async fn test_remote_miss_does_not_fill() {
        let (_, remote, facade) = setup();

        let value: Option<Value> = facade.get("user", "nope").await.unwrap();
        assert!(value.is_none());
        assert_eq!(facade.local_stats("user").unwrap().entries, 0);
        assert_eq!(remote.op_counts().gets, 1);
    }

    #[tokio::test]
    async fn test_empty_remote_payload_is_not_found() {
        let (_, remote, facade) = setup();
        remote.set("app:e", Vec::new(), Duration::ZERO).await.unwrap();

        let value: Option<Value> = facade.get("user", "e").await.unwrap();
        assert!(value.is_none());
        assert_eq!(facade.local_stats("user").unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_undecodable_remote_payload_leaves_local_untouched() {
        let (_, remote, facade) = setup();
        remote
            .set("app:bad", b"{broken".to_vec(), Duration::ZERO)
            .await
            .unwrap();

        let result: Result<Option<Value>> = facade.get("user", "bad").await;
        assert!(matches!(result, Err(AppError::Encoding(_))));
        assert_eq!(facade.local_stats("user").unwrap().sets, 0);
    }

    #[tokio::test]
    async fn test_wrong_target_type_leaves_local_untouched() {
        let (_, remote, facade) = setup();
        remote
            .set("app:s", br#""text""#.to_vec(), Duration::ZERO)
            .await
            .unwrap();

        let result: Result<Option<u64>> = facade.get("user", "s").await;
        assert!(matches!(result, Err(AppError::Encoding(_))));
        assert_eq!(facade.local_stats("user").unwrap().entries, 0);
    }

    #[tokio::test]
    async fn test_delete_clears_both_tiers() {
        let (_, remote, facade) = setup();

        facade.set("user", "1", &json!("x")).await.unwrap();
        facade.delete("user", "1").await.unwrap();

        let value: Option<Value> = facade.get("user", "1").await.unwrap();
        assert!(value.is_none());
        assert!(!remote.contains_key("app:1"));
    }

    #[tokio::test]
    async fn test_hash_fields_round_trip() {
        let (_, remote, facade) = setup();

        facade.hset("user", "profile", "age", &12u8).await.unwrap();
        let age: Option<u8> = facade.hget("user", "profile", "age").await.unwrap();

        assert_eq!(age, Some(12));
        assert_eq!(remote.op_counts().hgets, 0, "served from local tier");
        assert_eq!(remote.peek_field("app:profile", "age"), Some(b"12".to_vec()));
    }

    #[tokio::test]
    async fn test_hash_field_fill_on_read() {
        let (_, remote, facade) = setup();
        remote.hset("app:profile", "name", br#""li""#.to_vec()).await.unwrap();

        let name: Option<String> = facade.hget("user", "profile", "name").await.unwrap();
        let again: Option<String> = facade.hget("user", "profile", "name").await.unwrap();

        assert_eq!(name.as_deref(), Some("li"));
        assert_eq!(again, name);
        assert_eq!(remote.op_counts().hgets, 1);
    }

    #[tokio::test]
    async fn test_delete_drops_local_hash_fields() {
        let (_, remote, facade) = setup();

        facade.hset("user", "profile", "age", &12u8).await.unwrap();
        facade.hset("user", "other", "age", &30u8).await.unwrap();
        facade.delete("user", "profile").await.unwrap();
        assert!(!remote.contains_key("app:profile"));

        let age: Option<u8> = facade.hget("user", "profile", "age").await.unwrap();
        assert!(age.is_none());
        assert_eq!(remote.op_counts().hgets, 1);

        let other: Option<u8> = facade.hget("user", "other", "age").await.unwrap();
        assert_eq!(other, Some(30));
        assert_eq!(remote.op_counts().hgets, 1, "unrelated key still local");
    }

    #[tokio::test]
    async fn test_hash_field_and_plain_key_do_not_collide() {
        let (_, _, facade) = setup();

        facade.hset("user", "k", "f", &json!("field")).await.unwrap();
        facade.set("user", "f", &json!("plain")).await.unwrap();

        let field: Option<String> = facade.hget("user", "k", "f").await.unwrap();
        let plain: Option<String> = facade.get("user", "f").await.unwrap();
        assert_eq!(field.as_deref(), Some("field"));
        assert_eq!(plain.as_deref(), Some("plain"));
    }

    #[tokio::test]
    async fn test_large_integer_precision_via_remote() {
        let (clock, _, facade) = setup();
        let big = json!({"id": 18_446_744_073_709_551_615u64, "neg": -9_223_372_036_854_775_807i64});

        facade.set("user", "big", &big).await.unwrap();
        clock.advance(Duration::from_secs(5));

        let back: Option<Value> = facade.get("user", "big").await.unwrap();
        assert_eq!(back, Some(big));
    }

    #[tokio::test]
    async fn test_groups_sorted() {
        let (_, _, facade) = setup();
        let names: Vec<&str> = facade.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["raw", "user"]);
    }
}
