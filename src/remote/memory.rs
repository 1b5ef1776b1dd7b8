//! In-Memory Remote Store
//!
//! Redis-like remote tier living in the process: plain keys with optional
//! expiry, hashes without expiry, and WRONGTYPE errors when the two are mixed.
//! Every trait call is counted so tests can assert exactly which remote
//! operations a cache path performed.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use super::RemoteStore;
use crate::cache::{duration_ms, Clock, SystemClock};
use crate::error::{AppError, Result};

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

// == Stored Value ==
#[derive(Debug, Clone)]
enum Stored {
    Plain {
        value: Vec<u8>,
        /// Expiration timestamp (Unix milliseconds), None = no expiration
        expires_at: Option<u64>,
    },
    Hash(HashMap<String, Vec<u8>>),
}

impl Stored {
    /// Boundary condition: a key is expired once now >= expires_at.
    fn is_expired(&self, now_ms: u64) -> bool {
        match self {
            Stored::Plain {
                expires_at: Some(expires),
                ..
            } => now_ms >= *expires,
            _ => false,
        }
    }
}

// == Operation Counters ==
/// Number of calls received per remote operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OpCounts {
    pub gets: u64,
    pub sets: u64,
    pub deletes: u64,
    pub hgets: u64,
    pub hsets: u64,
}

impl OpCounts {
    /// Total number of calls.
    pub fn total(&self) -> u64 {
        self.gets + self.sets + self.deletes + self.hgets + self.hsets
    }

    /// Calls that read.
    pub fn reads(&self) -> u64 {
        self.gets + self.hgets
    }

    /// Calls that wrote or deleted.
    pub fn writes(&self) -> u64 {
        self.sets + self.deletes + self.hsets
    }
}

#[derive(Debug, Default)]
struct OpCounters {
    gets: AtomicU64,
    sets: AtomicU64,
    deletes: AtomicU64,
    hgets: AtomicU64,
    hsets: AtomicU64,
}

// == Memory Store ==
/// Process-local remote tier.
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Stored>>,
    ops: OpCounters,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store on wall-clock time.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Creates an empty store driven by an explicit clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ops: OpCounters::default(),
            clock,
        }
    }

    // == Inspection ==
    /// Reads a plain key without counting it as an operation.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        let now = self.clock.now_ms();
        self.entries
            .read()
            .get(key)
            .filter(|stored| !stored.is_expired(now))
            .and_then(|stored| match stored {
                Stored::Plain { value, .. } => Some(value.clone()),
                Stored::Hash(_) => None,
            })
    }

    /// Reads a hash field without counting it as an operation.
    pub fn peek_field(&self, key: &str, field: &str) -> Option<Vec<u8>> {
        match self.entries.read().get(key) {
            Some(Stored::Hash(fields)) => fields.get(field).cloned(),
            _ => None,
        }
    }

    /// Whether `key` is present and unexpired, of either kind.
    pub fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now_ms();
        self.entries
            .read()
            .get(key)
            .is_some_and(|stored| !stored.is_expired(now))
    }

    /// Calls received so far.
    pub fn op_counts(&self) -> OpCounts {
        OpCounts {
            gets: self.ops.gets.load(Ordering::Relaxed),
            sets: self.ops.sets.load(Ordering::Relaxed),
            deletes: self.ops.deletes.load(Ordering::Relaxed),
            hgets: self.ops.hgets.load(Ordering::Relaxed),
            hsets: self.ops.hsets.load(Ordering::Relaxed),
        }
    }

    // == Length ==
    /// Number of stored keys, expired ones not yet swept included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    // == Cleanup Expired ==
    /// Removes all expired keys.
    ///
    /// Returns the number of keys removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, stored| !stored.is_expired(now));
        before - entries.len()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ops.gets.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_ms();

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|stored| stored.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }

        match entries.get(key) {
            Some(Stored::Plain { value, .. }) => Ok(Some(value.clone())),
            Some(Stored::Hash(_)) => Err(AppError::Remote(WRONG_TYPE.to_string())),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        self.ops.sets.fetch_add(1, Ordering::Relaxed);
        let expires_at =
            (!ttl.is_zero()).then(|| self.clock.now_ms().saturating_add(duration_ms(ttl)));

        self.entries
            .write()
            .insert(key.to_string(), Stored::Plain { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.ops.deletes.fetch_add(1, Ordering::Relaxed);
        self.entries.write().remove(key);
        Ok(())
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>> {
        self.ops.hgets.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_ms();

        match self.entries.read().get(key) {
            Some(Stored::Hash(fields)) => Ok(fields.get(field).cloned()),
            Some(stored) if stored.is_expired(now) => Ok(None),
            Some(Stored::Plain { .. }) => Err(AppError::Remote(WRONG_TYPE.to_string())),
            None => Ok(None),
        }
    }

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()> {
        self.ops.hsets.fetch_add(1, Ordering::Relaxed);
        let now = self.clock.now_ms();

        let mut entries = self.entries.write();
        if entries.get(key).is_some_and(|stored| stored.is_expired(now)) {
            entries.remove(key);
        }

        match entries
            .entry(key.to_string())
            .or_insert_with(|| Stored::Hash(HashMap::new()))
        {
            Stored::Hash(fields) => {
                fields.insert(field.to_string(), value);
                Ok(())
            }
            Stored::Plain { .. } => Err(AppError::Remote(WRONG_TYPE.to_string())),
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryStore) {
        let clock = Arc::new(ManualClock::new(10_000));
        let store = MemoryStore::with_clock(clock.clone());
        (clock, store)
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let (_, store) = store();

        store.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"v".to_vec()));
        assert_eq!(store.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_expiry() {
        let (clock, store) = store();

        store.set("k", b"v".to_vec(), Duration::from_secs(1)).await.unwrap();
        clock.advance(Duration::from_millis(999));
        assert!(store.get("k").await.unwrap().is_some());

        clock.advance(Duration::from_millis(1));
        assert!(store.get("k").await.unwrap().is_none());
        assert!(store.is_empty(), "expired key removed on read");
    }

    #[tokio::test]
    async fn test_zero_ttl_never_expires() {
        let (clock, store) = store();

        store.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        clock.advance(Duration::from_secs(86_400));
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hash_fields() {
        let (_, store) = store();

        store.hset("h", "a", b"1".to_vec()).await.unwrap();
        store.hset("h", "b", b"2".to_vec()).await.unwrap();

        assert_eq!(store.hget("h", "a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.hget("h", "c").await.unwrap(), None);
        assert_eq!(store.hget("nope", "a").await.unwrap(), None);
        assert_eq!(store.peek_field("h", "b"), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_wrong_type() {
        let (_, store) = store();

        store.set("plain", b"v".to_vec(), Duration::ZERO).await.unwrap();
        store.hset("hash", "f", b"v".to_vec()).await.unwrap();

        assert!(matches!(store.hget("plain", "f").await, Err(AppError::Remote(_))));
        assert!(matches!(store.hset("plain", "f", vec![]).await, Err(AppError::Remote(_))));
        assert!(matches!(store.get("hash").await, Err(AppError::Remote(_))));
    }

    #[tokio::test]
    async fn test_set_overwrites_hash() {
        let (_, store) = store();

        store.hset("k", "f", b"v".to_vec()).await.unwrap();
        store.set("k", b"plain".to_vec(), Duration::ZERO).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Some(b"plain".to_vec()));
    }

    #[tokio::test]
    async fn test_delete() {
        let (_, store) = store();

        store.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        store.delete("k").await.unwrap();
        store.delete("k").await.unwrap();
        assert!(!store.contains_key("k"));
    }

    #[tokio::test]
    async fn test_op_counts_exclude_peeks() {
        let (_, store) = store();

        store.set("k", b"v".to_vec(), Duration::ZERO).await.unwrap();
        store.get("k").await.unwrap();
        store.hset("h", "f", b"v".to_vec()).await.unwrap();
        store.hget("h", "f").await.unwrap();
        store.delete("k").await.unwrap();
        store.peek("k");
        store.peek_field("h", "f");

        let ops = store.op_counts();
        assert_eq!(
            ops,
            OpCounts {
                gets: 1,
                sets: 1,
                deletes: 1,
                hgets: 1,
                hsets: 1
            }
        );
        assert_eq!(ops.reads(), 2);
        assert_eq!(ops.writes(), 3);
        assert_eq!(ops.total(), 5);
    }

    #[tokio::test]
    async fn test_cleanup_expired() {
        let (clock, store) = store();

        store.set("short", b"v".to_vec(), Duration::from_secs(1)).await.unwrap();
        store.set("long", b"v".to_vec(), Duration::from_secs(10)).await.unwrap();
        store.hset("hash", "f", b"v".to_vec()).await.unwrap();

        clock.advance(Duration::from_secs(2));

        assert_eq!(store.cleanup_expired(), 1);
        assert_eq!(store.len(), 2);
        assert!(store.peek("long").is_some());
    }

    #[tokio::test]
    async fn test_huge_ttl_saturates_instead_of_overflowing() {
        let (clock, store) = store();

        store
            .set("forever", b"v".to_vec(), Duration::from_secs(u64::MAX / 1000))
            .await
            .unwrap();
        clock.advance(Duration::from_secs(10 * 365 * 24 * 3600));

        assert_eq!(store.get("forever").await.unwrap(), Some(b"v".to_vec()));
    }
}
