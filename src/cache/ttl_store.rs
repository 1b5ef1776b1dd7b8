//! TTL Store Module
//!
//! Group-scoped, age-bounded in-process store: the local tier of the cache.
//! There is no capacity limit and no background eviction; stale entries stay
//! in memory until they are overwritten or deleted.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::cache::{duration_ms, Clock, LocalStats, StatCounters, SystemClock, TtlEntry};

// == Group Shard ==
/// One group's entries. Each shard carries its own lock, so groups never contend.
#[derive(Debug)]
struct GroupShard<K, V> {
    ttl_ms: u64,
    entries: RwLock<HashMap<K, TtlEntry<V>>>,
    stats: StatCounters,
}

// == TTL Store ==
/// Per-group key-value memory with lazy, read-time expiry.
///
/// The set of groups is fixed at construction; the outer map is never mutated
/// afterwards and so needs no lock of its own.
#[derive(Debug)]
pub struct TtlStore<K, V> {
    shards: HashMap<String, GroupShard<K, V>>,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlStore<K, V>
where
    K: Hash + Eq,
    V: Clone,
{
    // == Constructor ==
    /// Creates a store for the given `(group, ttl)` pairs using wall-clock time.
    pub fn new<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        Self::with_clock(groups, Arc::new(SystemClock))
    }

    /// Creates a store driven by an explicit clock.
    pub fn with_clock<I, S>(groups: I, clock: Arc<dyn Clock>) -> Self
    where
        I: IntoIterator<Item = (S, Duration)>,
        S: Into<String>,
    {
        let shards = groups
            .into_iter()
            .map(|(name, ttl)| {
                let shard = GroupShard {
                    ttl_ms: duration_ms(ttl),
                    entries: RwLock::new(HashMap::new()),
                    stats: StatCounters::new(),
                };
                (name.into(), shard)
            })
            .collect();

        Self { shards, clock }
    }

    // == Get ==
    /// Returns the value under `group`/`key` if present and still fresh.
    ///
    /// A stale entry reads as absent but is left in place. Unknown groups read
    /// as absent too; deciding whether that is an error belongs to the caller.
    pub fn get<Q>(&self, group: &str, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let shard = self.shards.get(group)?;
        let now = self.clock.now_ms();

        let found = shard
            .entries
            .read()
            .get(key)
            .filter(|entry| entry.is_fresh(now, shard.ttl_ms))
            .map(|entry| entry.value().clone());

        match found {
            Some(_) => shard.stats.record_hit(),
            None => shard.stats.record_miss(),
        }
        found
    }

    // == Set ==
    /// Stores `value`, replacing any previous entry and stamping a new insertion time.
    ///
    /// Returns `false` (and stores nothing) if the group is unknown.
    pub fn set(&self, group: &str, key: K, value: V) -> bool {
        let Some(shard) = self.shards.get(group) else {
            return false;
        };

        let entry = TtlEntry::new(value, self.clock.now_ms());
        shard.entries.write().insert(key, entry);
        shard.stats.record_set();
        true
    }

    // == Delete ==
    /// Removes the entry if present. Returns whether something was removed.
    pub fn delete<Q>(&self, group: &str, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(shard) = self.shards.get(group) else {
            return false;
        };

        shard.stats.record_delete();
        shard.entries.write().remove(key).is_some()
    }

    /// Removes every entry of `group` whose key matches `pred`.
    ///
    /// Counts as a single delete. Returns the number of entries removed.
    pub fn delete_where<F>(&self, group: &str, mut pred: F) -> usize
    where
        F: FnMut(&K) -> bool,
    {
        let Some(shard) = self.shards.get(group) else {
            return 0;
        };

        shard.stats.record_delete();
        let mut entries = shard.entries.write();
        let before = entries.len();
        entries.retain(|key, _| !pred(key));
        before - entries.len()
    }

    // == Length ==
    /// Number of entries held for `group`, stale ones included.
    pub fn len(&self, group: &str) -> usize {
        self.shards
            .get(group)
            .map(|shard| shard.entries.read().len())
            .unwrap_or(0)
    }

    /// True if `group` holds no entries (or is unknown).
    pub fn is_empty(&self, group: &str) -> bool {
        self.len(group) == 0
    }

    // == Stats ==
    /// Activity snapshot for one group.
    pub fn stats(&self, group: &str) -> Option<LocalStats> {
        self.shards
            .get(group)
            .map(|shard| shard.stats.snapshot(shard.entries.read().len()))
    }
}
