//! TTL Entry Module
//!
//! Defines a single local-tier entry: a value plus the moment it was inserted.

// == TTL Entry ==
/// A value held by the local tier.
///
/// `inserted_at` is set once at construction. Replacing a value means building a
/// new entry, never touching the timestamp of an existing one.
#[derive(Debug, Clone)]
pub struct TtlEntry<V> {
    value: V,
    inserted_at: u64,
}

impl<V> TtlEntry<V> {
    // == Constructor ==
    /// Creates an entry stamped with `inserted_at` (Unix milliseconds).
    pub fn new(value: V, inserted_at: u64) -> Self {
        Self { value, inserted_at }
    }

    /// The stored value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Insertion timestamp in Unix milliseconds.
    pub fn inserted_at(&self) -> u64 {
        self.inserted_at
    }

    /// Milliseconds since insertion. A clock that went backwards reads as 0.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.inserted_at)
    }

    // == Freshness ==
    /// Checks whether the entry is still visible under `ttl_ms`.
    ///
    /// Boundary condition: an entry whose age equals the TTL is still fresh;
    /// it goes stale only once the age strictly exceeds the TTL.
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) <= ttl_ms
    }
}
