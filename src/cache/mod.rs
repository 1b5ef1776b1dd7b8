//! Cache Module
//!
//! Two-tier group cache: an in-process TTL store in front of a remote
//! key-value store, with JSON encoding at the remote boundary.

mod clock;
mod codec;
mod entry;
mod facade;
mod group;
mod stats;
mod ttl_store;


// Re-export public types
pub use clock::{current_timestamp_ms, duration_ms, Clock, ManualClock, SystemClock};
pub use codec::{decode, encode, from_value, Encoded};
pub use entry::TtlEntry;
pub use facade::{CacheFacade, LocalKey};
pub use group::{parse_groups, validate_groups, CacheGroup};
pub use stats::{LocalStats, StatCounters};
pub use ttl_store::TtlStore;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed encoded value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
