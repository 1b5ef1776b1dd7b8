//! Remote Tier Module
//!
//! The key-value store behind the local tier. Production uses Redis; the
//! in-process [`MemoryStore`] stands in for local development and tests.

mod memory;
mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use self::memory::{MemoryStore, OpCounts};
pub use self::redis_store::RedisStore;

// == Remote Store Trait ==
/// Byte-level contract of the remote tier.
///
/// A missing key or field is `Ok(None)`, never an error.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes `value`; a zero `ttl` stores it without expiration.
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<Vec<u8>>>;

    async fn hset(&self, key: &str, field: &str, value: Vec<u8>) -> Result<()>;
}
