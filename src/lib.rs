//! keti3 cache - grouped two-tier caching and signed URL resolution
//!
//! An in-process TTL tier in front of Redis, organised into named cache
//! groups, plus a bounded fan-out resolver that turns stored references into
//! signed URLs.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod resolver;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheFacade, CacheGroup};
pub use config::Config;
pub use error::{AppError, ResolveError};
pub use remote::{MemoryStore, RedisStore, RemoteStore};
pub use resolver::{FanOutResolver, HttpUrlSigner, UrlSigner};
pub use tasks::spawn_cleanup_task;
