//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::fs;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::cache::{parse_groups, CacheGroup};
use crate::error::{AppError, Result};
use crate::resolver::{ResolverConfig, SignerConfig, DEFAULT_CONCURRENCY, DEFAULT_URL_TTL};

/// Service configuration parameters.
///
/// Scalar values come from environment variables with defaults; cache groups
/// come from a JSON array, inline or in a file.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Interval in seconds between sweeps of the in-memory remote tier
    pub cleanup_interval: u64,
    /// Redis connection URL; None selects the in-memory remote tier
    pub redis_url: Option<String>,
    /// Cache groups, validated
    pub cache_groups: Vec<CacheGroup>,
    /// URL signing service; None disables URL resolution
    pub signer: Option<SignerConfig>,
    /// Fan-out resolver tuning
    pub resolver: ResolverConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - In-memory remote sweep frequency in seconds (default: 1)
    /// - `REDIS_URL` - Redis URL (default: unset, in-memory remote tier)
    /// - `CACHE_GROUPS` - Inline JSON array of cache groups
    /// - `CACHE_GROUPS_FILE` - Path to a JSON array of cache groups, read when `CACHE_GROUPS` is unset
    /// - `SIGNER_HOST` - Signing service base URL (default: unset, resolution disabled)
    /// - `SIGNER_APP_ID` - App id for signing requests (default: xkedj1010)
    /// - `SIGNER_TIMEOUT_SECS` - Deadline per signing call (default: 5)
    /// - `SIGNER_RETRIES` - Attempts on transport failure (default: 3)
    /// - `RESOLVE_CONCURRENCY` - Records resolved at once (default: 5)
    /// - `URL_TTL_SECS` - Validity of signed URLs (default: 259200)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let signer_defaults = SignerConfig::default();

        let signer = non_empty_var("SIGNER_HOST").map(|host| SignerConfig {
            host,
            app_id: non_empty_var("SIGNER_APP_ID").unwrap_or(signer_defaults.app_id),
            timeout_secs: parse_var("SIGNER_TIMEOUT_SECS", signer_defaults.timeout_secs),
            retries: parse_var("SIGNER_RETRIES", signer_defaults.retries),
        });

        Ok(Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL", defaults.cleanup_interval),
            redis_url: non_empty_var("REDIS_URL"),
            cache_groups: load_cache_groups()?,
            signer,
            resolver: ResolverConfig {
                concurrency: parse_var("RESOLVE_CONCURRENCY", DEFAULT_CONCURRENCY),
                url_ttl: Duration::from_secs(parse_var("URL_TTL_SECS", DEFAULT_URL_TTL.as_secs())),
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cleanup_interval: 1,
            redis_url: None,
            cache_groups: Vec::new(),
            signer: None,
            resolver: ResolverConfig::default(),
        }
    }
}

fn load_cache_groups() -> Result<Vec<CacheGroup>> {
    if let Some(inline) = non_empty_var("CACHE_GROUPS") {
        return parse_groups(&inline);
    }

    match non_empty_var("CACHE_GROUPS_FILE") {
        Some(path) => {
            let json = fs::read_to_string(&path)
                .map_err(|e| AppError::Config(format!("cannot read {path}: {e}")))?;
            parse_groups(&json)
        }
        None => Ok(Vec::new()),
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses `name`, falling back to `default` when unset or malformed.
fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    let Ok(raw) = env::var(name) else {
        return default;
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                var = name,
                value = %raw,
                "ignoring malformed environment variable, using default"
            );
            default
        }
    }
}
