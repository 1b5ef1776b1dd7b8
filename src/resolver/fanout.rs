//! Bounded Fan-Out Resolver
//!
//! Resolves the storage references of a page of submissions into signed URLs,
//! one task per record, with at most `concurrency` records in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::UrlSigner;

/// Default number of records resolved at the same time.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Default validity of signed URLs: three days.
pub const DEFAULT_URL_TTL: Duration = Duration::from_secs(3 * 24 * 3600);

// == Submit Record ==
/// A submission with up to three storage references. Empty string = absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitRecord {
    pub id: i64,
    #[serde(default)]
    pub voice_url: String,
    #[serde(default)]
    pub screenshot_url: String,
    #[serde(default)]
    pub oplog_url: String,
}

impl SubmitRecord {
    /// References in fixed resolution order, paired with their field names.
    fn references(&self) -> [(&'static str, &str); 3] {
        [
            ("voice_url", self.voice_url.as_str()),
            ("screenshot_url", self.screenshot_url.as_str()),
            ("oplog_url", self.oplog_url.as_str()),
        ]
    }
}

// == Resolved Urls ==
/// Signed URLs for one record, in the same field order as [`SubmitRecord`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUrls {
    pub voice_url: Option<String>,
    pub screenshot_url: Option<String>,
    pub oplog_url: Option<String>,
}

impl ResolvedUrls {
    /// True if no field resolved.
    pub fn is_empty(&self) -> bool {
        self.voice_url.is_none() && self.screenshot_url.is_none() && self.oplog_url.is_none()
    }
}

impl From<[Option<String>; 3]> for ResolvedUrls {
    fn from([voice_url, screenshot_url, oplog_url]: [Option<String>; 3]) -> Self {
        Self {
            voice_url,
            screenshot_url,
            oplog_url,
        }
    }
}

// == Resolver Config ==
/// Tuning for [`FanOutResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Maximum records resolved at the same time
    pub concurrency: usize,
    /// Validity requested for each signed URL
    pub url_ttl: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            url_ttl: DEFAULT_URL_TTL,
        }
    }
}

// == Fan-Out Resolver ==
/// Stateless between calls; every `resolve_all` builds and returns a fresh map.
pub struct FanOutResolver {
    signer: Arc<dyn UrlSigner>,
    config: ResolverConfig,
}

impl FanOutResolver {
    /// Creates a resolver. A concurrency of 0 is raised to 1.
    pub fn new(signer: Arc<dyn UrlSigner>, mut config: ResolverConfig) -> Self {
        if config.concurrency == 0 {
            warn!("resolver concurrency of 0 raised to 1");
            config.concurrency = 1;
        }
        Self { signer, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    // == Resolve All ==
    /// Resolves every record and returns one entry per distinct record id.
    ///
    /// Failures are absorbed: a reference that cannot be signed becomes `None`
    /// and never affects other fields or records. Dropping the returned future
    /// aborts all in-flight work.
    pub async fn resolve_all(&self, records: &[SubmitRecord]) -> HashMap<i64, ResolvedUrls> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let results: Arc<Mutex<HashMap<i64, ResolvedUrls>>> =
            Arc::new(Mutex::new(HashMap::with_capacity(records.len())));
        let mut tasks = JoinSet::new();

        for record in records.iter().cloned() {
            let semaphore = Arc::clone(&semaphore);
            let results = Arc::clone(&results);
            let signer = Arc::clone(&self.signer);
            let url_ttl = self.config.url_ttl;

            tasks.spawn(async move {
                // Never closed; a failed acquire is covered by the completeness pass.
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };

                let urls = resolve_record(signer.as_ref(), &record, url_ttl).await;
                results.lock().insert(record.id, urls);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "url resolution task did not complete");
            }
        }

        let mut resolved = std::mem::take(&mut *results.lock());
        for record in records {
            resolved.entry(record.id).or_default();
        }

        debug!(records = records.len(), "Resolved record urls");
        resolved
    }
}

/// Resolves the three references of one record in order.
async fn resolve_record(
    signer: &dyn UrlSigner,
    record: &SubmitRecord,
    url_ttl: Duration,
) -> ResolvedUrls {
    let mut urls: [Option<String>; 3] = Default::default();

    for (slot, (field, reference)) in urls.iter_mut().zip(record.references()) {
        if reference.is_empty() {
            continue;
        }

        match signer.resolve_private_url(reference, url_ttl).await {
            Ok(url) => *slot = Some(url),
            Err(e) => warn!(record_id = record.id, field, error = %e, "private url resolution failed"),
        }
    }

    ResolvedUrls::from(urls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Echoes the reference back, counting calls.
    #[derive(Default)]
    struct EchoSigner {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UrlSigner for EchoSigner {
        async fn resolve_private_url(
            &self,
            reference: &str,
            valid_for: Duration,
        ) -> Result<String, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("https://cdn/{reference}?ttl={}", valid_for.as_secs()))
        }
    }

    fn record(id: i64, voice: &str, screenshot: &str, oplog: &str) -> SubmitRecord {
        SubmitRecord {
            id,
            voice_url: voice.into(),
            screenshot_url: screenshot.into(),
            oplog_url: oplog.into(),
        }
    }

    #[tokio::test]
    async fn test_resolves_all_fields() {
        let signer = Arc::new(EchoSigner::default());
        let resolver = FanOutResolver::new(signer.clone(), ResolverConfig::default());

        let result = resolver.resolve_all(&[record(1, "a", "b", "c")]).await;

        let urls = &result[&1];
        assert_eq!(urls.voice_url.as_deref(), Some("https://cdn/a?ttl=259200"));
        assert_eq!(urls.screenshot_url.as_deref(), Some("https://cdn/b?ttl=259200"));
        assert_eq!(urls.oplog_url.as_deref(), Some("https://cdn/c?ttl=259200"));
        assert_eq!(signer.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_empty_references_skip_signer() {
        let signer = Arc::new(EchoSigner::default());
        let resolver = FanOutResolver::new(signer.clone(), ResolverConfig::default());

        let result = resolver.resolve_all(&[record(7, "", "shot", "")]).await;

        let urls = &result[&7];
        assert!(urls.voice_url.is_none());
        assert!(urls.screenshot_url.is_some());
        assert!(urls.oplog_url.is_none());
        assert_eq!(signer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let resolver = FanOutResolver::new(Arc::new(EchoSigner::default()), ResolverConfig::default());
        assert!(resolver.resolve_all(&[]).await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_collapse() {
        let resolver = FanOutResolver::new(Arc::new(EchoSigner::default()), ResolverConfig::default());

        let result = resolver
            .resolve_all(&[record(1, "a", "", ""), record(1, "b", "", "")])
            .await;
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_zero_concurrency_raised() {
        let resolver = FanOutResolver::new(
            Arc::new(EchoSigner::default()),
            ResolverConfig {
                concurrency: 0,
                url_ttl: DEFAULT_URL_TTL,
            },
        );
        assert_eq!(resolver.config().concurrency, 1);
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let record: SubmitRecord = serde_json::from_str(r#"{"id": 3, "voice_url": "v"}"#).unwrap();
        assert_eq!(record, SubmitRecord { id: 3, voice_url: "v".into(), ..Default::default() });
    }
}
