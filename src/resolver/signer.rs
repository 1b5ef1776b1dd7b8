//! URL Signing Client
//!
//! Turns an opaque object-storage reference into a short-lived public URL by
//! calling the video service's private-URL endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{AppError, ResolveError};

/// Path of the private-URL endpoint on the signing host.
pub const PRIVATE_URL_PATH: &str = "/video-service/api/v1/oss/secret/getUrl";

/// Pause between attempts after a transport failure.
const RETRY_BACKOFF: Duration = Duration::from_millis(50);

// == Url Signer Trait ==
/// Contract of the URL signing service.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    /// Returns a URL for `reference` that stays valid for `valid_for`.
    async fn resolve_private_url(
        &self,
        reference: &str,
        valid_for: Duration,
    ) -> Result<String, ResolveError>;
}

// == Signer Config ==
/// Connection settings for [`HttpUrlSigner`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerConfig {
    /// Base URL of the signing service, e.g. `http://video.internal`
    pub host: String,
    /// Application id sent with every request
    pub app_id: String,
    /// Deadline for one call, all attempts included
    pub timeout_secs: u64,
    /// Maximum attempts on transport failure (at least one is always made)
    pub retries: u32,
}

impl SignerConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            app_id: "xkedj1010".to_string(),
            timeout_secs: 5,
            retries: 3,
        }
    }
}

// == Wire Types ==
#[derive(Debug, Serialize)]
struct PrivateUrlRequest<'a> {
    url: &'a str,
    duration: u64,
    app_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct PrivateUrlResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    data: Option<PrivateUrlData>,
}

#[derive(Debug, Deserialize)]
struct PrivateUrlData {
    url: String,
}

// == Http Url Signer ==
/// [`UrlSigner`] backed by the video service over HTTP.
#[derive(Debug, Clone)]
pub struct HttpUrlSigner {
    config: SignerConfig,
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpUrlSigner {
    /// Creates a signer for the given config.
    pub fn new(config: SignerConfig) -> Result<Self, AppError> {
        if config.host.trim().is_empty() {
            return Err(AppError::Config("signing service host is empty".to_string()));
        }

        let http_client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;
        let endpoint = format!("{}{}", config.host.trim_end_matches('/'), PRIVATE_URL_PATH);

        Ok(Self {
            config,
            endpoint,
            http_client,
        })
    }

    /// Sends the request, retrying transport failures only.
    async fn send_with_retry(
        &self,
        body: &PrivateUrlRequest<'_>,
    ) -> Result<reqwest::Response, ResolveError> {
        let max_attempts = self.config.retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.http_client.post(&self.endpoint).json(body).send().await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < max_attempts => {
                    warn!(attempt, error = %e, "signing request failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(e) => {
                    return Err(ResolveError::Transport(format!(
                        "{e}, retry number: {attempt}"
                    )))
                }
            }
        }
    }

    async fn call(&self, reference: &str, valid_for: Duration) -> Result<String, ResolveError> {
        let body = PrivateUrlRequest {
            url: reference,
            duration: valid_for.as_secs(),
            app_id: &self.config.app_id,
        };

        let response = self.send_with_retry(&body).await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let envelope: PrivateUrlResponse = response
            .json()
            .await
            .map_err(|e| ResolveError::Transport(e.to_string()))?;

        if envelope.errcode != 0 {
            return Err(ResolveError::Service {
                code: envelope.errcode,
                message: envelope.errmsg,
            });
        }

        envelope
            .data
            .map(|data| data.url)
            .ok_or(ResolveError::MissingData)
    }
}

#[async_trait]
impl UrlSigner for HttpUrlSigner {
    #[instrument(skip(self))]
    async fn resolve_private_url(
        &self,
        reference: &str,
        valid_for: Duration,
    ) -> Result<String, ResolveError> {
        let url = tokio::time::timeout(self.config.timeout(), self.call(reference, valid_for))
            .await
            .map_err(|_| ResolveError::Timeout)??;

        debug!("Resolved private url");
        Ok(url)
    }
}
