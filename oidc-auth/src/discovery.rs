//! OpenID Connect discovery with a construct-once cache.

use log::*;
use serde::Deserialize;
use tokio::sync::OnceCell;
use url::Url;

use crate::error::{discovery_error, DiscoveryErrorKind, Error, ErrorKind};
use crate::http::RetryPolicy;

const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// The provider metadata fields this client relies on.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProviderMetadata {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
}

/// Process-wide handle to the identity provider's metadata.
///
/// The first caller performs discovery; concurrent callers wait on that same
/// in-flight request instead of issuing their own. Once stored, the metadata is
/// never replaced. A failed discovery leaves the cache empty so the next caller
/// starts over.
pub struct Discovery {
    issuer: Url,
    http: reqwest::Client,
    retry_policy: RetryPolicy,
    metadata: OnceCell<ProviderMetadata>,
}

impl Discovery {
    pub fn new(issuer: Url, http: reqwest::Client) -> Self {
        Self {
            issuer,
            http,
            retry_policy: RetryPolicy::default(),
            metadata: OnceCell::new(),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn issuer(&self) -> &Url {
        &self.issuer
    }

    /// Returns the cached metadata, discovering it first if needed.
    pub async fn provider_config(&self) -> Result<&ProviderMetadata, Error> {
        self.metadata
            .get_or_try_init(|| self.discover_with_retry())
            .await
    }

    async fn discover_with_retry(&self) -> Result<ProviderMetadata, Error> {
        let mut attempt = 1;
        loop {
            match self.fetch_metadata().await {
                Ok(metadata) => {
                    info!("Discovered OIDC provider metadata for {}", metadata.issuer);
                    return Ok(metadata);
                }
                Err(e) => match self.retry_policy.delay_after(attempt) {
                    Some(delay) => {
                        warn!(
                            "OIDC discovery attempt {attempt}/{} failed: {e}; retrying in {delay:?}",
                            self.retry_policy.max_attempts()
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    None => {
                        error!("OIDC discovery failed after {attempt} attempts: {e}");
                        return Err(e);
                    }
                },
            }
        }
    }

    async fn fetch_metadata(&self) -> Result<ProviderMetadata, Error> {
        let url = well_known_url(&self.issuer);
        debug!("Fetching OIDC discovery document from {url}");

        let response = self.http.get(url.clone()).send().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Discovery(DiscoveryErrorKind::Unreachable),
        })?;

        if !response.status().is_success() {
            return Err(discovery_error(
                DiscoveryErrorKind::Rejected,
                &format!("GET {url} returned {}", response.status()),
            ));
        }

        let metadata: ProviderMetadata = response.json().await.map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Discovery(DiscoveryErrorKind::InvalidDocument),
        })?;

        if trim_slash(&metadata.issuer) != trim_slash(self.issuer.as_str()) {
            return Err(discovery_error(
                DiscoveryErrorKind::InvalidDocument,
                &format!(
                    "issuer mismatch: expected {}, got {}",
                    self.issuer, metadata.issuer
                ),
            ));
        }

        Ok(metadata)
    }
}

fn trim_slash(url: &str) -> &str {
    url.trim_end_matches('/')
}

fn well_known_url(issuer: &Url) -> String {
    format!("{}/{WELL_KNOWN_PATH}", trim_slash(issuer.as_str()))
}
