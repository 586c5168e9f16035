use anyhow::{Context, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

use crate::config::PollConfiguration;

/// A completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status_code: u16,
    pub body: String,
}

/// HTTP transport used by the poller.
///
/// An `Err` means no response was received (DNS, refused connection, TLS,
/// timeout, unreadable body). Non-200 responses are `Ok`.
pub trait Fetch {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse>> + Send;
}

/// reqwest-backed fetcher sharing one client for every URL of a run
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher honouring the TLS verification and timeout settings
    pub fn new(config: &PollConfiguration) -> Result<Self> {
        Self::build(config.verify_ssl, config.timeout)
    }

    fn build(verify_ssl: bool, timeout: Duration) -> Result<Self> {
        if !verify_ssl {
            tracing::warn!("TLS certificate verification is disabled");
        }

        let client = Client::builder()
            .user_agent(format!("url-content-poller/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_ssl)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status_code = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        tracing::debug!("{} answered {} ({} bytes)", url, status_code, body.len());

        Ok(FetchResponse { status_code, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_url_is_a_transport_failure() {
        let fetcher = HttpFetcher::new(&PollConfiguration::default()).unwrap();
        let err = fetcher.fetch("not a url").await.unwrap_err();
        assert!(format!("{:#}", err).contains("not a url"));
    }
}
