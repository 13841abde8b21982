//! reqwest-backed [`JsonFetcher`].

use oidc_rp_core::{JsonFetcher, MaybeSend, OidcConfig, TransportError};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Largest discovery document or JWK Set accepted (1 MiB)
pub const MAX_RESPONSE_SIZE: usize = 1024 * 1024;

/// HTTP GET + JSON over a shared `reqwest::Client`.
///
/// Redirects are not followed, so a provider endpoint cannot bounce the
/// relying party to a different host.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
    max_response_size: usize,
}

impl ReqwestFetcher {
    /// Build a fetcher with the given timeout and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the TLS backend cannot be
    /// initialised.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::Request {
                url: String::new(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self::with_client(client))
    }

    /// Build a fetcher from the timeout and User-Agent of `config`.
    ///
    /// # Errors
    ///
    /// See [`ReqwestFetcher::new`].
    pub fn from_config(config: &OidcConfig) -> Result<Self, TransportError> {
        Self::new(config.request_timeout, &config.user_agent)
    }

    /// Wrap an existing client; its timeout and redirect policy are kept as is.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            max_response_size: MAX_RESPONSE_SIZE,
        }
    }

    /// Builder: change the response size limit
    pub fn with_max_response_size(mut self, bytes: usize) -> Self {
        self.max_response_size = bytes;
        self
    }

    async fn fetch(&self, url: &str) -> Result<Value, TransportError> {
        let failed = |e: reqwest::Error| {
            if e.is_timeout() {
                TransportError::Timeout {
                    url: url.to_string(),
                }
            } else {
                TransportError::Request {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        };

        debug!(url, "GET");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let too_large = || TransportError::InvalidBody {
            url: url.to_string(),
            reason: format!("response exceeds {} bytes", self.max_response_size),
        };
        if let Some(content_length) = response.content_length()
            && content_length > self.max_response_size as u64
        {
            return Err(too_large());
        }

        let body = response.bytes().await.map_err(failed)?;
        if body.len() > self.max_response_size {
            return Err(too_large());
        }

        serde_json::from_slice(&body).map_err(|e| TransportError::InvalidBody {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

impl JsonFetcher for ReqwestFetcher {
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + MaybeSend {
        self.fetch(url)
    }
}
