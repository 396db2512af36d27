//! HTTP transport for the Global Address service.

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};
use url::Url;

use crate::error::{Error, Result};
use crate::request::GlobalAddressRequest;

/// Production endpoint of the Global Address web service.
pub const DEFAULT_ENDPOINT: &str =
    "https://address.melissadata.net/v3/WEB/GlobalAddress/doGlobalAddress";

/// Upper bound on a single lookup, including reading the body.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A completed HTTP exchange, successful or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status.
    pub reason: String,
    /// Response body text.
    pub body: String,
}

impl RawResponse {
    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Client for single-address Global Address lookups.
#[derive(Clone)]
pub struct MelissaClient {
    endpoint: Url,
    license_key: String,
    timeout: Duration,
    http_client: Client,
}

impl fmt::Debug for MelissaClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MelissaClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("license_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MelissaClient {
    /// Creates a client for the given endpoint and license key.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint is not an http(s) URL or the
    /// license key is empty.
    pub fn new(endpoint: &str, license_key: impl Into<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "endpoint must use http or https, got {}",
                endpoint.scheme()
            )));
        }

        let license_key = license_key.into();
        if license_key.trim().is_empty() {
            return Err(Error::InvalidConfig("license key is empty".to_string()));
        }

        Ok(Self {
            endpoint,
            license_key,
            timeout: DEFAULT_TIMEOUT,
            http_client: Client::new(),
        })
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub const fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Builds the full request URL. Contains the license key; do not log it.
    #[must_use]
    pub fn request_url(&self, request: &GlobalAddressRequest) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(request.query_params(&self.license_key));
        url
    }

    /// Sends a lookup and returns the raw exchange.
    ///
    /// Non-2xx statuses are returned as a [`RawResponse`], not an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if the exchange exceeds the timeout and
    /// [`Error::Http`] if it fails to complete for any other reason.
    pub async fn send(&self, request: &GlobalAddressRequest) -> Result<RawResponse> {
        let url = self.request_url(request);
        debug!(
            tracking = %request.tracking,
            endpoint = %self.endpoint,
            "Sending Global Address request"
        );

        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            warn!(tracking = %request.tracking, status = status.as_u16(), "Global Address request failed");
        }

        Ok(RawResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            // reqwest embeds the URL in its messages, which carries the license key
            Error::Http(err.without_url())
        }
    }
}
