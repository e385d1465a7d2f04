//! HTTP access to the corporate number Web-API.
//!
//! One GET per partition, no retries. A non-success status ends the run with
//! the status code and body attached to the error.

use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::query::{ApiRequest, Endpoint};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Raw response of a successful request
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// HTTP status code (always 2xx)
    pub status: u16,
    /// Undecoded body
    pub body: Vec<u8>,
}

/// Source of API responses
///
/// Implemented by [`ApiClient`] for the real service; tests substitute
/// in-memory implementations.
#[async_trait]
pub trait RegistryApi: Send + Sync {
    /// Perform one request
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] for non-2xx responses and [`Error::Network`]
    /// when the request could not be completed.
    async fn fetch(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed client
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl ApiClient {
    /// Create a client from API settings
    ///
    /// # Errors
    /// Returns a configuration error if the base URL does not parse, or an
    /// error if the HTTP client cannot be created.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let base_url = parse_base_url(&config.api_url)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("corpno-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Absolute URL of an endpoint
    pub fn endpoint_url(&self, endpoint: Endpoint) -> Result<Url> {
        self.base_url.join(endpoint.path()).map_err(|e| {
            Error::config(
                format!("cannot resolve endpoint {}: {}", endpoint.path(), e),
                "api_url",
            )
        })
    }
}

#[async_trait]
impl RegistryApi for ApiClient {
    async fn fetch(&self, request: &ApiRequest) -> Result<ApiResponse> {
        let url = self.endpoint_url(request.endpoint)?;
        let http_request = self
            .http
            .get(url)
            .query(&[("id", self.api_key.as_str())])
            .query(request.params.pairs())
            .build()?;
        debug!(url = %redact_key(http_request.url()), "requesting");

        let response = self.http.execute(http_request).await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Parse the base URL so relative joins append instead of replacing the last
/// path segment
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)
        .map_err(|e| Error::config(format!("invalid api url {raw:?}: {e}"), "api_url"))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Copy of a request URL with the application ID masked
fn redact_key(url: &Url) -> Url {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "id" { "***".into() } else { v.into_owned() };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}
