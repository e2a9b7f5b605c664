//! reqwest-backed transport.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, Url, header};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace, warn};

use crate::domain::errors::RawFailure;
use crate::domain::ports::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, RequestHeaders};

const USER_AGENT: &str = concat!("session-guard/", env!("CARGO_PKG_VERSION"));

/// Failure while building the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to create HTTP client: {0}")]
    Build(#[from] reqwest::Error),

    #[error("invalid base URL `{url}`: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl From<reqwest::Error> for RawFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(error.to_string())
        } else if let Some(status) = error.status() {
            Self::http(status.as_u16(), None)
        } else {
            Self::transport(error.to_string())
        }
    }
}

/// Sends [`ApiRequest`]s relative to a base URL.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    base_url: Url,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with the given request timeout.
    ///
    /// # Errors
    /// Returns error if the URL is not absolute http(s) or the client cannot
    /// be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let base_url = parse_base_url(base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolves `path` against the base URL. Absolute URLs are accepted only
    /// when they share the base URL's origin, since every request carries the
    /// bearer token.
    fn url(&self, path: &str) -> Result<Url, RawFailure> {
        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path).map_err(|e| RawFailure::application(e.to_string()))?;
            if url.origin() != self.base_url.origin() {
                return Err(RawFailure::application(format!(
                    "refusing cross-origin request to {}",
                    url.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| RawFailure::application(format!("invalid path `{path}`: {e}")))
    }
}

fn parse_base_url(raw: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
    }
    // Url::join replaces the last segment unless the path ends with a slash.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

const fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Parses a response body. Non-JSON text is kept as a JSON string.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(bytes)
        .ok()
        .or_else(|| Some(Value::String(String::from_utf8_lossy(bytes).into_owned())))
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: &ApiRequest,
        headers: &RequestHeaders,
    ) -> Result<ApiResponse, RawFailure> {
        let url = self.url(&request.path)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(method(request.method), url)
            .header(header::ACCEPT, "application/json");
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(authorization) = &headers.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(locale) = &headers.accept_language {
            builder = builder.header(header::ACCEPT_LANGUAGE, locale);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed before a response arrived");
            RawFailure::from(e)
        })?;

        let status = response.status().as_u16();
        let bytes = response.bytes().await.map_err(RawFailure::from)?;
        trace!(status, len = bytes.len(), "Response received");

        Ok(ApiResponse::new(status, parse_body(&bytes)))
    }
}
