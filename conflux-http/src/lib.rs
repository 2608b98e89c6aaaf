//! CONFLUX HTTP - the production transport.
//!
//! Implements the [`Transport`] seam over `reqwest`. Datapoint targets
//! resolve under a configured base URL; absolute targets are hit as given.
//! Every raw failure is translated into a structured [`TransportError`]
//! before it reaches the engine - timeouts included, which surface as a
//! normal `request_failed`.

use async_trait::async_trait;
use chrono::Utc;
use conflux_core::{Method, Payload, Target, Transport, TransportError, TransportRequest};
use reqwest::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Configuration for [`HttpTransport`].
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL datapoint targets resolve under.
    pub base_url: String,
    /// Whole-request timeout.
    pub timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl HttpTransportConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("conflux/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the whole-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: Client,
    config: HttpTransportConfig,
}

impl HttpTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// The URL a datapoint target resolves to:
    /// `{base_url}/{namespace}/{module}/data/{datapoint}`.
    fn datapoint_url(&self, namespace: &str, module: &str, datapoint: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        format!("{base}/{namespace}/{module}/data/{datapoint}")
    }

    fn url_for(&self, target: &Target) -> String {
        match target {
            Target::Datapoint {
                namespace,
                module,
                datapoint,
            } => self.datapoint_url(namespace, module, datapoint),
            Target::Absolute { url } => url.clone(),
        }
    }

    /// Build the wire request for a transport request.
    ///
    /// POSTs to datapoints wrap params in a `{ "data": ... }` JSON envelope;
    /// GETs carry params as query arguments, for datapoint and absolute
    /// targets alike (a POST to an absolute target is not part of the
    /// surface, but degrades to query params too). `use_cache: false` adds a
    /// millisecond-timestamp query param and a `Cache-Control: no-cache`
    /// header.
    fn build_request(&self, request: &TransportRequest) -> Result<reqwest::Request, TransportError> {
        let url = self.url_for(&request.target);

        let mut builder = match (request.method, &request.target) {
            (Method::Post, Target::Datapoint { .. }) => self
                .client
                .post(&url)
                .json(&json!({ "data": Value::Object(request.params.clone()) })),
            _ => self.client.get(&url).query(&query_pairs(&request.params)),
        };

        if !request.options.use_cache {
            builder = builder
                .query(&[("timestamp", cache_buster())])
                .header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        builder
            .build()
            .map_err(|e| TransportError::internal(format!("failed to build request for {url}: {e}")))
    }
}

/// Flatten request params into query pairs.
///
/// Strings go through verbatim; everything else is rendered as its JSON
/// text, which keeps numbers and booleans readable server-side.
fn query_pairs(params: &serde_json::Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}

/// Structured error body some endpoints return on failure.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
    data: Option<ErrorBodyData>,
}

#[derive(Debug, Deserialize)]
struct ErrorBodyData {
    reason: Option<String>,
}

/// Translate a non-2xx response into a [`TransportError`].
///
/// Uses code/message from a structured JSON error body when one is present,
/// otherwise falls back to the canonical status reason. The HTTP status
/// always lands in `data.status`.
fn error_for_status(status: StatusCode, body: &str) -> TransportError {
    let fallback_code = status
        .canonical_reason()
        .unwrap_or("http_error")
        .to_lowercase()
        .replace(' ', "_");
    let fallback_message = status
        .canonical_reason()
        .unwrap_or("HTTP error")
        .to_string();

    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) if parsed.code.is_some() || parsed.message.is_some() => {
            let error = TransportError::http_status(
                status.as_u16(),
                parsed.code.unwrap_or(fallback_code),
                parsed.message.unwrap_or(fallback_message),
            );
            match parsed.data.and_then(|d| d.reason) {
                Some(reason) => error.with_reason(reason),
                None => error,
            }
        }
        _ => TransportError::http_status(status.as_u16(), fallback_code, fallback_message),
    }
}

/// Milliseconds since epoch, the cache-busting query value.
fn cache_buster() -> String {
    Utc::now().timestamp_millis().to_string()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn perform(&self, request: &TransportRequest) -> Result<Payload, TransportError> {
        let built = self.build_request(request)?;
        let url = built.url().to_string();

        debug!(%url, method = ?request.method, use_cache = request.options.use_cache, "performing request");

        let response = self
            .client
            .execute(built)
            .await
            .map_err(|e| TransportError::request_failed(format!("request to {url} failed: {e}")))?;

        let status = response.status();
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.contains("application/json"))
            .unwrap_or(false);

        let body = response.text().await.map_err(|e| {
            TransportError::request_failed(format!("reading response from {url} failed: {e}"))
        })?;

        if !status.is_success() {
            return Err(error_for_status(status, &body));
        }

        if is_json {
            let value: Value = serde_json::from_str(&body).map_err(|e| {
                TransportError::invalid_response(format!("undecodable JSON body from {url}: {e}"))
            })?;
            Ok(Payload::Json(value))
        } else {
            Ok(Payload::Text(body))
        }
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
