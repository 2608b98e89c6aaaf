//! The transport boundary.
//!
//! The engine never talks to the network directly: fetch operations describe
//! a [`TransportRequest`], and an injected [`Transport`] implementation
//! performs it. The concrete HTTP transport lives in `conflux-http`; tests
//! inject mocks from `conflux-test-utils`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::TransportError;

/// Per-request options recognized by every transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// When false, the transport must bypass any HTTP-level cache and hit
    /// the network directly.
    pub use_cache: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { use_cache: true }
    }
}

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A REST datapoint under the transport's configured base URL,
    /// e.g. `modules/analytics/data/properties-profiles`.
    Datapoint {
        namespace: String,
        module: String,
        datapoint: String,
    },
    /// A raw URL outside the REST surface, e.g. a page fetch for HTML
    /// inspection.
    Absolute { url: String },
}

/// One external call, fully described.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    pub target: Target,
    pub params: Map<String, Value>,
    pub options: RequestOptions,
}

impl TransportRequest {
    /// A GET against a REST datapoint.
    pub fn get(
        namespace: impl Into<String>,
        module: impl Into<String>,
        datapoint: impl Into<String>,
    ) -> Self {
        Self {
            method: Method::Get,
            target: Target::Datapoint {
                namespace: namespace.into(),
                module: module.into(),
                datapoint: datapoint.into(),
            },
            params: Map::new(),
            options: RequestOptions::default(),
        }
    }

    /// A POST against a REST datapoint.
    pub fn post(
        namespace: impl Into<String>,
        module: impl Into<String>,
        datapoint: impl Into<String>,
    ) -> Self {
        Self {
            method: Method::Post,
            target: Target::Datapoint {
                namespace: namespace.into(),
                module: module.into(),
                datapoint: datapoint.into(),
            },
            params: Map::new(),
            options: RequestOptions::default(),
        }
    }

    /// A GET against an absolute URL.
    pub fn absolute(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            target: Target::Absolute { url: url.into() },
            params: Map::new(),
            options: RequestOptions::default(),
        }
    }

    /// Add one request parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Override the request options.
    pub fn options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// A successful response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
}

impl Payload {
    /// The payload as JSON, or an `invalid_response` error.
    pub fn into_json(self) -> Result<Value, TransportError> {
        match self {
            Payload::Json(value) => Ok(value),
            Payload::Text(_) => Err(TransportError::invalid_response(
                "expected a JSON response body, got text",
            )),
        }
    }

    /// The payload as text, or an `invalid_response` error.
    pub fn into_text(self) -> Result<String, TransportError> {
        match self {
            Payload::Text(text) => Ok(text),
            Payload::Json(_) => Err(TransportError::invalid_response(
                "expected a text response body, got JSON",
            )),
        }
    }
}

/// The injected transport seam.
///
/// Implementations translate every raw failure into a [`TransportError`]
/// before returning; callers never observe transport-specific error types.
/// Timeouts are the transport's responsibility and surface as a normal
/// structured failure.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn perform(&self, request: &TransportRequest) -> Result<Payload, TransportError>;
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_builder() {
        let request = TransportRequest::get("modules", "analytics", "properties-profiles")
            .param("accountID", "123")
            .options(RequestOptions { use_cache: false });

        assert_eq!(request.method, Method::Get);
        assert_eq!(
            request.target,
            Target::Datapoint {
                namespace: "modules".to_string(),
                module: "analytics".to_string(),
                datapoint: "properties-profiles".to_string(),
            }
        );
        assert_eq!(request.params.get("accountID"), Some(&json!("123")));
        assert!(!request.options.use_cache);
    }

    #[test]
    fn test_post_builder() {
        let request = TransportRequest::post("modules", "analytics", "create-property");
        assert_eq!(request.method, Method::Post);
        assert!(request.params.is_empty());
        assert!(request.options.use_cache);
    }

    #[test]
    fn test_absolute_builder() {
        let request = TransportRequest::absolute("https://example.com").param("tagverify", 1);
        assert_eq!(
            request.target,
            Target::Absolute {
                url: "https://example.com".to_string()
            }
        );
        assert_eq!(request.params.get("tagverify"), Some(&json!(1)));
    }

    #[test]
    fn test_options_default_uses_cache() {
        assert!(RequestOptions::default().use_cache);
    }

    #[test]
    fn test_payload_into_json() {
        let payload = Payload::Json(json!({ "ok": true }));
        assert_eq!(payload.into_json().expect("json"), json!({ "ok": true }));

        let err = Payload::Text("<html>".to_string())
            .into_json()
            .expect_err("text is not json");
        assert_eq!(err.code, "invalid_response");
    }

    #[test]
    fn test_payload_into_text() {
        let payload = Payload::Text("<html>".to_string());
        assert_eq!(payload.into_text().expect("text"), "<html>");

        let err = Payload::Json(json!(null))
            .into_text()
            .expect_err("json is not text");
        assert_eq!(err.code, "invalid_response");
    }
}
