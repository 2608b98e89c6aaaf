//! Site store: HTML inspection for arbitrary URLs.
//!
//! Fetches the raw HTML of a page so callers can check for an existing tag
//! snippet before deciding whether to place one. Page fetches always bypass
//! HTTP-level caching; a stale copy defeats the point of the inspection.

use std::sync::Arc;

use conflux_core::{
    ArgValue, ConfluxResult, EncodingError, Payload, RequestOptions, ResolutionStatus, Transport,
    TransportError, TransportRequest, ValidationError,
};
use conflux_store::{FetchOperation, ResolutionStore};
use serde_json::json;

/// Fetch operation: the HTML body of one URL.
pub struct GetHtmlForUrl;

impl FetchOperation for GetHtmlForUrl {
    type Args = String;
    type Output = String;

    fn name(&self) -> &'static str {
        "getHTMLForURL"
    }

    fn validate(&self, args: &String) -> Result<(), ValidationError> {
        if args.is_empty() {
            return Err(ValidationError::MissingField {
                field: "url".to_string(),
            });
        }
        let parsed = url::Url::parse(args).map_err(|e| ValidationError::InvalidValue {
            field: "url".to_string(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(ValidationError::InvalidValue {
                field: "url".to_string(),
                reason: format!("unsupported scheme: {other}"),
            }),
        }
    }

    fn key_args(&self, args: &String) -> Result<Vec<ArgValue>, EncodingError> {
        Ok(vec![json!(args)])
    }

    fn request(&self, args: &String) -> TransportRequest {
        TransportRequest::absolute(args.clone())
            .param("tagverify", 1)
            .options(RequestOptions { use_cache: false })
    }

    fn decode(&self, payload: Payload) -> Result<String, TransportError> {
        payload.into_text()
    }
}

/// Resolution store for site HTML.
pub struct SiteStore {
    html: ResolutionStore<GetHtmlForUrl>,
}

impl SiteStore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            html: ResolutionStore::new(Arc::new(GetHtmlForUrl), transport),
        }
    }

    /// The HTML body of `url`, fetched once and cached.
    pub async fn html_for_url(&self, url: &str) -> ConfluxResult<Arc<String>> {
        self.html.resolve(&url.to_string()).await
    }

    /// Invalidate the cached HTML for `url`.
    pub fn reset_html_for_url(&self, url: &str) -> ConfluxResult<()> {
        self.html.reset(&url.to_string())
    }

    /// Whether the HTML of `url` contains `needle`.
    ///
    /// Resolves the page if it has not been fetched yet. A plain substring
    /// scan matches the inspection the original flow performs on tag
    /// snippets.
    pub async fn contains_tag(&self, url: &str, needle: &str) -> ConfluxResult<bool> {
        let html = self.html_for_url(url).await?;
        Ok(html.contains(needle))
    }

    pub fn status_for_url(&self, url: &str) -> ConfluxResult<ResolutionStatus> {
        self.html.status(&url.to_string())
    }

    pub fn is_fetching_html(&self, url: &str) -> ConfluxResult<bool> {
        self.html.is_fetching(&url.to_string())
    }

    pub fn error_for_url(&self, url: &str) -> ConfluxResult<Option<TransportError>> {
        self.html.error_for(&url.to_string())
    }
}

impl std::fmt::Debug for SiteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteStore").finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
