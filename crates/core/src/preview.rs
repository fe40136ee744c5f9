//! Main preview API.
//!
//! This module provides the single entry point of the engine: given a raw,
//! user-supplied URL, [`Previewer::get_preview`] validates it, fetches the
//! page, extracts its metadata and returns a [`PreviewResult`]. Every
//! failure is folded into the result; nothing escapes to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use readlog_core::{PreviewConfig, Previewer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let previewer = Previewer::new(PreviewConfig::default())?;
//! let preview = previewer.get_preview("https://example.com/article").await;
//! if preview.is_success() {
//!     println!("Title: {:?}", preview.title());
//! } else {
//!     println!("Preview unavailable: {:?}", preview.error());
//! }
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::fetch::{FetchConfig, FetchedDocument, Fetcher};
use crate::metadata::{ExtractedFields, extract};
use crate::validate::{UrlPolicy, normalize};
use crate::{ErrorKind, PreviewError, Result};

/// Incoming preview request: one raw string believed to be a URL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub url: String,
}

/// The outcome of one preview call.
///
/// Either a success carrying the final URL and whatever metadata was found,
/// or a failure carrying an error kind and message with every metadata field
/// empty. The constructors are the only way to build one, so a partially
/// successful record cannot exist.
///
/// Serializes as a flat object:
///
/// ```json
/// {"title": "…", "description": "…", "image": "…", "site_name": "…",
///  "url": "https://…", "success": true, "error": null, "error_kind": null}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewResult {
    title: Option<String>,
    description: Option<String>,
    image: Option<String>,
    site_name: Option<String>,
    url: Option<String>,
    success: bool,
    error: Option<String>,
    error_kind: Option<ErrorKind>,
}

impl PreviewResult {
    /// Builds a successful preview for a document found at `final_url`.
    pub fn success(final_url: &url::Url, fields: ExtractedFields) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            image: fields.image,
            site_name: fields.site_name,
            url: Some(final_url.to_string()),
            success: true,
            error: None,
            error_kind: None,
        }
    }

    /// Builds a failed preview from an engine error.
    pub fn failure(err: &PreviewError) -> Self {
        Self {
            title: None,
            description: None,
            image: None,
            site_name: None,
            url: None,
            success: false,
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Absolute URL of the preview image.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn site_name(&self) -> Option<&str> {
        self.site_name.as_deref()
    }

    /// Location of the document after all redirects; `None` on failure.
    pub fn final_url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Human-readable failure detail; `None` on success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }

    /// Whether any metadata field was found.
    pub fn has_metadata(&self) -> bool {
        self.title.is_some() || self.description.is_some() || self.image.is_some() || self.site_name.is_some()
    }

    /// Converts the record to a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "success": false }))
    }
}

/// Configuration for the preview engine.
///
/// # Example
///
/// ```rust
/// use readlog_core::PreviewConfig;
///
/// let config = PreviewConfig::builder()
///     .timeout(5)
///     .max_redirects(3)
///     .build();
/// assert_eq!(config.fetch.timeout, 5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PreviewConfig {
    /// HTTP client settings.
    pub fetch: FetchConfig,
    /// URL validation settings.
    pub url_policy: UrlPolicy,
}

impl PreviewConfig {
    /// Creates a new builder for PreviewConfig.
    pub fn builder() -> PreviewConfigBuilder {
        PreviewConfigBuilder::new()
    }
}

/// Builder for PreviewConfig.
pub struct PreviewConfigBuilder {
    config: PreviewConfig,
}

impl PreviewConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PreviewConfig::default() }
    }

    /// Sets the total request timeout in seconds.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.config.fetch.timeout = secs;
        self
    }

    /// Sets the User-Agent header.
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Sets the largest accepted body, in bytes.
    pub fn max_body_bytes(mut self, value: usize) -> Self {
        self.config.fetch.max_body_bytes = value;
        self
    }

    /// Sets the maximum number of redirects followed.
    pub fn max_redirects(mut self, value: usize) -> Self {
        self.config.fetch.max_redirects = value;
        self
    }

    /// Allows loopback, private and link-local targets, both at validation
    /// time and when following redirects.
    pub fn allow_private_hosts(mut self, value: bool) -> Self {
        self.config.fetch.allow_private_hosts = value;
        self.config.url_policy.allow_private_hosts = value;
        self
    }

    /// Sets whether scheme-less input is upgraded to `https://` or rejected.
    pub fn upgrade_missing_scheme(mut self, value: bool) -> Self {
        self.config.url_policy.upgrade_missing_scheme = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PreviewConfig {
        self.config
    }
}

impl Default for PreviewConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The URL preview engine.
///
/// Holds no per-request state; clones share the same HTTP client, so one
/// instance can serve any number of concurrent calls.
#[derive(Debug, Clone)]
pub struct Previewer {
    fetcher: Fetcher,
    url_policy: UrlPolicy,
}

impl Previewer {
    /// Creates a previewer, building its HTTP client once.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Other`] if the HTTP client cannot be built.
    pub fn new(config: PreviewConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch)?;
        Ok(Self { fetcher, url_policy: config.url_policy })
    }

    /// Produces a preview for `raw`. Never fails; errors are part of the result.
    pub async fn get_preview(&self, raw: &str) -> PreviewResult {
        match self.try_preview(raw).await {
            Ok(result) => result,
            Err(e) => PreviewResult::failure(&e),
        }
    }

    /// Like [`get_preview`](Self::get_preview), but aborts as soon as
    /// `cancel` completes.
    ///
    /// The in-flight request is dropped and the result has kind
    /// [`ErrorKind::Cancelled`].
    pub async fn get_preview_until<F>(&self, raw: &str, cancel: F) -> PreviewResult
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                debug!(url = raw, "Preview cancelled by caller");
                PreviewResult::failure(&PreviewError::Cancelled)
            }
            result = self.get_preview(raw) => result,
        }
    }

    async fn try_preview(&self, raw: &str) -> Result<PreviewResult> {
        let url = normalize(raw, &self.url_policy)?;
        let document = self.fetcher.fetch(&url).await?;
        assemble(document).await
    }
}

/// Extracts fields on the blocking pool so a large page does not stall the
/// async workers. A panic in the parser becomes [`PreviewError::Other`].
async fn assemble(document: FetchedDocument) -> Result<PreviewResult> {
    let final_url = document.final_url.clone();
    let fields = tokio::task::spawn_blocking(move || extract(&document))
        .await
        .map_err(|e| {
            error!(url = %final_url, error = %e, "Preview extraction panicked");
            PreviewError::Other("Preview extraction failed".to_string())
        })?;
    Ok(PreviewResult::success(&final_url, fields))
}

/// Fetches a preview using the default configuration.
///
/// Builds a fresh client per call; long-running callers should keep a
/// [`Previewer`] instead.
pub async fn get_preview(raw: &str) -> PreviewResult {
    match Previewer::new(PreviewConfig::default()) {
        Ok(previewer) => previewer.get_preview(raw).await,
        Err(e) => PreviewResult::failure(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_failure_record_has_no_metadata() {
        let result = PreviewResult::failure(&PreviewError::HttpError { status: 404 });

        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ErrorKind::HttpError));
        assert_eq!(result.error(), Some("HTTP error: 404"));
        assert_eq!(result.final_url(), None);
        assert!(!result.has_metadata());
    }

    #[test]
    fn test_success_record_without_metadata() {
        let url = Url::parse("https://example.com/final").unwrap();
        let result = PreviewResult::success(&url, ExtractedFields::default());

        assert!(result.is_success());
        assert_eq!(result.final_url(), Some("https://example.com/final"));
        assert_eq!(result.error(), None);
        assert_eq!(result.error_kind(), None);
        assert!(!result.has_metadata());
    }

    #[test]
    fn test_serializes_flat_keys() {
        let url = Url::parse("https://example.com/").unwrap();
        let fields = ExtractedFields { title: Some("T".into()), site_name: Some("S".into()), ..Default::default() };
        let json = PreviewResult::success(&url, fields).to_json();

        assert_eq!(json["title"], "T");
        assert_eq!(json["site_name"], "S");
        assert_eq!(json["url"], "https://example.com/");
        assert_eq!(json["success"], true);
        assert!(json["description"].is_null());
        assert!(json["image"].is_null());
        assert!(json["error"].is_null());
    }

    #[test]
    fn test_failure_serializes_kind() {
        let json = PreviewResult::failure(&PreviewError::Timeout { timeout: 10 }).to_json();
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "timeout");
        assert!(json["url"].is_null());
    }

    #[test]
    fn test_builder_sets_both_private_flags() {
        let config = PreviewConfig::builder().allow_private_hosts(true).upgrade_missing_scheme(false).build();
        assert!(config.fetch.allow_private_hosts);
        assert!(config.url_policy.allow_private_hosts);
        assert!(!config.url_policy.upgrade_missing_scheme);
    }

    #[test]
    fn test_request_missing_url_defaults_empty() {
        let req: PreviewRequest = serde_json::from_str("{}").unwrap();
        assert!(req.url.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_scheme_never_touches_network() {
        let previewer = Previewer::new(PreviewConfig::default()).unwrap();
        let result = previewer.get_preview("ftp://example.com/file").await;

        assert!(!result.is_success());
        assert_eq!(result.error_kind(), Some(ErrorKind::InvalidUrl));
        assert!(result.error().unwrap().contains("ftp"));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let previewer = Previewer::new(PreviewConfig::default()).unwrap();
        let result = previewer.get_preview_until("https://example.com", std::future::ready(())).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::Cancelled));
    }

    #[tokio::test]
    async fn test_assemble_extracts_off_the_async_worker() {
        let document = FetchedDocument {
            final_url: Url::parse("https://example.com/after-redirect").unwrap(),
            content_type: Some("text/html".to_string()),
            body: "<title>Moved - Example</title><img src=\"hero.jpg\">".to_string(),
        };
        let result = assemble(document).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.title(), Some("Moved - Example"));
        assert_eq!(result.site_name(), Some("Example"));
        assert_eq!(result.image(), Some("https://example.com/hero.jpg"));
        assert_eq!(result.final_url(), Some("https://example.com/after-redirect"));
    }
}
