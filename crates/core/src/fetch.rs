//! Bounded HTTP retrieval of preview targets.
//!
//! A [`Fetcher`] owns one `reqwest::Client` built from a [`FetchConfig`] and
//! is meant to be built once and shared: cloning it is cheap and every clone
//! reuses the same connection pool. Each call to [`Fetcher::fetch`] performs
//! exactly one GET (plus the redirects it is told to follow) and never
//! retries.

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::redirect::{Attempt, Policy};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, warn};
use url::{Host, Url};

use crate::validate::{ValidUrl, is_private_host, is_private_ip};
use crate::{PreviewError, Result};

/// Browser-like identification sent with every request. Some sites refuse
/// or degrade responses for clients that announce themselves as bots.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// HTTP client configuration for fetching preview targets.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Total request timeout in seconds, body included.
    pub timeout: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Largest body accepted, in bytes.
    pub max_body_bytes: usize,
    /// Maximum number of redirects followed.
    pub max_redirects: usize,
    /// Skip the private-address checks (for tests and trusted networks).
    pub allow_private_hosts: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_body_bytes: 5 * 1024 * 1024,
            max_redirects: 10,
            allow_private_hosts: false,
        }
    }
}

/// A successfully retrieved document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// Location after all redirects; the base for resolving references.
    pub final_url: Url,
    /// The `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
    /// Response body, decoded with the declared charset (UTF-8 otherwise),
    /// invalid sequences replaced.
    pub body: String,
}

/// Shared, read-only HTTP fetcher.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    /// Builds the underlying client.
    ///
    /// # Errors
    ///
    /// Returns [`PreviewError::Other`] if the TLS backend cannot be initialized.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(config.user_agent.clone())
            .redirect(redirect_policy(config.max_redirects, config.allow_private_hosts));

        if !config.allow_private_hosts {
            builder = builder.dns_resolver(Arc::new(PublicOnlyResolver));
        }

        let client = builder
            .build()
            .map_err(|e| PreviewError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Gets the configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches `url`, following redirects.
    ///
    /// Unless private hosts are allowed, every hostname the request touches
    /// (the target and each redirect hop) is resolved through a filter that
    /// refuses private addresses. Name resolution runs inside the client
    /// timeout. Literal IP targets are checked by [`normalize`](crate::normalize);
    /// literal IP redirect hops are checked by the redirect policy.
    ///
    /// # Errors
    ///
    /// - [`PreviewError::InvalidUrl`] if a host or redirect hop is private
    /// - [`PreviewError::Timeout`] if no complete response arrives in time
    /// - [`PreviewError::ConnectionFailed`] on DNS, TCP or TLS failure
    /// - [`PreviewError::HttpError`] on a 4xx/5xx status
    /// - [`PreviewError::Other`] for oversized bodies, non-HTML content
    ///   types and redirect failures
    pub async fn fetch(&self, url: &ValidUrl) -> Result<FetchedDocument> {
        let response = self
            .client
            .get(url.as_str())
            .header(ACCEPT, ACCEPT_HTML)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| self.classify(&e, url))?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            warn!(url = %url, status = status.as_u16(), "Preview target returned an error status");
            return Err(PreviewError::HttpError { status: status.as_u16() });
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        if let Some(ct) = &content_type
            && !is_markup(ct)
        {
            return Err(PreviewError::Other(format!("Unsupported content type: {}", ct)));
        }

        let body = self.read_body(response, content_type.as_deref(), url).await?;
        debug!(url = %url, final_url = %final_url, bytes = body.len(), "Fetched preview target");

        Ok(FetchedDocument { final_url, content_type, body })
    }

    /// Streams the body, refusing to buffer more than `max_body_bytes`, then
    /// decodes it with the declared charset.
    async fn read_body(&self, mut response: Response, content_type: Option<&str>, url: &ValidUrl) -> Result<String> {
        let limit = self.config.max_body_bytes;
        if response.content_length().is_some_and(|len| len > limit as u64) {
            return Err(too_large(limit));
        }

        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(&e, url))? {
            if buf.len() + chunk.len() > limit {
                return Err(too_large(limit));
            }
            buf.extend_from_slice(&chunk);
        }

        Ok(decode_body(&buf, content_type))
    }

    fn classify(&self, err: &reqwest::Error, url: &ValidUrl) -> PreviewError {
        let classified = match find_blocked(err) {
            Some(blocked) => PreviewError::InvalidUrl(blocked.to_string()),
            None => PreviewError::from_transport(err, self.config.timeout),
        };
        warn!(url = %url, error = %classified, "Failed to fetch preview target");
        classified
    }
}

/// A host the fetcher refused to contact.
#[derive(Debug, Error)]
enum Blocked {
    #[error("host {0} resolves to a private or reserved address")]
    Resolved(String),
    #[error("redirect to private address {0} refused")]
    Redirect(String),
}

/// Finds a [`Blocked`] refusal anywhere in the error's source chain.
fn find_blocked(err: &reqwest::Error) -> Option<&Blocked> {
    let mut source = err.source();
    while let Some(current) = source {
        if let Some(blocked) = current.downcast_ref::<Blocked>() {
            return Some(blocked);
        }
        source = current.source();
    }
    None
}

/// System resolver that fails the lookup when any address is private.
struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let host = name.as_str().to_string();
        Box::pin(async move {
            let resolved = tokio::net::lookup_host((host.as_str(), 0)).await?;
            let addrs = public_addrs(&host, resolved)?;
            Ok::<Addrs, Box<dyn StdError + Send + Sync>>(Box::new(addrs.into_iter()))
        })
    }
}

fn public_addrs(host: &str, resolved: impl IntoIterator<Item = SocketAddr>) -> std::result::Result<Vec<SocketAddr>, Blocked> {
    let addrs: Vec<SocketAddr> = resolved.into_iter().collect();
    if addrs.iter().any(|addr| is_private_ip(addr.ip())) {
        return Err(Blocked::Resolved(host.to_string()));
    }
    Ok(addrs)
}

/// Follows at most `max` hops and, unless private hosts are allowed, never
/// into a private literal address. Hostnames are left to the resolver.
fn redirect_policy(max: usize, allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt: Attempt| {
        if attempt.previous().len() > max {
            return attempt.error(format!("too many redirects (limit {})", max));
        }
        let blocked = !allow_private_hosts
            && attempt
                .url()
                .host()
                .is_some_and(|host| !matches!(host, Host::Domain(_)) && is_private_host(&host));
        if blocked {
            let target = attempt.url().to_string();
            return attempt.error(Blocked::Redirect(target));
        }
        let scheme = attempt.url().scheme().to_string();
        if scheme == "http" || scheme == "https" {
            attempt.follow()
        } else {
            attempt.error(format!("redirect to unsupported scheme {}", scheme))
        }
    })
}

/// Decodes `bytes` with the `charset` of `content_type`, falling back to
/// UTF-8 for a missing or unknown label. A byte order mark wins over both.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_label)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn charset_label(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (key, value) = param.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// Whether a `Content-Type` can carry a page worth extracting from.
fn is_markup(content_type: &str) -> bool {
    let mime = content_type.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

fn too_large(limit: usize) -> PreviewError {
    PreviewError::Other(format!("Response body exceeds {} bytes", limit))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, 10);
        assert_eq!(config.max_redirects, 10);
        assert!(!config.allow_private_hosts);
        assert!(config.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn test_is_markup() {
        assert!(is_markup("text/html"));
        assert!(is_markup("text/html; charset=utf-8"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(is_markup("text/plain"));
        assert!(is_markup(""));
        assert!(!is_markup("image/png"));
        assert!(!is_markup("application/pdf"));
        assert!(!is_markup("application/octet-stream"));
    }

    #[test]
    fn test_decode_body_uses_declared_charset() {
        let bytes = b"<title>Caf\xE9</title>";
        assert_eq!(decode_body(bytes, Some("text/html; charset=windows-1252")), "<title>Café</title>");
        assert_eq!(decode_body(bytes, Some("text/html; charset=\"ISO-8859-1\"")), "<title>Café</title>");
    }

    #[test]
    fn test_decode_body_defaults_to_utf8() {
        let bytes = "<title>Café</title>".as_bytes();
        assert_eq!(decode_body(bytes, None), "<title>Café</title>");
        assert_eq!(decode_body(bytes, Some("text/html")), "<title>Café</title>");
        assert_eq!(decode_body(bytes, Some("text/html; charset=no-such-charset")), "<title>Café</title>");
    }

    #[test]
    fn test_charset_label() {
        assert_eq!(charset_label("text/html; Charset=Shift_JIS"), Some("Shift_JIS"));
        assert_eq!(charset_label("text/html; boundary=x"), None);
        assert_eq!(charset_label("text/html"), None);
    }

    #[test]
    fn test_public_addrs_rejects_any_private_address() {
        let public: SocketAddr = "93.184.216.34:0".parse().unwrap();
        let loopback: SocketAddr = "127.0.0.1:0".parse().unwrap();

        assert_eq!(public_addrs("example.com", [public]).unwrap(), vec![public]);

        let err = public_addrs("rebind.example", [public, loopback]).unwrap_err();
        assert!(err.to_string().contains("rebind.example"));
    }

    #[test]
    fn test_fetcher_builds() {
        let fetcher = Fetcher::new(FetchConfig::default()).unwrap();
        assert_eq!(fetcher.config().timeout, 10);
    }
}
