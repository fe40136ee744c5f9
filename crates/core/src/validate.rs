//! URL validation and normalization.
//!
//! Turns a raw, user-supplied string into a [`ValidUrl`] before any network
//! activity happens. Validation is pure: no DNS lookups are performed here.
//!
//! # Scheme policy
//!
//! A string without a scheme (`example.com/post`) is upgraded to `https://`
//! by default. Set [`UrlPolicy::upgrade_missing_scheme`] to `false` to reject
//! it instead. A leading `name:` counts as a scheme when it is followed by
//! `//` or by anything that is not a port number, so `example.com:8080/x`
//! is a host with a port while `javascript:alert(1)` is a (rejected) scheme.
//!
//! # Example
//!
//! ```rust
//! use readlog_core::validate::{UrlPolicy, normalize};
//!
//! let url = normalize("  example.com/post  ", &UrlPolicy::default()).unwrap();
//! assert_eq!(url.as_str(), "https://example.com/post");
//!
//! assert!(normalize("javascript:alert(1)", &UrlPolicy::default()).is_err());
//! ```

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use url::{Host, Url};

use crate::{PreviewError, Result};

const DEFAULT_SCHEME: &str = "https";

/// Controls how lenient [`normalize`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlPolicy {
    /// Prepend `https://` to inputs that carry no scheme (default: true).
    pub upgrade_missing_scheme: bool,
    /// Accept loopback, private and link-local hosts (default: false).
    pub allow_private_hosts: bool,
}

impl Default for UrlPolicy {
    fn default() -> Self {
        Self { upgrade_missing_scheme: true, allow_private_hosts: false }
    }
}

/// An absolute http(s) URL with a non-empty host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidUrl(Url);

impl ValidUrl {
    /// Gets the underlying parsed URL.
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Gets the URL as a string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Gets the scheme, always `http` or `https`.
    pub fn scheme(&self) -> &str {
        self.0.scheme()
    }

    /// Gets the host as written in the URL.
    pub fn host_str(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Port to use for the connection, falling back to the scheme default.
    pub fn port_or_default(&self) -> u16 {
        self.0.port_or_known_default().unwrap_or(443)
    }

    /// Consumes the wrapper and returns the parsed URL.
    pub fn into_url(self) -> Url {
        self.0
    }
}

impl fmt::Display for ValidUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Normalizes and validates a raw URL string.
///
/// # Errors
///
/// Returns [`PreviewError::InvalidUrl`] when the input is empty, has no
/// scheme (and the policy forbids upgrading), uses a scheme other than
/// http/https, has no host, cannot be parsed, or names a private host while
/// the policy forbids it.
pub fn normalize(raw: &str, policy: &UrlPolicy) -> Result<ValidUrl> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty URL"));
    }

    let candidate = match explicit_scheme(trimmed) {
        Some(scheme) if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") => {
            trimmed.to_string()
        }
        Some(scheme) => return Err(invalid(format!("unsupported scheme: {}", scheme.to_ascii_lowercase()))),
        None if trimmed.starts_with("//") && policy.upgrade_missing_scheme => format!("{DEFAULT_SCHEME}:{trimmed}"),
        None if policy.upgrade_missing_scheme => format!("{DEFAULT_SCHEME}://{trimmed}"),
        None => return Err(invalid("missing scheme")),
    };

    let url = Url::parse(&candidate).map_err(|e| match e {
        url::ParseError::EmptyHost => invalid("missing host"),
        other => invalid(format!("malformed URL: {}", other)),
    })?;

    let host = match url.host() {
        Some(Host::Domain("")) | None => return Err(invalid("missing host")),
        Some(host) => host,
    };

    if !policy.allow_private_hosts && is_private_host(&host) {
        return Err(invalid(format!("private or loopback address: {}", host)));
    }

    Ok(ValidUrl(url))
}

/// Returns the scheme written at the start of `input`, if any.
fn explicit_scheme(input: &str) -> Option<&str> {
    let (head, rest) = input.split_once(':')?;

    let mut chars = head.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() || !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }

    // `host:8080` is an authority with a port, not a scheme.
    if !rest.starts_with("//") && rest.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    Some(head)
}

fn invalid(detail: impl Into<String>) -> PreviewError {
    PreviewError::InvalidUrl(detail.into())
}

/// Returns `true` if `host` is a loopback name or a private/reserved IP literal.
pub fn is_private_host(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => {
            let name = name.trim_end_matches('.').to_ascii_lowercase();
            name == "localhost" || name.ends_with(".localhost")
        }
        Host::Ipv4(v4) => is_private_v4(*v4),
        Host::Ipv6(v6) => is_private_v6(*v6),
    }
}

/// Returns `true` if `ip` is a private, loopback, link-local or otherwise
/// non-routable address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_private_v4(v4),
        IpAddr::V6(v6) => is_private_v6(v6),
    }
}

fn is_private_v4(v4: Ipv4Addr) -> bool {
    let o = v4.octets();
    matches!(o, [127, ..] | [10, ..] | [169, 254, ..] | [192, 168, ..] | [0, ..] | [255, 255, 255, 255])
        || (o[0] == 172 && (16..=31).contains(&o[1]))
        || (o[0] == 100 && (64..=127).contains(&o[1]))
}

fn is_private_v6(v6: Ipv6Addr) -> bool {
    if let Some(mapped) = v6.to_ipv4_mapped() {
        return is_private_v4(mapped);
    }
    v6.is_loopback()
        || v6.is_unspecified()
        || (v6.segments()[0] & 0xfe00 == 0xfc00)
        || (v6.segments()[0] & 0xffc0 == 0xfe80)
}
