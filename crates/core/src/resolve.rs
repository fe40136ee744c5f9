//! Resolution of references found in a document against its final URL.
//!
//! Candidates that cannot become an absolute http(s) URL are dropped
//! (`None`), never passed through unchanged: this covers `data:` URIs,
//! `javascript:` links, and strings the URL parser rejects.

use url::Url;

/// Resolves `candidate` against `base`, the post-redirect document URL.
///
/// - `http://…` and `https://…` are returned unchanged.
/// - `//host/path` inherits the scheme of `base`.
/// - Anything else is joined per RFC 3986 §5.
///
/// # Example
///
/// ```rust
/// use readlog_core::resolve::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/a/b").unwrap();
/// assert_eq!(resolve("/img/x.jpg", &base).as_deref(), Some("https://example.com/img/x.jpg"));
/// assert_eq!(resolve("//cdn.example.com/x.jpg", &base).as_deref(), Some("https://cdn.example.com/x.jpg"));
/// ```
pub fn resolve(candidate: &str, base: &Url) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    if has_prefix_ignore_case(candidate, "http://") || has_prefix_ignore_case(candidate, "https://") {
        return Some(candidate.to_string());
    }

    if candidate.starts_with("//") {
        return Some(format!("{}:{}", base.scheme(), candidate));
    }

    if has_prefix_ignore_case(candidate, "data:") {
        return None;
    }

    let joined = base.join(candidate).ok()?;
    match joined.scheme() {
        "http" | "https" => Some(joined.into()),
        _ => None,
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/a/b", "/img/x.jpg", "https://example.com/img/x.jpg")]
    #[case("https://example.com", "//cdn.example.com/x.jpg", "https://cdn.example.com/x.jpg")]
    #[case("http://example.com/page", "//cdn.example.com/x.jpg", "http://cdn.example.com/x.jpg")]
    #[case("https://example.com/a/b", "img/x.jpg", "https://example.com/a/img/x.jpg")]
    #[case("https://example.com/a/b/", "img/x.jpg", "https://example.com/a/b/img/x.jpg")]
    #[case("https://example.com/a/b/c", "../x.jpg", "https://example.com/a/x.jpg")]
    #[case("https://example.com/path/", "https://other.com/image.jpg", "https://other.com/image.jpg")]
    #[case("https://example.com/", "  /padded.png  ", "https://example.com/padded.png")]
    #[case("https://example.com/a?q=1", "?page=2", "https://example.com/a?page=2")]
    fn test_resolves(#[case] base: &str, #[case] candidate: &str, #[case] expected: &str) {
        let base = Url::parse(base).unwrap();
        assert_eq!(resolve(candidate, &base).as_deref(), Some(expected));
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("data:image/png;base64,iVBORw0KGgo=")]
    #[case("DATA:image/gif;base64,R0lGOD")]
    #[case("javascript:void(0)")]
    #[case("mailto:someone@example.com")]
    fn test_drops_unresolvable(#[case] candidate: &str) {
        let base = Url::parse("https://example.com/a/b").unwrap();
        assert_eq!(resolve(candidate, &base), None);
    }

    #[test]
    fn test_absolute_url_returned_unchanged() {
        let base = Url::parse("https://example.com/").unwrap();
        let raw = "HTTPS://Other.com/Image.JPG";
        assert_eq!(resolve(raw, &base).as_deref(), Some(raw));
    }
}
