//! Error types for preview operations.
//!
//! This module defines [`PreviewError`], the closed set of failures the
//! preview engine can report, and [`ErrorKind`], its flat serializable
//! discriminant.
//!
//! # Example
//!
//! ```rust
//! use readlog_core::{ErrorKind, PreviewError};
//!
//! let err = PreviewError::HttpError { status: 404 };
//! assert_eq!(err.kind(), ErrorKind::HttpError);
//! assert!(err.to_string().contains("404"));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for preview operations.
///
/// Every failure between receiving a raw URL and producing a preview is
/// classified into one of these variants. Transport errors from reqwest are
/// never exposed directly; see [`PreviewError::from_transport`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// The candidate string is not a fetchable absolute http(s) URL.
    ///
    /// The payload names the specific violation (empty, missing scheme,
    /// unsupported scheme, missing host, private address).
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// No complete response arrived within the configured bound.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// DNS, TCP or TLS failure before any response was received.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A response arrived carrying a 4xx/5xx status.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// The caller aborted the request before it completed.
    #[error("Preview request was cancelled")]
    Cancelled,

    /// Anything not covered above: oversized body, unexpected content type,
    /// redirect failures, decode failures, internal faults.
    #[error("{0}")]
    Other(String),
}

/// Flat discriminant of [`PreviewError`], as surfaced in preview records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    ConnectionFailed,
    HttpError,
    Cancelled,
    Other,
}

impl PreviewError {
    /// Returns the flat kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PreviewError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            PreviewError::Timeout { .. } => ErrorKind::Timeout,
            PreviewError::ConnectionFailed(_) => ErrorKind::ConnectionFailed,
            PreviewError::HttpError { .. } => ErrorKind::HttpError,
            PreviewError::Cancelled => ErrorKind::Cancelled,
            PreviewError::Other(_) => ErrorKind::Other,
        }
    }

    /// Classifies a reqwest error into the closed taxonomy.
    ///
    /// `timeout` is the configured bound in seconds, reported back in
    /// [`PreviewError::Timeout`].
    pub fn from_transport(err: &reqwest::Error, timeout: u64) -> Self {
        if err.is_timeout() {
            PreviewError::Timeout { timeout }
        } else if err.is_connect() {
            PreviewError::ConnectionFailed(root_cause(err))
        } else if let Some(status) = err.status() {
            PreviewError::HttpError { status: status.as_u16() }
        } else if err.is_redirect() {
            PreviewError::Other(format!("Redirect failed: {}", root_cause(err)))
        } else if err.is_body() || err.is_decode() {
            PreviewError::Other(format!("Failed to read response body: {}", root_cause(err)))
        } else {
            PreviewError::Other(format!("Request failed: {}", root_cause(err)))
        }
    }
}

/// Walks the source chain and returns the innermost message, which is the
/// one that names the actual cause (e.g. "Connection refused").
fn root_cause(err: &(dyn std::error::Error + 'static)) -> String {
    let mut current = err;
    while let Some(source) = current.source() {
        current = source;
    }
    current.to_string()
}

/// Result type alias for PreviewError.
pub type Result<T> = std::result::Result<T, PreviewError>;
