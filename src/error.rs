// src/error.rs
// =============================================================================
// Error taxonomy for fetching and decoding sitemap documents.
//
// Two families matter to callers:
// - transport failures (timeout, connection, non-200 status, broken body)
// - decode failures (malformed gzip or XML)
//
// An element without a <loc> is not an error at all; the decoder just
// skips it.
//
// Rust concepts:
// - thiserror: derives Display and Error from the #[error(...)] attributes
// - #[source]: keeps the underlying reqwest error in the error chain
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SitemapError {
    /// The input is not an absolute http(s) URL
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// No response (or no complete body) before the deadline
    #[error("request to '{url}' timed out")]
    Timeout { url: String },

    /// Connection-level failure before a response arrived
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with something other than 200 OK
    #[error("'{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The connection broke while the body was being streamed
    #[error("reading body of '{url}' failed after {emitted} entries: {message}")]
    Body {
        url: String,
        emitted: usize,
        message: String,
    },

    /// Malformed gzip stream or XML document
    #[error("failed to decode '{url}' after {emitted} entries: {message}")]
    Decode {
        url: String,
        emitted: usize,
        message: String,
    },
}

impl SitemapError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, SitemapError::Timeout { .. })
    }

    /// True for every failure that happened on the wire rather than in parsing
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            SitemapError::Timeout { .. }
                | SitemapError::Transport { .. }
                | SitemapError::Status { .. }
                | SitemapError::Body { .. }
        )
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, SitemapError::Decode { .. })
    }

    /// HTTP status for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            SitemapError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Entries handed to the caller before the document failed
    pub fn emitted(&self) -> usize {
        match self {
            SitemapError::Body { emitted, .. } | SitemapError::Decode { emitted, .. } => *emitted,
            _ => 0,
        }
    }
}

pub type Result<T, E = SitemapError> = std::result::Result<T, E>;
