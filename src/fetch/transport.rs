// src/fetch/transport.rs
// =============================================================================
// Issues a single HTTP GET with a deadline and hands back the status, the
// headers and the body as a byte stream.
//
// The transport does not decide whether a status is fatal: a 404 or 500 is
// still a successful *fetch* here, and the caller looks at `status`.
// Dropping the returned response (or its body stream) closes it, so every
// exit path releases the connection.
//
// Body errors are tagged with `BodyReadError` before they leave this module.
// Everything stacked on top of the body (gzip, XML) also speaks io::Error,
// and the tag is how the decoder knows the connection failed rather than
// one of those layers.
//
// Rust concepts:
// - Builder pattern: `FetchOptions` setters take and return `self`
// - Streams: the body arrives as a `BoxStream` of `Bytes` chunks
// - Error downcasting: `io::Error::get_ref` + `is::<T>()` to find our tag
// =============================================================================

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt, TryStreamExt};
use reqwest::header::HeaderMap;
use reqwest::{Client, Response};
use url::Url;

use crate::error::{Result, SitemapError};

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const MAX_REDIRECTS: usize = 10;

/// Settings shared by every request of one crawl
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Hard deadline for a whole request, body included
    pub timeout: Duration,
    /// Accept invalid TLS certificates. Off unless asked for.
    pub skip_tls_verify: bool,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            skip_tls_verify: false,
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout(Duration::from_secs(secs))
    }

    pub fn skip_tls_verify(mut self, skip: bool) -> Self {
        self.skip_tls_verify = skip;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// A response whose headers have arrived but whose body is still on the wire
#[derive(Debug)]
pub struct FetchedResponse {
    pub status: u16,
    /// URL after any redirects the client followed
    pub final_url: String,
    pub headers: HeaderMap,
    response: Response,
}

impl FetchedResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Consumes the response into a stream of body chunks.
    ///
    /// A deadline hit mid-body surfaces as `io::ErrorKind::TimedOut` so the
    /// decoder can still tell a timeout from a broken document.
    pub fn into_body(self) -> BoxStream<'static, io::Result<Bytes>> {
        self.response.bytes_stream().map_err(body_error).boxed()
    }
}

/// HTTP GET with a deadline. Cheap to clone: clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new(options: FetchOptions) -> Result<Self> {
        // One client per transport; the timeout covers connect, headers
        // and the whole body
        let client = Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.skip_tls_verify)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(options.user_agent)
            .build()
            .map_err(SitemapError::Client)?;

        Ok(Self { client })
    }

    /// Sends the request and waits for the response head.
    ///
    /// Errors only when no response arrived at all; any status code,
    /// including 4xx/5xx, comes back as `Ok`.
    pub async fn get(&self, url: &str) -> Result<FetchedResponse> {
        // Reject anything that is not an absolute http(s) URL before any
        // network traffic happens
        let parsed = parse_http_url(url)?;

        // `send()` resolves once the status line and headers are in; the
        // body is left unread
        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| categorize_error(url, e))?;

        Ok(FetchedResponse {
            status: response.status().as_u16(),
            final_url: response.url().to_string(),
            headers: response.headers().clone(),
            response,
        })
    }
}

/// Accepts absolute http/https URLs only
pub fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| SitemapError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(SitemapError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn categorize_error(url: &str, error: reqwest::Error) -> SitemapError {
    if error.is_timeout() {
        SitemapError::Timeout {
            url: url.to_string(),
        }
    } else {
        SitemapError::Transport {
            url: url.to_string(),
            source: error,
        }
    }
}

// Same split as `categorize_error`, but for errors raised while the body is
// streaming. The kind keeps timeouts recognizable; the tag marks the error
// as the connection's.
fn body_error(error: reqwest::Error) -> io::Error {
    let kind = if error.is_timeout() {
        io::ErrorKind::TimedOut
    } else {
        io::ErrorKind::Other
    };
    body_read_error(kind, error)
}

/// Tag carried inside an `io::Error` raised by the connection itself
#[derive(Debug)]
pub(crate) struct BodyReadError(Box<dyn StdError + Send + Sync>);

impl fmt::Display for BodyReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for BodyReadError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.0)
    }
}

/// Wraps `error` as a connection failure of the given kind
pub(crate) fn body_read_error(
    kind: io::ErrorKind,
    error: impl Into<Box<dyn StdError + Send + Sync>>,
) -> io::Error {
    io::Error::new(kind, BodyReadError(error.into()))
}

/// True when `error` came from the connection, not from a decoder reading it
pub(crate) fn is_body_read_error(error: &io::Error) -> bool {
    error
        .get_ref()
        .is_some_and(|inner| inner.is::<BodyReadError>())
}
