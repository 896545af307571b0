// src/sitemap/document.rs
// =============================================================================
// Fetch one document, produce N entries.
//
// Transport -> content decoder -> entry decoder, in one call. A transport
// failure or a non-200 status stops here with zero entries; otherwise the
// entries stream out through `emit` while the body is still arriving.
//
// The body stream is owned by the decoder future, so it is closed whenever
// that future finishes, fails, or is dropped.
//
// Rust concepts:
// - FnMut closures: `emit` may push into a Vec the caller owns
// - Ownership: `into_body()` consumes the response, so the body cannot be
//   read twice
// =============================================================================

use serde::Serialize;
use tracing::debug;

use super::decode::decode_entries;
use super::model::{DocumentKind, Entry, SitemapDocument, SitemapIndex};
use crate::error::{Result, SitemapError};
use crate::fetch::{decode_body, Transport};

/// What a successful fetch produced, besides the entries themselves
#[derive(Debug, Clone, Serialize)]
pub struct FetchedDocument {
    /// URL we were asked for
    pub url: String,
    /// URL the entries are attributed to (after redirects)
    pub final_url: String,
    pub status: u16,
    pub count: usize,
}

/// Fetches `url` and hands each decoded entry to `emit`, in document order
pub async fn fetch_document<F>(
    transport: &Transport,
    url: &str,
    kind: DocumentKind,
    emit: F,
) -> Result<FetchedDocument>
where
    F: FnMut(Entry),
{
    // Status and headers only; the body is still on the wire
    let response = transport.get(url).await?;

    // Anything but 200 stops here, before a single body byte is read
    if !response.is_ok() {
        return Err(SitemapError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }

    // Copy what we need out of the response before consuming it
    let status = response.status;
    let final_url = response.final_url.clone();
    let headers = response.headers.clone();
    let body = decode_body(&headers, response.into_body());

    // Entries are attributed to the URL we ended up at after redirects
    let count = decode_entries(body, kind, &final_url, emit).await?;
    debug!(url = %final_url, ?kind, count, "decoded document");

    Ok(FetchedDocument {
        url: url.to_string(),
        final_url,
        status,
        count,
    })
}

/// Fetches and materializes a `<sitemapindex>`
pub async fn fetch_index(transport: &Transport, url: &str) -> Result<SitemapIndex> {
    let mut sitemaps = Vec::new();
    let fetched = fetch_document(transport, url, DocumentKind::Index, |e| sitemaps.push(e)).await?;

    Ok(SitemapIndex {
        url: fetched.final_url,
        status: fetched.status,
        sitemaps,
    })
}

/// Fetches and materializes a leaf `<urlset>`
pub async fn fetch_sitemap(transport: &Transport, url: &str) -> Result<SitemapDocument> {
    let mut entries = Vec::new();
    let fetched = fetch_document(transport, url, DocumentKind::Leaf, |e| entries.push(e)).await?;

    Ok(SitemapDocument {
        url: fetched.final_url,
        status: fetched.status,
        entries,
    })
}
