// src/crawl/sink.rs
// =============================================================================
// Where the streaming crawl delivers its results.
//
// Workers call the sink directly, from whichever task decoded the entry,
// so a sink must be safe to call concurrently (`Send + Sync`). Entries of
// different child sitemaps may interleave in any order.
//
// Any `Fn(Entry) + Send + Sync` closure is a sink. To also observe the
// per-document outcome (status, error), use `callbacks(on_entry, on_document)`
// or implement `EntrySink::document`.
//
// Rust concepts:
// - Traits with default methods: `document` is optional to implement
// - Blanket impls: every matching closure type implements `EntrySink`
// - Send + Sync bounds: required because workers share one sink
// =============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::error::SitemapError;
use crate::sitemap::{Entry, FetchedDocument};

/// Outcome of one child sitemap inside a crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    /// Present whenever a response arrived, including non-200 ones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Entries this document delivered to the caller
    pub entries: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentReport {
    pub(crate) fn new(
        url: &str,
        result: &Result<FetchedDocument, SitemapError>,
        delivered: usize,
    ) -> Self {
        // The error text is stored as a string so reports can be cloned
        // and serialized
        match result {
            Ok(doc) => Self {
                url: url.to_string(),
                final_url: Some(doc.final_url.clone()),
                status: Some(doc.status),
                entries: delivered,
                error: None,
            },
            Err(err) => Self {
                url: url.to_string(),
                final_url: None,
                status: err.status(),
                entries: delivered,
                error: Some(err.to_string()),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Receives entries (and optionally per-document reports) from crawl workers
pub trait EntrySink: Send + Sync {
    fn entry(&self, entry: Entry);

    /// Called once per child URL after it has been fully processed
    fn document(&self, _report: &DocumentReport) {}
}

// A plain closure only sees entries; reports go to the default no-op
impl<F> EntrySink for F
where
    F: Fn(Entry) + Send + Sync,
{
    fn entry(&self, entry: Entry) {
        self(entry)
    }
}

// Lets callers keep their own handle to a sink they pass in
impl<S> EntrySink for Arc<S>
where
    S: EntrySink + ?Sized,
{
    fn entry(&self, entry: Entry) {
        (**self).entry(entry)
    }

    fn document(&self, report: &DocumentReport) {
        (**self).document(report)
    }
}

/// Sink built from two closures
pub struct Callbacks<E, D> {
    on_entry: E,
    on_document: D,
}

pub fn callbacks<E, D>(on_entry: E, on_document: D) -> Callbacks<E, D>
where
    E: Fn(Entry) + Send + Sync,
    D: Fn(&DocumentReport) + Send + Sync,
{
    Callbacks {
        on_entry,
        on_document,
    }
}

impl<E, D> EntrySink for Callbacks<E, D>
where
    E: Fn(Entry) + Send + Sync,
    D: Fn(&DocumentReport) + Send + Sync,
{
    fn entry(&self, entry: Entry) {
        (self.on_entry)(entry)
    }

    fn document(&self, report: &DocumentReport) {
        (self.on_document)(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fetched(count: usize) -> FetchedDocument {
        FetchedDocument {
            url: "https://x/a.xml".to_string(),
            final_url: "https://x/b.xml".to_string(),
            status: 200,
            count,
        }
    }

    #[test]
    fn test_report_from_success() {
        let report = DocumentReport::new("https://x/a.xml", &Ok(fetched(4)), 4);
        assert!(report.is_ok());
        assert_eq!(report.status, Some(200));
        assert_eq!(report.final_url.as_deref(), Some("https://x/b.xml"));
        assert_eq!(report.entries, 4);
    }

    #[test]
    fn test_report_from_status_error() {
        let err = SitemapError::Status {
            url: "https://x/a.xml".to_string(),
            status: 500,
        };
        let report = DocumentReport::new("https://x/a.xml", &Err(err), 0);
        assert!(!report.is_ok());
        assert_eq!(report.status, Some(500));
        assert_eq!(report.entries, 0);
        assert!(report.error.unwrap().contains("500"));
    }

    #[test]
    fn test_closure_is_a_sink() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let sink = move |_entry: Entry| {
            counter.fetch_add(1, Ordering::SeqCst);
        };

        sink.entry(Entry::default());
        sink.entry(Entry::default());
        // default observer does nothing
        sink.document(&DocumentReport::new("https://x", &Ok(fetched(0)), 0));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_callbacks_see_documents() {
        let docs = Arc::new(AtomicUsize::new(0));
        let docs_seen = Arc::clone(&docs);
        let sink = Arc::new(callbacks(
            |_entry: Entry| {},
            move |_report: &DocumentReport| {
                docs_seen.fetch_add(1, Ordering::SeqCst);
            },
        ));

        sink.document(&DocumentReport::new("https://x", &Ok(fetched(1)), 1));
        assert_eq!(docs.load(Ordering::SeqCst), 1);
    }
}
