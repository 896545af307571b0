// src/crawl/pool.rs
// =============================================================================
// The crawl pipeline: a fixed pool of workers draining a finite job queue.
//
// How it works:
// 1. Create a job queue sized to hold every child-sitemap URL
// 2. Start exactly `workers` tasks; each one loops "take a URL, fetch and
//    decode it as a leaf sitemap, deliver the entries"
// 3. Push every URL into the queue, then close it
// 4. Workers exit once the queue is closed and empty
//
// Delivery is the only thing that differs between the two public forms:
// - streaming: each entry goes straight to the caller's sink from the
//   worker that decoded it; we return once every worker has finished
// - collecting: each worker sends one batch per URL (empty on failure) to a
//   results channel; we return after one batch per URL has arrived
//
// A failing child sitemap is logged and reported, never fatal. There is no
// way to cancel a crawl once started: every queued URL is attempted, each
// bounded only by the transport timeout.
//
// Rust concepts:
// - tokio::sync::mpsc: bounded channels for jobs in and batches out
// - Arc<Mutex<Receiver>>: several tasks sharing one receiving end
// - JoinSet: owns the spawned workers and lets us wait for all of them
// - Trait objects: `Arc<dyn EntrySink>` so every worker calls the same sink
// =============================================================================

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::sink::{DocumentReport, EntrySink};
use crate::error::Result;
use crate::fetch::Transport;
use crate::sitemap::{fetch_document, DocumentKind, Entry, FetchedDocument, SitemapIndex};

/// Everything a collecting crawl gathered
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlOutput {
    /// Always equal to `entries.len()`
    pub count: usize,
    pub entries: Vec<Entry>,
    /// One report per child URL, in completion order
    pub documents: Vec<DocumentReport>,
}

impl CrawlOutput {
    pub fn failed(&self) -> impl Iterator<Item = &DocumentReport> {
        self.documents.iter().filter(|d| !d.is_ok())
    }
}

// One child URL's worth of results for the collecting form
struct Batch {
    report: DocumentReport,
    entries: Vec<Entry>,
}

#[derive(Clone)]
enum Delivery {
    Stream(Arc<dyn EntrySink>),
    Collect(mpsc::Sender<Batch>),
}

// Shared by all workers; the mutex turns the single-consumer channel into a
// work queue where whichever worker is free takes the next URL.
type JobQueue = Arc<Mutex<mpsc::Receiver<String>>>;

/// Streams every entry of every child sitemap into `sink`.
///
/// Returns once all workers have drained the queue and finished their last
/// fetch. No ordering is promised between entries of different children.
pub async fn crawl_index<S>(transport: &Transport, child_urls: Vec<String>, workers: usize, sink: S)
where
    S: EntrySink + 'static,
{
    // Nothing to fetch, nothing to spawn
    let total = child_urls.len();
    if total == 0 {
        return;
    }
    let workers = worker_count(workers);
    info!(sitemaps = total, workers, "streaming child sitemaps");

    // The sink is shared by every worker, so it goes behind an Arc
    let mut pool = start_pool(transport, child_urls, workers, Delivery::Stream(Arc::new(sink))).await;

    // Entries have been delivered as they decoded; all that is left is to
    // wait until the last worker returns
    wait_for_workers(&mut pool).await;

    info!(sitemaps = total, "crawl finished");
}

/// Fetches every child sitemap and returns all their entries at once
pub async fn crawl_index_collect(
    transport: &Transport,
    child_urls: Vec<String>,
    workers: usize,
) -> CrawlOutput {
    let total = child_urls.len();
    if total == 0 {
        return CrawlOutput::default();
    }
    let workers = worker_count(workers);
    info!(sitemaps = total, workers, "collecting child sitemaps");

    // Room for one batch per URL, so a worker never waits on the collector
    let (results_tx, mut results_rx) = mpsc::channel(total);
    let mut pool = start_pool(transport, child_urls, workers, Delivery::Collect(results_tx)).await;

    // Every URL produces exactly one batch (empty on failure), so counting
    // batches tells us when the crawl is done
    let mut output = CrawlOutput::default();
    for _ in 0..total {
        // None only if every worker died before sending all batches
        let Some(batch) = results_rx.recv().await else {
            warn!(expected = total, received = output.documents.len(), "workers exited early");
            break;
        };
        output.count += batch.entries.len();
        output.entries.extend(batch.entries);
        output.documents.push(batch.report);
    }
    // Workers exit on their own once the queue is empty; join them so no
    // task outlives this call
    wait_for_workers(&mut pool).await;

    info!(
        sitemaps = total,
        entries = output.count,
        failed = output.failed().count(),
        "crawl finished"
    );
    output
}

impl SitemapIndex {
    /// Collecting crawl over this index's children
    pub async fn collect_urls(&self, transport: &Transport, workers: usize) -> CrawlOutput {
        crawl_index_collect(transport, self.child_urls(), workers).await
    }

    /// Streaming crawl over this index's children
    pub async fn stream_urls<S>(&self, transport: &Transport, workers: usize, sink: S)
    where
        S: EntrySink + 'static,
    {
        crawl_index(transport, self.child_urls(), workers, sink).await
    }
}

// Workers are started before the queue is filled; the sender is dropped on
// return, which closes the queue.
async fn start_pool(
    transport: &Transport,
    child_urls: Vec<String>,
    workers: usize,
    delivery: Delivery,
) -> JoinSet<()> {
    // Sized to hold every URL, so filling it below never blocks
    let (jobs_tx, jobs_rx) = mpsc::channel(child_urls.len().max(1));
    let jobs: JobQueue = Arc::new(Mutex::new(jobs_rx));

    // Each worker gets its own handle to the transport, the queue and the
    // delivery target
    let mut pool = JoinSet::new();
    for id in 1..=workers {
        pool.spawn(worker(id, transport.clone(), Arc::clone(&jobs), delivery.clone()));
    }

    // Only the workers may hold a results sender; otherwise the collector
    // could never see the channel close
    drop(delivery);

    for url in child_urls {
        if jobs_tx.send(url).await.is_err() {
            warn!("every worker exited before the queue was filled");
            break;
        }
    }

    pool
}

async fn worker(id: usize, transport: Transport, jobs: JobQueue, delivery: Delivery) {
    loop {
        // Hold the lock only while taking one URL; the guard is dropped at
        // the end of this statement, before the fetch starts
        let next = jobs.lock().await.recv().await;

        // None means the queue is closed and empty
        let Some(url) = next else {
            break;
        };
        debug!(worker = id, url = %url, "fetching child sitemap");

        match &delivery {
            Delivery::Stream(sink) => {
                // Entries go straight to the sink from inside the decoder
                let result =
                    fetch_document(&transport, &url, DocumentKind::Leaf, |entry| sink.entry(entry))
                        .await;
                // A document that broke halfway has still delivered the
                // entries before the break
                let delivered = match &result {
                    Ok(doc) => doc.count,
                    Err(err) => err.emitted(),
                };
                sink.document(&document_report(id, &url, &result, delivered));
            }
            Delivery::Collect(results) => {
                // Buffer this document's entries and send them as one batch
                let mut entries = Vec::new();
                let result =
                    fetch_document(&transport, &url, DocumentKind::Leaf, |entry| entries.push(entry))
                        .await;
                // a failed document contributes an empty batch
                if result.is_err() {
                    entries.clear();
                }
                let report = document_report(id, &url, &result, entries.len());

                // The collector went away; nobody is left to read results
                if results.send(Batch { report, entries }).await.is_err() {
                    break;
                }
            }
        }
    }
    debug!(worker = id, "queue drained");
}

fn document_report(
    id: usize,
    url: &str,
    result: &Result<FetchedDocument>,
    delivered: usize,
) -> DocumentReport {
    if let Err(err) = result {
        warn!(worker = id, url = %url, error = %err, "child sitemap failed");
    }
    DocumentReport::new(url, result, delivered)
}

// Completion barrier: returns when every spawned worker has finished.
// A panicking worker is logged and does not take the crawl down with it.
async fn wait_for_workers(pool: &mut JoinSet<()>) {
    while let Some(joined) = pool.join_next().await {
        if let Err(err) = joined {
            warn!(error = %err, "crawl worker panicked");
        }
    }
}

// A pool of zero workers would never drain the queue
fn worker_count(requested: usize) -> usize {
    if requested == 0 {
        warn!("worker count 0 requested, using 1");
        1
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::FetchOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_worker_count_never_zero() {
        assert_eq!(worker_count(0), 1);
        assert_eq!(worker_count(1), 1);
        assert_eq!(worker_count(500), 500);
    }

    #[tokio::test]
    async fn test_empty_input_returns_immediately() {
        let transport = Transport::new(FetchOptions::default()).unwrap();

        let output = crawl_index_collect(&transport, Vec::new(), 4).await;
        assert_eq!(output.count, 0);
        assert!(output.documents.is_empty());

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        crawl_index(&transport, Vec::new(), 4, move |_e: Entry| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_urls_still_produce_one_report_each() {
        let transport = Transport::new(FetchOptions::default()).unwrap();
        let urls = vec!["not a url".to_string(), "ftp://x/a.xml".to_string()];

        let output = crawl_index_collect(&transport, urls, 3).await;
        assert_eq!(output.count, 0);
        assert_eq!(output.documents.len(), 2);
        assert_eq!(output.failed().count(), 2);
    }
}
