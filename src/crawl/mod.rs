// src/crawl/mod.rs
// =============================================================================
// Crawling every child sitemap of an index with a bounded pool of workers.
//
// Two ways to receive the results:
// - crawl_index_collect: wait, then get every entry plus a per-URL report
// - crawl_index: entries are pushed into your sink as soon as they decode
//
// Both run the same worker pool; only the delivery differs.
// =============================================================================

mod pool;
mod sink;

pub use pool::{crawl_index, crawl_index_collect, CrawlOutput};
pub use sink::{callbacks, Callbacks, DocumentReport, EntrySink};
