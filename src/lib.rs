//! Sitemap harvesting: fetch a sitemap index, then fetch and decode every
//! child sitemap concurrently into a flat list of page entries.
//!
//! ```no_run
//! use sitemap_harvest::{fetch_index, FetchOptions, Transport};
//!
//! # async fn run() -> Result<(), sitemap_harvest::SitemapError> {
//! let transport = Transport::new(FetchOptions::default().with_timeout_secs(5))?;
//! let index = fetch_index(&transport, "https://example.com/sitemap_index.xml").await?;
//! let output = index.collect_urls(&transport, 8).await;
//! println!("{} pages", output.count);
//! # Ok(())
//! # }
//! ```

pub mod crawl;
pub mod error;
pub mod fetch;
pub mod sitemap;

pub use crawl::{callbacks, crawl_index, crawl_index_collect, CrawlOutput, DocumentReport, EntrySink};
pub use error::{Result, SitemapError};
pub use fetch::{FetchOptions, Transport};
pub use sitemap::{
    fetch_document, fetch_index, fetch_sitemap, DocumentKind, Entry, FetchedDocument, Image,
    SitemapDocument, SitemapIndex, Video,
};
