// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// Two subcommands:
// - index:   fetch a sitemap index, then crawl every child sitemap it lists
// - sitemap: fetch a single leaf sitemap
//
// Options shared by both (timeout, TLS, verbosity) are declared `global`
// so they can be given before or after the subcommand.
//
// Rust concepts:
// - Derive macros: clap generates the parser from these types
// - Enums with fields: each subcommand carries its own arguments
// =============================================================================

use clap::{Parser, Subcommand};
use sitemap_harvest::FetchOptions;

// The whole CLI: one subcommand plus the options shared by both
//
// #[derive(Parser)] tells clap to generate the parsing code
#[derive(Parser, Debug)]
#[command(
    name = "sitemap-harvest",
    version,
    about = "Harvest every page URL listed by a sitemap index",
    long_about = "sitemap-harvest fetches a sitemap index, then fetches and decodes all of its child \
                  sitemaps concurrently (gzip included) and prints every page entry it finds."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Per-request timeout in seconds, body download included
    #[arg(long, global = true, default_value_t = 10)]
    pub timeout: u64,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Log at debug level (RUST_LOG overrides this)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// The subcommands (index, sitemap)
//
// The fields of each variant become that subcommand's arguments
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a sitemap index and crawl all of its child sitemaps
    ///
    /// Example: sitemap-harvest index https://example.com/sitemap_index.xml --workers 16
    Index {
        /// URL of the sitemap index
        index_url: String,

        /// Number of concurrent workers fetching child sitemaps
        #[arg(long, default_value_t = 8)]
        workers: usize,

        /// Print entries as they are decoded instead of after the crawl
        #[arg(long)]
        stream: bool,

        /// Output JSON (one object per line with --stream)
        #[arg(long)]
        json: bool,
    },

    /// Fetch a single leaf sitemap
    ///
    /// Example: sitemap-harvest sitemap https://example.com/sitemap-posts.xml.gz
    Sitemap {
        /// URL of the sitemap
        sitemap_url: String,

        /// Output JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    // Translates the global flags into transport settings
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_timeout_secs(self.timeout)
            .skip_tls_verify(self.insecure)
    }
}
