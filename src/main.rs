// src/main.rs
// =============================================================================
// Entry point of the sitemap-harvest CLI.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (stderr, so stdout stays clean for --json)
// 3. Dispatch to the subcommand handler
// 4. Exit with a code: 0 = everything fetched, 1 = some child sitemaps
//    failed, 2 = fatal error (bad input, index not reachable)
//
// Rust concepts used:
// - async/await with #[tokio::main]: the crawl runs on the tokio runtime
// - anyhow::Context: attach "what we were doing" to library errors
// - Arc<AtomicUsize>: counters shared with closures that run on many tasks
// =============================================================================

// Module declarations
mod cli; // src/cli.rs - command-line parsing

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use sitemap_harvest::{
    callbacks, fetch_index, fetch_sitemap, CrawlOutput, DocumentReport, Entry, Transport,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Parse arguments first: --help and --version exit here
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Run the application and turn the outcome into an exit code
    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Logs go to stderr so that stdout carries only results.
// RUST_LOG, when set, wins over --verbose.
fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "sitemap_harvest=debug"
    } else {
        "sitemap_harvest=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// Builds the shared transport and dispatches on the subcommand
async fn run(cli: Cli) -> Result<i32> {
    // One transport for the whole run; every worker clones it
    let transport = Transport::new(cli.fetch_options()).context("failed to set up HTTP client")?;

    match cli.command {
        Commands::Index {
            index_url,
            workers,
            stream,
            json,
        } => handle_index(&transport, &index_url, workers, stream, json).await,
        Commands::Sitemap { sitemap_url, json } => {
            handle_sitemap(&transport, &sitemap_url, json).await
        }
    }
}

// Handles the 'index' subcommand
// Parameters:
//   index_url: URL of the <sitemapindex> document
//   workers: how many child sitemaps are fetched at once
//   stream: print entries as they decode instead of after the crawl
//   json: output JSON instead of a table
async fn handle_index(
    transport: &Transport,
    index_url: &str,
    workers: usize,
    stream: bool,
    json: bool,
) -> Result<i32> {
    eprintln!("🔍 Fetching sitemap index: {}", index_url);

    // The index itself must load; without it there is nothing to crawl
    let index = fetch_index(transport, index_url)
        .await
        .with_context(|| format!("could not read sitemap index {index_url}"))?;

    eprintln!(
        "📄 Found {} child sitemap(s) (HTTP {})",
        index.count(),
        index.status
    );

    if index.count() == 0 {
        return Ok(0);
    }

    if stream {
        // The sink closures run on worker tasks, so the counters they
        // update are atomics behind an Arc
        let failed = Arc::new(AtomicUsize::new(0));
        let failures = Arc::clone(&failed);
        let total = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&total);

        let sink = callbacks(
            move |entry: Entry| {
                counted.fetch_add(1, Ordering::Relaxed);
                print_entry_line(&entry, json);
            },
            move |report: &DocumentReport| {
                if !report.is_ok() {
                    failures.fetch_add(1, Ordering::Relaxed);
                }
            },
        );
        // Returns once every child sitemap has been processed
        index.stream_urls(transport, workers, sink).await;

        let failed = failed.load(Ordering::Relaxed);
        eprintln!(
            "📊 {} entries streamed, {} of {} sitemap(s) failed",
            total.load(Ordering::Relaxed),
            failed,
            index.count()
        );
        return Ok(if failed > 0 { 1 } else { 0 });
    }

    // Collecting mode: wait for the whole crawl, then print everything
    let output = index.collect_urls(transport, workers).await;
    print_crawl(&output, json)?;

    // Some children failing is a partial result, not a fatal error
    if output.failed().count() > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Handles the 'sitemap' subcommand
async fn handle_sitemap(transport: &Transport, sitemap_url: &str, json: bool) -> Result<i32> {
    eprintln!("🔍 Fetching sitemap: {}", sitemap_url);

    // A single document: any failure here is fatal
    let document = fetch_sitemap(transport, sitemap_url)
        .await
        .with_context(|| format!("could not read sitemap {sitemap_url}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&document)?);
    } else {
        print_table(&document.entries);
        eprintln!("📊 {} entries (HTTP {})", document.count(), document.status);
    }
    Ok(0)
}

// Prints the collected entries, then a summary of the child sitemaps on
// stderr (with the error of each one that failed)
fn print_crawl(output: &CrawlOutput, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    print_table(&output.entries);

    let failed: Vec<_> = output.failed().collect();
    eprintln!("📊 Summary:");
    eprintln!("   📋 Entries: {}", output.count);
    eprintln!("   ✅ Sitemaps OK: {}", output.documents.len() - failed.len());
    eprintln!("   ❌ Sitemaps failed: {}", failed.len());
    for report in failed {
        eprintln!(
            "      {} ({})",
            report.url,
            report.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}

// One line per entry for --stream
fn print_entry_line(entry: &Entry, json: bool) {
    if !json {
        print_row(entry);
        return;
    }
    match serde_json::to_string(entry) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!(url = %entry.location, error = %e, "could not serialize entry"),
    }
}

// Prints entries as a fixed-width table
fn print_table(entries: &[Entry]) {
    println!(
        "{:<60} {:<25} {:<10} {:<8}",
        "LOCATION", "LAST MODIFIED", "CHANGES", "PRIORITY"
    );
    println!("{}", "=".repeat(106));

    for entry in entries {
        print_row(entry);
    }
    println!();
}

// One table row; missing fields print as blanks
fn print_row(entry: &Entry) {
    let priority = entry
        .priority
        .map(|p| format!("{:.1}", p))
        .unwrap_or_default();

    println!(
        "{:<60} {:<25} {:<10} {:<8}",
        truncate(&entry.location, 57),
        entry.last_modified.as_deref().unwrap_or(""),
        entry.change_frequency.as_deref().unwrap_or(""),
        priority
    );
}

// Shortens long URLs for the table, on a char boundary
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text() {
        assert_eq!(truncate("https://x/a", 57), "https://x/a");
    }

    #[test]
    fn test_truncate_multibyte() {
        let long = "é".repeat(70);
        let short = truncate(&long, 57);
        assert_eq!(short.chars().count(), 60);
        assert!(short.ends_with("..."));
    }
}
