// src/sitemap/mod.rs
// =============================================================================
// Sitemap documents: what they contain and how we read them.
//
// Submodules:
// - model: Entry / Image / Video and the per-document wrappers
// - decode: streaming XML -> Entry decoder
// - document: fetch + decode of a single index or leaf document
// =============================================================================

mod decode;
mod document;
mod model;

pub use decode::decode_entries;
pub use document::{fetch_document, fetch_index, fetch_sitemap, FetchedDocument};
pub use model::{DocumentKind, Entry, Image, SitemapDocument, SitemapIndex, Video};
