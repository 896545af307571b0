// src/fetch/mod.rs
// =============================================================================
// Getting bytes off the wire.
//
// Submodules:
// - transport: one HTTP GET with a deadline, status + headers + body stream
// - content: transparent gzip decoding of that body stream
// =============================================================================

mod content;
mod transport;

pub use content::{decode_body, is_gzip, PlainBody};
pub(crate) use transport::is_body_read_error;
#[cfg(test)]
pub(crate) use transport::body_read_error;
pub use transport::{parse_http_url, FetchOptions, FetchedResponse, Transport};
