// src/fetch/content.rs
// =============================================================================
// Turns a raw body stream into a plain byte reader.
//
// If the headers say the body is gzip (either as the document type or as
// the transfer encoding) we wrap it in a streaming decompressor; otherwise
// the bytes pass through untouched. Nothing here buffers the whole body.
//
// A broken gzip stream is not swallowed: the decompressor returns an
// io::Error from the read that hit it, which the entry decoder reports.
//
// Rust concepts:
// - Box<dyn Trait>: both branches return the same `PlainBody` type
// - Adapters: StreamReader turns a Stream of Bytes into AsyncRead
// =============================================================================

use std::io;

use async_compression::tokio::bufread::GzipDecoder;
use bytes::Bytes;
use futures::stream::BoxStream;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_ENCODING, CONTENT_TYPE};
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::io::StreamReader;

/// Decoded body, ready for the XML reader
pub type PlainBody = Box<dyn AsyncBufRead + Send + Unpin>;

const GZIP_CONTENT_TYPES: [&str; 2] = ["application/gzip", "application/x-gzip"];
const GZIP_ENCODINGS: [&str; 2] = ["gzip", "x-gzip"];

/// Does this response carry a gzip-compressed body?
pub fn is_gzip(headers: &HeaderMap) -> bool {
    let content_type = media_type(headers, CONTENT_TYPE);
    let encoding = media_type(headers, CONTENT_ENCODING);

    content_type.is_some_and(|ct| GZIP_CONTENT_TYPES.contains(&ct.as_str()))
        || encoding.is_some_and(|enc| GZIP_ENCODINGS.contains(&enc.as_str()))
}

/// Wraps the body in a decompressor when the headers ask for it
pub fn decode_body(headers: &HeaderMap, body: BoxStream<'static, io::Result<Bytes>>) -> PlainBody {
    // From a stream of chunks to something the XML reader can pull from
    let raw = StreamReader::new(body);

    if is_gzip(headers) {
        let mut decoder = GzipDecoder::new(raw);
        // Concatenated .gz members are legal and show up in the wild
        decoder.multiple_members(true);
        Box::new(BufReader::new(decoder))
    } else {
        Box::new(raw)
    }
}

// Lower-cased header value without parameters ("text/xml; charset=utf-8" -> "text/xml")
fn media_type(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_compression::tokio::bufread::GzipEncoder;
    use futures::stream::{self, StreamExt};
    use reqwest::header::HeaderValue;
    use tokio::io::AsyncReadExt;

    fn headers(pairs: &[(HeaderName, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(name.clone(), HeaderValue::from_static(value));
        }
        map
    }

    fn body(chunks: Vec<Vec<u8>>) -> BoxStream<'static, io::Result<Bytes>> {
        stream::iter(chunks.into_iter().map(|c| Ok(Bytes::from(c)))).boxed()
    }

    async fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzipEncoder::new(data);
        let mut out = Vec::new();
        encoder.read_to_end(&mut out).await.unwrap();
        out
    }

    #[test]
    fn test_is_gzip_by_content_type() {
        assert!(is_gzip(&headers(&[(CONTENT_TYPE, "application/gzip")])));
        assert!(is_gzip(&headers(&[(CONTENT_TYPE, "application/x-gzip")])));
        assert!(is_gzip(&headers(&[(CONTENT_TYPE, "Application/GZIP; charset=binary")])));
    }

    #[test]
    fn test_is_gzip_by_encoding() {
        assert!(is_gzip(&headers(&[
            (CONTENT_TYPE, "application/xml"),
            (CONTENT_ENCODING, "gzip"),
        ])));
    }

    #[test]
    fn test_plain_xml_is_not_gzip() {
        assert!(!is_gzip(&headers(&[(CONTENT_TYPE, "application/xml")])));
        assert!(!is_gzip(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn test_plain_body_passes_through() {
        let plain = headers(&[(CONTENT_TYPE, "text/xml")]);
        let mut reader = decode_body(&plain, body(vec![b"<urlset>".to_vec(), b"</urlset>".to_vec()]));

        let mut out = String::new();
        reader.read_to_string(&mut out).await.unwrap();
        assert_eq!(out, "<urlset></urlset>");
    }

    #[tokio::test]
    async fn test_gzip_body_is_decompressed_across_chunks() {
        let xml = b"<urlset><url><loc>https://x/a</loc></url></urlset>";
        let compressed = gzip(xml).await;
        let (first, second) = compressed.split_at(compressed.len() / 2);

        let gz = headers(&[(CONTENT_TYPE, "application/gzip")]);
        let mut reader = decode_body(&gz, body(vec![first.to_vec(), second.to_vec()]));

        let mut out = Vec::new();
        reader.read_to_end(&mut out).await.unwrap();
        assert_eq!(out, xml);
    }

    #[tokio::test]
    async fn test_malformed_gzip_is_an_error() {
        let gz = headers(&[(CONTENT_TYPE, "application/gzip")]);
        let mut reader = decode_body(&gz, body(vec![b"definitely not gzip".to_vec()]));

        let mut out = Vec::new();
        assert!(reader.read_to_end(&mut out).await.is_err());
    }
}
