// Shared fixtures for the integration tests: sitemap XML builders, gzip
// helper and wiremock shortcuts.

#![allow(dead_code)]

use async_compression::tokio::bufread::GzipEncoder;
use sitemap_harvest::{FetchOptions, Transport};
use tokio::io::AsyncReadExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn urlset(locations: &[String]) -> String {
    let urls: String = locations
        .iter()
        .map(|loc| format!("  <url><loc>{loc}</loc><changefreq>daily</changefreq></url>\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{urls}</urlset>"
    )
}

pub fn sitemap_index(locations: &[String]) -> String {
    let sitemaps: String = locations
        .iter()
        .map(|loc| format!("  <sitemap><loc>{loc}</loc></sitemap>\n"))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <sitemapindex xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n{sitemaps}</sitemapindex>"
    )
}

/// `count` page URLs under `prefix`
pub fn pages(server: &MockServer, prefix: &str, count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}/{prefix}/page-{i}", server.uri()))
        .collect()
}

pub fn xml(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "application/xml")
}

pub async fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzipEncoder::new(data);
    let mut out = Vec::new();
    encoder.read_to_end(&mut out).await.unwrap();
    out
}

/// Serves `template` at `route`, expecting exactly `times` requests
pub async fn serve(server: &MockServer, route: &str, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

pub fn transport(timeout_secs: u64) -> Transport {
    Transport::new(FetchOptions::default().with_timeout_secs(timeout_secs)).unwrap()
}
