// src/sitemap/model.rs
// =============================================================================
// Typed records for what a sitemap document contains.
//
// The same `Entry` type is used for both document kinds:
// - in a sitemap index, each <sitemap> element is a child-sitemap reference
// - in a leaf sitemap (urlset), each <url> element is a page
//
// Values are built once by the decoder and never mutated afterwards.
//
// Rust concepts:
// - Option<T>: every field a sitemap may leave out
// - serde: `skip_serializing_if` keeps absent fields out of the JSON
// =============================================================================

use serde::Serialize;

/// Which kind of document we expect, and so which element marks one entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// `<sitemapindex>` listing `<sitemap>` children
    Index,
    /// `<urlset>` listing `<url>` pages
    Leaf,
}

impl DocumentKind {
    /// Local name of the element that holds one entry
    pub fn entry_tag(self) -> &'static str {
        match self {
            DocumentKind::Index => "sitemap",
            DocumentKind::Leaf => "url",
        }
    }
}

/// One discoverable page, or one child sitemap of an index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Entry {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_frequency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Image>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub videos: Vec<Video>,
    /// The document this entry was read from (after redirects)
    pub source_sitemap_url: String,
}

impl Entry {
    /// Only entries with a location are ever handed out
    pub fn is_valid(&self) -> bool {
        !self.location.is_empty()
    }
}

/// `<image:image>` attachment
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Image {
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geo_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// `<video:video>` attachment. Every field is passed through as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Video {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_friendly: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_subscription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live: Option<String>,
}

impl Video {
    pub fn is_empty(&self) -> bool {
        *self == Video::default()
    }
}

/// A fetched `<sitemapindex>`
#[derive(Debug, Clone, Serialize)]
pub struct SitemapIndex {
    /// URL actually fetched (after redirects)
    pub url: String,
    pub status: u16,
    pub sitemaps: Vec<Entry>,
}

impl SitemapIndex {
    pub fn count(&self) -> usize {
        self.sitemaps.len()
    }

    /// Child sitemap locations in document order
    pub fn child_urls(&self) -> Vec<String> {
        self.sitemaps
            .iter()
            .filter(|e| e.is_valid())
            .map(|e| e.location.clone())
            .collect()
    }
}

/// A fetched leaf `<urlset>`
#[derive(Debug, Clone, Serialize)]
pub struct SitemapDocument {
    pub url: String,
    pub status: u16,
    pub entries: Vec<Entry>,
}

impl SitemapDocument {
    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_tags() {
        assert_eq!(DocumentKind::Index.entry_tag(), "sitemap");
        assert_eq!(DocumentKind::Leaf.entry_tag(), "url");
    }

    #[test]
    fn test_child_urls_keep_order() {
        let index = SitemapIndex {
            url: "https://example.com/index.xml".to_string(),
            status: 200,
            sitemaps: vec![
                Entry {
                    location: "https://example.com/b.xml".to_string(),
                    ..Entry::default()
                },
                Entry {
                    location: "https://example.com/a.xml".to_string(),
                    ..Entry::default()
                },
            ],
        };

        assert_eq!(index.count(), 2);
        assert_eq!(
            index.child_urls(),
            vec!["https://example.com/b.xml", "https://example.com/a.xml"]
        );
    }

    #[test]
    fn test_json_skips_missing_fields() {
        let entry = Entry {
            location: "https://x/a".to_string(),
            source_sitemap_url: "https://x/sitemap.xml".to_string(),
            ..Entry::default()
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "location": "https://x/a",
                "source_sitemap_url": "https://x/sitemap.xml"
            })
        );
    }
}
