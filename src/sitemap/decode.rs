// src/sitemap/decode.rs
// =============================================================================
// Streaming decoder: XML events in, `Entry` values out.
//
// We never parse the whole document into a tree. The reader pulls one
// event at a time from the (possibly decompressed) body; when it sees the
// start of an entry element (<url> or <sitemap>) it starts an
// `EntryBuilder`, feeds it the element's subtree, and emits the finished
// entry on the closing tag. Memory use is one entry at a time, whatever
// the size of the document.
//
// Element names are matched on their local part, so <image:loc> and <loc>
// are told apart by where they sit, not by their prefix:
//
//   <url>                      depth 0  (the entry itself)
//     <loc>                    depth 1  entry field
//     <image:image>            depth 1  starts an attachment
//       <image:loc>            depth 2  attachment field
//
// What stops the document and what does not:
// - a syntax error or a broken stream aborts it (the XML reader cannot
//   resynchronize); entries already emitted stay emitted
// - an entry with no <loc>, or with text we cannot unescape, is skipped
//   and reading carries on with the next one
//
// Rust concepts:
// - Generics with trait bounds: any `AsyncBufRead` body, any `FnMut(Entry)`
// - Option<T> as state: `current` is `Some` only inside an entry element
// - std::mem::take: moving a String out of a struct without cloning it
// =============================================================================

use std::io;

use quick_xml::events::Event;
use quick_xml::Reader;
use tokio::io::AsyncBufRead;
use tracing::debug;

use super::model::{DocumentKind, Entry, Image, Video};
use crate::error::{Result, SitemapError};
use crate::fetch::is_body_read_error;

/// Decodes every entry of `kind` from `reader`, calling `emit` once per
/// entry with a non-empty location, in document order.
///
/// `source_url` is stamped on each entry. Returns how many entries were
/// emitted. On a broken stream the entries already emitted stay emitted and
/// the error records how many there were.
pub async fn decode_entries<R, F>(
    reader: R,
    kind: DocumentKind,
    source_url: &str,
    mut emit: F,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    F: FnMut(Entry),
{
    // <url> for a leaf sitemap, <sitemap> for an index
    let tag = kind.entry_tag();

    // Whitespace between elements produces no Text events
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    // quick-xml borrows each event from `buf`; it is cleared after every
    // event so it only ever holds one
    let mut buf = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut emitted = 0;

    loop {
        // Pull the next event; this is where the body is actually read
        // from the network, so transport failures surface here too
        match xml
            .read_event_into_async(&mut buf)
            .await
            .map_err(|e| classify(source_url, emitted, e))?
        {
            Event::Start(e) => {
                // Inside an entry every start tag goes to the builder;
                // outside one we only care about the entry tag itself
                let name = local_name(e.local_name().into_inner());
                match current.as_mut() {
                    Some(builder) => builder.open(name),
                    None if name == tag => current = Some(EntryBuilder::default()),
                    None => {}
                }
            }
            Event::Text(e) => {
                if let Some(builder) = current.as_mut() {
                    // An unknown entity such as &nbsp; is well-formed XML;
                    // only this entry is lost, not the rest of the document
                    match e.unescape() {
                        Ok(text) => builder.push_text(&text),
                        Err(err) => {
                            debug!(url = source_url, error = %err, "skipping <{tag}> with bad text");
                            builder.reject();
                        }
                    }
                }
            }
            Event::CData(e) => {
                // CDATA is taken verbatim, no unescaping
                if let Some(builder) = current.as_mut() {
                    builder.push_text(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(e) => {
                // `close` returns true only for the end tag of the entry
                // itself; that is the one point where an entry is emitted
                let name = local_name(e.local_name().into_inner());
                if current.as_mut().is_some_and(|b| b.close(name)) {
                    if let Some(entry) = current.take().and_then(|b| b.finish(source_url)) {
                        emitted += 1;
                        emit(entry);
                    } else {
                        debug!(url = source_url, "skipping <{tag}> with no usable <loc>");
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(emitted)
}

// In-progress attachment of the entry being built
enum Attachment {
    Image(Image),
    Video(Video),
}

#[derive(Default)]
struct EntryBuilder {
    entry: Entry,
    // open elements below the entry element
    depth: usize,
    attachment: Option<Attachment>,
    // local name of the innermost open element and the text seen inside it
    field: Option<String>,
    text: String,
    // set when some text in the entry could not be unescaped
    rejected: bool,
}

impl EntryBuilder {
    fn open(&mut self, name: &str) {
        self.depth += 1;
        // <image:image> / <video:video> directly under the entry start an
        // attachment; their children fill it in
        if self.depth == 1 {
            match name {
                "image" => self.attachment = Some(Attachment::Image(Image::default())),
                "video" => self.attachment = Some(Attachment::Video(Video::default())),
                _ => {}
            }
        }
        self.field = Some(name.to_string());
        self.text.clear();
    }

    fn reject(&mut self) {
        self.rejected = true;
    }

    fn push_text(&mut self, text: &str) {
        if self.field.is_some() {
            self.text.push_str(text);
        }
    }

    /// Handles a closing tag; true when it closes the entry element itself
    fn close(&mut self, name: &str) -> bool {
        if self.depth == 0 {
            return true;
        }
        let depth = self.depth;
        self.depth -= 1;

        let value = self.take_value(name);

        // Where the value goes depends on how deep the closed element was:
        // 1 = a field of the entry (or the end of an attachment),
        // 2 = a field of the current attachment, deeper = ignored
        match depth {
            1 if matches!(name, "image" | "video") && self.attachment.is_some() => {
                self.finish_attachment();
            }
            1 => {
                if let Some(value) = value {
                    self.set_entry_field(name, value);
                }
            }
            2 => {
                if let (Some(attachment), Some(value)) = (self.attachment.as_mut(), value) {
                    attachment.set_field(name, value);
                }
            }
            _ => {}
        }
        false
    }

    // Trimmed text of the element being closed, if it was the one collecting
    fn take_value(&mut self, name: &str) -> Option<String> {
        let field = self.field.take();
        let text = std::mem::take(&mut self.text);
        if field.as_deref() != Some(name) {
            return None;
        }
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn set_entry_field(&mut self, name: &str, value: String) {
        match name {
            "loc" => self.entry.location = value,
            "lastmod" => self.entry.last_modified = Some(value),
            "changefreq" => self.entry.change_frequency = Some(value),
            "priority" => match value.parse::<f64>() {
                Ok(priority) => self.entry.priority = Some(priority),
                Err(_) => debug!(value = %value, "ignoring unparsable <priority>"),
            },
            _ => {}
        }
    }

    fn finish_attachment(&mut self) {
        match self.attachment.take() {
            Some(Attachment::Image(image)) if !image.location.is_empty() => {
                self.entry.images.push(image)
            }
            Some(Attachment::Video(video)) if !video.is_empty() => self.entry.videos.push(video),
            _ => {}
        }
    }

    /// The finished entry, or None when it must not be emitted
    fn finish(self, source_url: &str) -> Option<Entry> {
        if self.rejected {
            return None;
        }
        let entry = Entry {
            source_sitemap_url: source_url.to_string(),
            ..self.entry
        };
        entry.is_valid().then_some(entry)
    }
}

impl Attachment {
    fn set_field(&mut self, name: &str, value: String) {
        match self {
            Attachment::Image(image) => match name {
                "loc" => image.location = value,
                "title" => image.title = Some(value),
                "caption" => image.caption = Some(value),
                "geo_location" => image.geo_location = Some(value),
                "license" => image.license = Some(value),
                _ => {}
            },
            Attachment::Video(video) => {
                let slot = match name {
                    "thumbnail_loc" => &mut video.thumbnail_location,
                    "title" => &mut video.title,
                    "description" => &mut video.description,
                    "content_loc" => &mut video.content_location,
                    "player_loc" => &mut video.player_location,
                    "duration" => &mut video.duration,
                    "expiration_date" => &mut video.expiration_date,
                    "rating" => &mut video.rating,
                    "view_count" => &mut video.view_count,
                    "publication_date" => &mut video.publication_date,
                    "family_friendly" => &mut video.family_friendly,
                    "requires_subscription" => &mut video.requires_subscription,
                    "live" => &mut video.live,
                    _ => return,
                };
                *slot = Some(value);
            }
        }
    }
}

fn local_name(raw: &[u8]) -> &str {
    std::str::from_utf8(raw).unwrap_or("")
}

// Sorts a read failure into the error taxonomy.
//
// The reader sees one io::Error type for everything below it, so the kind
// alone cannot say who failed: a gzip decoder reports corrupt data with the
// same kind as a reset connection. Only errors tagged by the transport are
// transport errors; everything else (gzip, UTF-8, XML syntax) is a decode
// error.
fn classify(url: &str, emitted: usize, error: quick_xml::Error) -> SitemapError {
    match &error {
        quick_xml::Error::Io(io_err) if is_body_read_error(io_err) => {
            if io_err.kind() == io::ErrorKind::TimedOut {
                SitemapError::Timeout {
                    url: url.to_string(),
                }
            } else {
                SitemapError::Body {
                    url: url.to_string(),
                    emitted,
                    message: io_err.to_string(),
                }
            }
        }
        _ => decode_error(url, emitted, error),
    }
}

fn decode_error(url: &str, emitted: usize, error: impl std::fmt::Display) -> SitemapError {
    SitemapError::Decode {
        url: url.to_string(),
        emitted,
        message: error.to_string(),
    }
}
