//! RSS 2.0, RSS 1.0 (RDF) and Atom parsing into [`RawEntry`] values.
//!
//! Elements are matched on their resolved namespace, not their prefix, so a
//! feed that binds Media RSS to `m:` instead of `media:` still parses.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;

use crate::error::IngestError;

const ATOM_NS: &[u8] = b"http://www.w3.org/2005/Atom";
const CONTENT_NS: &[u8] = b"http://purl.org/rss/1.0/modules/content/";
const DC_NS: &[u8] = b"http://purl.org/dc/elements/1.1/";
const MEDIA_NS: &[u8] = b"http://search.yahoo.com/mrss/";
const RSS1_NS: &[u8] = b"http://purl.org/rss/1.0/";

/// A media attachment referenced by an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    pub url: String,
    pub media_type: Option<String>,
}

/// One `<item>` or `<entry>` as written in the feed, before any date or
/// media interpretation. HTML fields are kept raw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    /// `content:encoded` (RSS) or `<content>` (Atom).
    pub content: String,
    pub published: Option<String>,
    pub updated: Option<String>,
    pub enclosure: Option<MediaRef>,
    pub media_content: Option<MediaRef>,
    pub media_thumbnail: Option<MediaRef>,
    /// `<link rel="enclosure" href=...>`
    pub link_enclosure: Option<MediaRef>,
}

impl RawEntry {
    /// Publication date text, falling back to Atom `<updated>`.
    #[must_use]
    pub fn date_text(&self) -> Option<&str> {
        self.published.as_deref().or(self.updated.as_deref())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Description,
    Content,
    Published,
    Updated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Entry,
    Field(Field),
    Link,
    Enclosure,
    MediaContent,
    MediaThumbnail,
    Other,
}

fn classify(ns: &ResolveResult<'_>, local: &[u8]) -> Tag {
    let ns = match ns {
        ResolveResult::Bound(Namespace(uri)) => Some(*uri),
        _ => None,
    };
    match (ns, local) {
        (None | Some(ATOM_NS | RSS1_NS), b"item" | b"entry") => Tag::Entry,
        (None | Some(ATOM_NS | RSS1_NS), b"title") => Tag::Field(Field::Title),
        (None | Some(ATOM_NS | RSS1_NS), b"link") => Tag::Link,
        (None | Some(RSS1_NS), b"description") | (Some(ATOM_NS), b"summary") => {
            Tag::Field(Field::Description)
        }
        (Some(CONTENT_NS), b"encoded") | (Some(ATOM_NS), b"content") => {
            Tag::Field(Field::Content)
        }
        (None, b"pubDate") | (Some(ATOM_NS), b"published") | (Some(DC_NS), b"date") => {
            Tag::Field(Field::Published)
        }
        (Some(ATOM_NS), b"updated") => Tag::Field(Field::Updated),
        (None, b"enclosure") => Tag::Enclosure,
        (Some(MEDIA_NS), b"content") => Tag::MediaContent,
        (Some(MEDIA_NS), b"thumbnail") => Tag::MediaThumbnail,
        _ => Tag::Other,
    }
}

fn attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
        .filter(|v| !v.is_empty())
}

fn media_ref(e: &BytesStart<'_>, default_type: Option<&str>) -> Option<MediaRef> {
    let url = attr(e, "url")?;
    let media_type = attr(e, "type")
        .or_else(|| attr(e, "medium"))
        .or_else(|| default_type.map(str::to_string));
    Some(MediaRef { url, media_type })
}

/// Record attribute-only elements (enclosures, media, Atom links).
/// Returns `true` when the element was a text-bearing `<link>`.
fn apply_attributes(entry: &mut RawEntry, tag: Tag, e: &BytesStart<'_>) -> bool {
    match tag {
        Tag::Enclosure if entry.enclosure.is_none() => entry.enclosure = media_ref(e, None),
        Tag::MediaContent if entry.media_content.is_none() => {
            entry.media_content = media_ref(e, None);
        }
        Tag::MediaThumbnail if entry.media_thumbnail.is_none() => {
            entry.media_thumbnail = media_ref(e, Some("image"));
        }
        Tag::Link => {
            let Some(href) = attr(e, "href") else {
                return true;
            };
            match attr(e, "rel").as_deref() {
                Some("enclosure") => {
                    if entry.link_enclosure.is_none() {
                        entry.link_enclosure = Some(MediaRef {
                            url: href,
                            media_type: attr(e, "type"),
                        });
                    }
                }
                None | Some("alternate") => {
                    if entry.link.is_empty() {
                        entry.link = href;
                    }
                }
                Some(_) => {}
            }
        }
        _ => {}
    }
    false
}

fn store(entry: &mut RawEntry, field: Field, text: String) {
    match field {
        Field::Title => entry.title = text,
        Field::Link => {
            if entry.link.is_empty() {
                entry.link = text;
            }
        }
        Field::Description => entry.description = text,
        Field::Content => entry.content = text,
        Field::Published => entry.published = Some(text).filter(|s| !s.is_empty()),
        Field::Updated => entry.updated = Some(text).filter(|s| !s.is_empty()),
    }
}

/// Parse an RSS or Atom document into its entries, in document order.
///
/// # Errors
///
/// Returns [`IngestError::Xml`] if the document is not well-formed XML.
pub fn parse_feed(xml: &str) -> Result<Vec<RawEntry>, IngestError> {
    let mut reader = NsReader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntry> = None;
    // Field being captured and the element depth it opened at.
    let mut capture: Option<(Field, usize)> = None;
    let mut text = String::new();
    let mut depth = 0usize;

    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                depth += 1;
                if capture.is_some() {
                    continue;
                }
                let tag = classify(&ns, e.local_name().as_ref());
                if tag == Tag::Entry {
                    current = Some(RawEntry::default());
                    continue;
                }
                let Some(entry) = current.as_mut() else {
                    continue;
                };
                let field = match tag {
                    Tag::Field(field) => Some(field),
                    Tag::Link => apply_attributes(entry, tag, &e).then_some(Field::Link),
                    _ => {
                        apply_attributes(entry, tag, &e);
                        None
                    }
                };
                if let Some(field) = field {
                    capture = Some((field, depth));
                    text.clear();
                }
            }
            (ns, Event::Empty(e)) => {
                if capture.is_some() {
                    continue;
                }
                if let Some(entry) = current.as_mut() {
                    let tag = classify(&ns, e.local_name().as_ref());
                    apply_attributes(entry, tag, &e);
                }
            }
            (_, Event::Text(t)) => {
                if capture.is_some() {
                    let chunk = t
                        .unescape()
                        .map(std::borrow::Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&chunk);
                }
            }
            (_, Event::CData(c)) => {
                if capture.is_some() {
                    if !text.is_empty() {
                        text.push(' ');
                    }
                    text.push_str(&String::from_utf8_lossy(c.as_ref()));
                }
            }
            (ns, Event::End(e)) => {
                if let Some((field, opened_at)) = capture {
                    if opened_at == depth {
                        if let Some(entry) = current.as_mut() {
                            store(entry, field, text.trim().to_string());
                        }
                        capture = None;
                    }
                } else if classify(&ns, e.local_name().as_ref()) == Tag::Entry {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                }
                depth = depth.saturating_sub(1);
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    Ok(entries)
}
