use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::feed::{MediaRef, RawEntry};

static IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img[src]").expect("static img selector is valid"));
static VIDEO: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("video[src], video source[src]").expect("static video selector is valid")
});

/// Pick the entry's media attachment. First match wins:
/// `<enclosure>`, `media:content`, `media:thumbnail`, `<link rel="enclosure">`,
/// then the first `<img>` or `<video>` in the description (or, when the
/// description is empty, the encoded content).
#[must_use]
pub fn resolve_media(entry: &RawEntry) -> Option<MediaRef> {
    entry
        .enclosure
        .clone()
        .or_else(|| entry.media_content.clone())
        .or_else(|| entry.media_thumbnail.clone())
        .or_else(|| entry.link_enclosure.clone())
        .or_else(|| {
            let html = if entry.description.is_empty() {
                &entry.content
            } else {
                &entry.description
            };
            embedded_media(html)
        })
}

fn embedded_media(html: &str) -> Option<MediaRef> {
    if !html.contains('<') {
        return None;
    }
    let fragment = Html::parse_fragment(html);
    let first_src = |selector: &Selector| {
        fragment
            .select(selector)
            .filter_map(|el| el.value().attr("src"))
            .map(str::trim)
            .find(|src| !src.is_empty())
            .map(str::to_string)
    };

    if let Some(url) = first_src(&IMG) {
        return Some(MediaRef {
            url,
            media_type: Some("image".to_string()),
        });
    }
    first_src(&VIDEO).map(|url| MediaRef {
        url,
        media_type: Some("video".to_string()),
    })
}
