//! HTML-to-text helpers for feed bodies and fetched article pages.

use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Elements that never carry article text.
const NOISE_TAGS: &str = "script, style, noscript, iframe, svg, path, img, figure, aside, \
                          footer, header, nav, form, link, button, input";

static NOISE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(NOISE_TAGS).expect("static noise selector is valid"));

fn normalize_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reduce an HTML fragment to whitespace-normalised text. Entities are decoded.
#[must_use]
pub fn strip_html(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return normalize_whitespace(std::iter::once(html));
    }
    let fragment = Html::parse_fragment(html);
    normalize_whitespace(fragment.root_element().text())
}

/// Text of the first element matching `selector` once noise elements have
/// been removed from the page. `None` when nothing matches or the match is
/// empty.
#[must_use]
pub fn extract_selected_text(page: &str, selector: &Selector) -> Option<String> {
    let mut document = Html::parse_document(page);

    let noise: Vec<_> = document
        .root_element()
        .select(&NOISE)
        .map(|el| el.id())
        .collect();
    for id in noise {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }

    // Walk from the root so detached subtrees are not visited.
    let selected = document.root_element().select(selector).next()?;
    let text = normalize_whitespace(selected.text());
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_html_removes_tags_and_decodes_entities() {
        assert_eq!(
            strip_html("<p>Kabinet &amp; <b>Kamer</b></p>\n<p>eens</p>"),
            "Kabinet & Kamer eens"
        );
    }

    #[test]
    fn strip_html_passes_plain_text_through() {
        assert_eq!(strip_html("  plain   text "), "plain text");
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn extract_selected_text_drops_noise_inside_selection() {
        let page = r#"<html><head><style>.x{}</style></head><body>
            <header>Site header</header>
            <nav>Menu</nav>
            <div class="entry-content">
              <p>Eerste alinea.</p>
              <figure><img src="a.jpg"><figcaption>Foto</figcaption></figure>
              <script>track()</script>
              <p>Tweede alinea.</p>
              <form><button>Deel</button></form>
            </div>
            <footer>Footer</footer>
        </body></html>"#;
        let selector = Selector::parse("div.entry-content").unwrap();
        assert_eq!(
            extract_selected_text(page, &selector).as_deref(),
            Some("Eerste alinea. Tweede alinea.")
        );
    }

    #[test]
    fn extract_selected_text_takes_first_match() {
        let page = "<article><p>one</p></article><article><p>two</p></article>";
        let selector = Selector::parse("article").unwrap();
        assert_eq!(extract_selected_text(page, &selector).as_deref(), Some("one"));
    }

    #[test]
    fn extract_selected_text_is_none_without_match() {
        let selector = Selector::parse("div.missing").unwrap();
        assert!(extract_selected_text("<p>body</p>", &selector).is_none());
    }

    #[test]
    fn selection_inside_removed_element_is_not_found() {
        let page = "<aside><div class=\"body\">sidebar</div></aside>";
        let selector = Selector::parse("div.body").unwrap();
        assert!(extract_selected_text(page, &selector).is_none());
    }
}
