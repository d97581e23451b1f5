use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

use crate::domain::models::{Document, Heading, Link, PageSnapshot};

/// Pure HTML → [`Document`] extraction. No I/O, no clock, no randomness.
pub struct PageExtractor;

impl PageExtractor {
    /// Parse `raw_html` fetched from `base_url` into a normalized document.
    pub fn extract(raw_html: &str, base_url: &str) -> Document {
        let html = Html::parse_document(raw_html);
        let base = Url::parse(base_url).ok();

        Document {
            url: base
                .as_ref()
                .map(|u| u.to_string())
                .unwrap_or_else(|| base_url.to_string()),
            title: Self::extract_title(&html),
            headings: Self::extract_headings(&html),
            links: Self::extract_links(&html, base.as_ref()),
            ..Default::default()
        }
    }

    /// Extract from a fetcher snapshot, preferring the HTML `<title>` and
    /// falling back to the title the fetcher reported.
    pub fn extract_snapshot(snapshot: &PageSnapshot) -> Document {
        let mut doc = Self::extract(&snapshot.html, &snapshot.final_url);
        if doc.title.is_none() {
            doc.title = snapshot
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
        }
        doc.screenshot = snapshot.screenshot.clone();
        doc
    }

    pub fn extract_title(html: &Html) -> Option<String> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("title").unwrap());
        html.select(selector)
            .next()
            .map(|el| visible_text(&el))
            .filter(|s| !s.is_empty())
    }

    /// All h1-h6 in document order. Headings with blank text are kept so the
    /// analyzer can report them.
    pub fn extract_headings(html: &Html) -> Vec<Heading> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("h1, h2, h3, h4, h5, h6").unwrap());

        html.select(selector)
            .filter_map(|element| {
                let level = element
                    .value()
                    .name()
                    .trim_start_matches('h')
                    .parse::<u8>()
                    .ok()
                    .filter(|l| (1..=6).contains(l))?;
                Some(Heading::new(level, visible_text(&element)))
            })
            .collect()
    }

    /// Anchors with a non-empty href, resolved against `base` and limited to
    /// http(s). Anchor text falls back to the resolved href.
    pub fn extract_links(html: &Html, base: Option<&Url>) -> Vec<Link> {
        static SELECTOR: OnceLock<Selector> = OnceLock::new();
        let selector = SELECTOR.get_or_init(|| Selector::parse("a[href]").unwrap());

        html.select(selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }

                let resolved = resolve_href(href, base)?;
                let text = visible_text(&element);
                let text = if text.is_empty() {
                    resolved.to_string()
                } else {
                    text
                };

                Some(Link::new(resolved.to_string(), text))
            })
            .collect()
    }
}

fn resolve_href(href: &str, base: Option<&Url>) -> Option<Url> {
    let resolved = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(resolved.scheme(), "http" | "https").then_some(resolved)
}

/// Element text with whitespace runs collapsed and ends trimmed.
fn visible_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
