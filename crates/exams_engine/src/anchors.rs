use scraper::{Html, Selector};
use url::Url;

const DEFAULT_MAX_ANCHORS: usize = 5_000;

/// One `<a href>` found on a page: the raw target and its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub href: String,
    pub text: String,
}

/// "List anchors from a page". Discovery depends only on this.
pub trait AnchorSource: Send + Sync {
    fn anchors(&self, html: &str) -> Vec<Anchor>;
}

/// Anchor listing backed by `scraper`.
///
/// Text is the concatenation of the anchor's text nodes with runs of
/// whitespace collapsed to one space. Anchors beyond the limit are dropped.
#[derive(Debug, Clone, Copy)]
pub struct HtmlAnchorExtractor {
    max_anchors: usize,
}

impl HtmlAnchorExtractor {
    pub fn new() -> Self {
        Self::with_max_anchors(DEFAULT_MAX_ANCHORS)
    }

    pub fn with_max_anchors(max_anchors: usize) -> Self {
        Self { max_anchors }
    }
}

impl Default for HtmlAnchorExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl AnchorSource for HtmlAnchorExtractor {
    fn anchors(&self, html: &str) -> Vec<Anchor> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };
        let document = Html::parse_document(html);
        let anchors = document
            .select(&selector)
            .filter_map(|element| {
                let href = element.value().attr("href")?.trim();
                if href.is_empty() {
                    return None;
                }
                let text = element
                    .text()
                    .flat_map(str::split_whitespace)
                    .collect::<Vec<_>>()
                    .join(" ");
                Some(Anchor {
                    href: href.to_string(),
                    text,
                })
            })
            .take(self.max_anchors)
            .collect();
        anchors
    }
}

/// Resolve a link target against the page it was found on.
///
/// Fragment-only, query-only and `javascript:` references resolve to nothing.
pub fn resolve_url(reference: &str, base: &Url) -> Option<Url> {
    let trimmed = reference.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with('#') || lower.starts_with('?') || lower.starts_with("javascript:") {
        return None;
    }
    let mut url = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(_) => base.join(trimmed).ok()?,
    };
    url.set_fragment(None);
    Some(url)
}
