use std::collections::HashSet;
use std::sync::Arc;

use exams_core::{infer_grade, infer_session_year, sanitize_segment, Filters, Session};
use url::Url;

use crate::anchors::{resolve_url, AnchorSource};

const MIN_LINK_TEXT_CHARS: usize = 5;
const IGNORED_PREFIXES: &[&str] = &["mailto:", "#", "http://bit.ly", "https://bit.ly"];

/// Turns the top-level listing into exam sessions.
pub struct IndexDiscoverer {
    index_url: Url,
    anchors: Arc<dyn AnchorSource>,
}

impl IndexDiscoverer {
    pub fn new(index_url: Url, anchors: Arc<dyn AnchorSource>) -> Self {
        Self { index_url, anchors }
    }

    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Sessions on the listing page that pass `filters`, in page order, each
    /// URL at most once. A page without matching links yields nothing.
    pub fn discover(&self, html: &str, filters: &Filters) -> Vec<Session> {
        let mut seen = HashSet::new();
        let mut sessions = Vec::new();

        for anchor in self.anchors.anchors(html) {
            let href = anchor.href.trim();
            if IGNORED_PREFIXES
                .iter()
                .any(|prefix| href.to_ascii_lowercase().starts_with(prefix))
            {
                continue;
            }
            let Some(url) = resolve_url(href, &self.index_url) else {
                continue;
            };
            if !is_listing_page(&url) || url == self.index_url {
                continue;
            }
            if anchor.text.chars().count() < MIN_LINK_TEXT_CHARS {
                continue;
            }

            let url = String::from(url);
            let session = Session {
                grade: infer_grade(&format!("{} {}", anchor.text, href)),
                year: infer_session_year(&anchor.text, href),
                title: sanitize_segment(&anchor.text),
                url,
            };
            if !filters.accepts(&session) {
                continue;
            }
            if seen.insert(session.url.clone()) {
                sessions.push(session);
            }
        }

        sessions
    }
}

fn is_listing_page(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    path.ends_with(".htm") || path.ends_with(".html")
}
