use std::collections::HashSet;
use std::sync::Arc;

use exams_core::{file_name_with_extension, EmitMessage, Extension, FileItem, Session};
use url::Url;

use crate::anchors::{resolve_url, AnchorSource};
use crate::decode::decode_page;
use crate::events::EventSink;
use crate::fetch::Fetcher;

/// Lists the downloadable documents of one session page.
pub struct SessionDiscoverer {
    fetcher: Arc<dyn Fetcher>,
    anchors: Arc<dyn AnchorSource>,
}

impl SessionDiscoverer {
    pub fn new(fetcher: Arc<dyn Fetcher>, anchors: Arc<dyn AnchorSource>) -> Self {
        Self { fetcher, anchors }
    }

    /// Fetch the session page and collect its documents. An unreachable page
    /// is reported and yields no files; the rest of the job carries on.
    pub async fn discover(&self, session: &Arc<Session>, sink: &dyn EventSink) -> Vec<FileItem> {
        sink.emit(EmitMessage::scan(format!("Scanning: {}", session.title)));

        let page = match self.fetcher.fetch(&session.url, sink).await {
            Ok(page) => page,
            Err(err) => {
                sink.emit(EmitMessage::warn(format!(
                    "Skipping session {}: {err}",
                    session.title
                )));
                return Vec::new();
            }
        };
        let Ok(base) = Url::parse(&page.metadata.final_url) else {
            return Vec::new();
        };
        let html = decode_page(&page.body, page.metadata.content_type.as_deref());
        self.files_on_page(&html, &base, session)
    }

    /// Documents linked from an already fetched session page.
    pub fn files_on_page(&self, html: &str, base: &Url, session: &Arc<Session>) -> Vec<FileItem> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for anchor in self.anchors.anchors(html) {
            let Some(url) = resolve_url(&anchor.href, base) else {
                continue;
            };
            let Some(extension) = Extension::from_path(url.path()) else {
                continue;
            };
            if !seen.insert(url.to_string()) {
                continue;
            }

            let raw_name = if anchor.text.trim().is_empty() {
                path_stem(&url)
            } else {
                anchor.text.clone()
            };
            files.push(FileItem {
                filename: file_name_with_extension(&raw_name, extension.as_str()),
                url: url.into(),
                extension,
                session: Arc::clone(session),
            });
        }

        files
    }
}

fn path_stem(url: &Url) -> String {
    let last = url.path().rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(last)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| last.to_string());
    match decoded.rsplit_once('.') {
        Some((stem, _)) => stem.to_string(),
        None => decoded,
    }
}
