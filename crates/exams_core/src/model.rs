use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::sanitize::sanitize_segment;

/// On-disk year segment for sessions whose year could not be inferred.
pub const UNKNOWN_YEAR: &str = "Unknown Year";

/// Document types the harvester keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extension {
    Pdf,
    Zip,
    Docx,
}

impl Extension {
    pub const ALL: [Extension; 3] = [Extension::Pdf, Extension::Zip, Extension::Docx];

    pub fn as_str(self) -> &'static str {
        match self {
            Extension::Pdf => "pdf",
            Extension::Zip => "zip",
            Extension::Docx => "docx",
        }
    }

    /// Extension of the final segment of a URL path, if it is an allowed one.
    pub fn from_path(path: &str) -> Option<Self> {
        let last = path.rsplit('/').next().unwrap_or(path);
        let (stem, ext) = last.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(ext))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One listing sub-page: a single exam sitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub url: String,
    pub title: String,
    pub grade: String,
    pub year: Option<String>,
}

impl Session {
    pub fn year_label(&self) -> &str {
        self.year.as_deref().unwrap_or(UNKNOWN_YEAR)
    }
}

/// One downloadable document referenced from a session page.
///
/// The session is shared read-only between every file found on its page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileItem {
    pub url: String,
    pub filename: String,
    pub extension: Extension,
    pub session: Arc<Session>,
}

impl FileItem {
    /// `root/<grade>/<year>/<session title>/<filename>`, every segment sanitized.
    pub fn destination(&self, root: &Path) -> PathBuf {
        root.join(sanitize_segment(&self.session.grade))
            .join(sanitize_segment(self.session.year_label()))
            .join(sanitize_segment(&self.session.title))
            .join(sanitize_segment(&self.filename))
    }
}
