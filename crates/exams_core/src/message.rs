use serde::Serialize;

/// Progress payloads carried by [`EmitMessage::Progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ProgressUpdate {
    /// Files found so far during discovery.
    Scanned { scanned: usize },
    /// Items resolved so far during the download phase.
    Transfer { done: usize, total: usize },
}

/// Terminal counts of one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Summary {
    #[serde(rename = "dl")]
    pub downloaded: usize,
    #[serde(rename = "skip")]
    pub skipped: usize,
    #[serde(rename = "fail")]
    pub failed: usize,
    #[serde(rename = "dry")]
    pub dryrun: usize,
    /// Set when the index page could not be fetched at all.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl Summary {
    pub fn fatal() -> Self {
        Self {
            fatal: true,
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed + self.dryrun
    }

    pub fn record(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Downloaded => self.downloaded += 1,
            ItemStatus::Skipped => self.skipped += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::DryRun => self.dryrun += 1,
        }
    }
}

/// Terminal status of a single file item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Downloaded,
    Skipped,
    Failed,
    DryRun,
}

/// One frame of the live progress feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmitMessage {
    Info { msg: String },
    Scan { msg: String },
    Download { msg: String },
    Warn { msg: String },
    Error { msg: String },
    DryRun { msg: String },
    Progress(ProgressUpdate),
    Done(Summary),
    Ping,
}

impl EmitMessage {
    pub fn info(msg: impl Into<String>) -> Self {
        Self::Info { msg: msg.into() }
    }

    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan { msg: msg.into() }
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download { msg: msg.into() }
    }

    pub fn warn(msg: impl Into<String>) -> Self {
        Self::Warn { msg: msg.into() }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error { msg: msg.into() }
    }

    pub fn dry_run(msg: impl Into<String>) -> Self {
        Self::DryRun { msg: msg.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Info { .. } => "info",
            Self::Scan { .. } => "scan",
            Self::Download { .. } => "download",
            Self::Warn { .. } => "warn",
            Self::Error { .. } => "error",
            Self::DryRun { .. } => "dryrun",
            Self::Progress(_) => "progress",
            Self::Done(_) => "done",
            Self::Ping => "ping",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// Free-text payload, for the message kinds that carry one.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Info { msg }
            | Self::Scan { msg }
            | Self::Download { msg }
            | Self::Warn { msg }
            | Self::Error { msg }
            | Self::DryRun { msg } => Some(msg),
            Self::Progress(_) | Self::Done(_) | Self::Ping => None,
        }
    }
}
