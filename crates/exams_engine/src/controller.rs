use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use engine_logging::{engine_error, engine_info};
use exams_core::{
    update, Counters, Effect, EmitMessage, JobConfig, JobId, JobState, JobStatus, Msg,
    ProgressUpdate,
};
use futures_util::FutureExt;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::anchors::{AnchorSource, HtmlAnchorExtractor};
use crate::config::EngineConfig;
use crate::decode::decode_page;
use crate::download::{DownloadManager, DownloadPlan};
use crate::events::{EventBus, EventSink, StreamPublisher};
use crate::fetch::{Fetcher, ReqwestFetcher};
use crate::index::IndexDiscoverer;
use crate::session::SessionDiscoverer;
use crate::FetchError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid index url {url}: {reason}")]
    InvalidIndexUrl { url: String, reason: String },
    #[error("http client: {0}")]
    Client(#[from] FetchError),
}

/// Result of a start request.
#[derive(Debug)]
pub enum StartOutcome {
    /// The job was launched; `events` carries its feed up to and including `done`.
    Accepted {
        job_id: JobId,
        events: StreamPublisher,
    },
    /// Another job is running or stopping. Nothing changed.
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    Stopping,
    Idle,
}

/// Owns the single-flight job state and runs jobs on the tokio runtime.
///
/// Every transition goes through [`exams_core::update`] under one lock, so
/// start, stop and job completion are linearizable. The `done` summary is
/// published while that lock is held, at the same moment the state returns to
/// idle.
#[derive(Clone)]
pub struct JobController {
    inner: Arc<Inner>,
}

struct Inner {
    slot: Mutex<Slot>,
    fetcher: Arc<dyn Fetcher>,
    index: IndexDiscoverer,
    sessions: SessionDiscoverer,
    keepalive: Duration,
}

#[derive(Default)]
struct Slot {
    state: JobState,
    cancel: Option<CancellationToken>,
}

impl Slot {
    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        effects
    }
}

impl JobController {
    /// Controller backed by the reqwest fetcher and the HTML anchor extractor.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        let fetcher = Arc::new(ReqwestFetcher::new(config.fetch.clone())?);
        Self::new(config, fetcher, Arc::new(HtmlAnchorExtractor::new()))
    }

    pub fn new(
        config: &EngineConfig,
        fetcher: Arc<dyn Fetcher>,
        anchors: Arc<dyn AnchorSource>,
    ) -> Result<Self, EngineError> {
        let index_url =
            Url::parse(&config.index_url).map_err(|err| EngineError::InvalidIndexUrl {
                url: config.index_url.clone(),
                reason: err.to_string(),
            })?;
        let inner = Inner {
            slot: Mutex::new(Slot::default()),
            index: IndexDiscoverer::new(index_url, Arc::clone(&anchors)),
            sessions: SessionDiscoverer::new(Arc::clone(&fetcher), anchors),
            fetcher,
            keepalive: config.keepalive,
        };
        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    pub fn status(&self) -> JobStatus {
        self.inner.lock().state.status()
    }

    pub fn counters(&self) -> Counters {
        self.inner.lock().state.counters()
    }

    /// Launch a job unless one is active. Must be called inside a tokio runtime.
    pub fn start(&self, config: JobConfig) -> StartOutcome {
        let mut slot = self.inner.lock();
        for effect in slot.apply(Msg::StartRequested(config)) {
            match effect {
                Effect::LaunchJob { job_id, config } => {
                    let (bus, events) = EventBus::channel(self.inner.keepalive);
                    let cancel = CancellationToken::new();
                    slot.cancel = Some(cancel.clone());
                    engine_info!("job {} started", job_id);

                    let inner = Arc::clone(&self.inner);
                    tokio::spawn(async move {
                        inner.run_job(config, bus, cancel).await;
                    });
                    return StartOutcome::Accepted { job_id, events };
                }
                Effect::StartRejected => return StartOutcome::Conflict,
                _ => {}
            }
        }
        StartOutcome::Conflict
    }

    /// Ask the running job to wind down. Idempotent; a no-op while idle.
    pub fn stop(&self) -> StopOutcome {
        let mut slot = self.inner.lock();
        for effect in slot.apply(Msg::StopRequested) {
            if let Effect::SignalCancel { job_id } = effect {
                engine_info!("job {} stopping", job_id);
                if let Some(cancel) = &slot.cancel {
                    cancel.cancel();
                }
            }
        }
        match slot.state.status() {
            JobStatus::Idle => StopOutcome::Idle,
            JobStatus::Running | JobStatus::Stopping => StopOutcome::Stopping,
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, msg: Msg) {
        self.lock().apply(msg);
    }

    async fn run_job(&self, config: JobConfig, bus: EventBus, cancel: CancellationToken) {
        let fatal = match AssertUnwindSafe(self.drive(&config, &bus, &cancel))
            .catch_unwind()
            .await
        {
            Ok(fatal) => fatal,
            Err(_) => {
                engine_error!("job pipeline panicked");
                bus.emit(EmitMessage::error("Unexpected error: job aborted."));
                // Only an unreachable index is fatal; the summary still goes out.
                false
            }
        };

        let mut slot = self.lock();
        slot.cancel = None;
        for effect in slot.apply(Msg::JobFinished { fatal }) {
            if let Effect::EmitSummary(summary) = effect {
                bus.emit(EmitMessage::Done(summary));
            }
        }
    }

    /// Index, sessions, then downloads. Returns whether the job failed fatally.
    async fn drive(&self, config: &JobConfig, bus: &EventBus, cancel: &CancellationToken) -> bool {
        bus.emit(EmitMessage::info("Fetching index page…"));
        let index_page = match self.fetcher.fetch(self.index.index_url().as_str(), bus).await {
            Ok(page) => page,
            Err(err) => {
                bus.emit(EmitMessage::error(format!(
                    "Could not fetch index page: {err}"
                )));
                return true;
            }
        };
        let html = decode_page(&index_page.body, index_page.metadata.content_type.as_deref());
        let sessions = self.index.discover(&html, &config.filters());
        bus.emit(EmitMessage::info(format!(
            "Found {} exam session(s) matching filters.",
            sessions.len()
        )));

        let mut files = Vec::new();
        for session in sessions {
            if cancel.is_cancelled() {
                bus.emit(EmitMessage::warn("Stop requested; session discovery halted."));
                break;
            }
            let session = Arc::new(session);
            files.extend(self.sessions.discover(&session, bus).await);
            self.apply(Msg::FilesScanned { total: files.len() });
            bus.emit(EmitMessage::Progress(ProgressUpdate::Scanned {
                scanned: files.len(),
            }));
        }
        bus.emit(EmitMessage::info(format!("Total files found: {}", files.len())));

        let manager = DownloadManager::new(Arc::clone(&self.fetcher), config.worker_count());
        let plan = DownloadPlan {
            root: config.output_root.clone(),
            dry_run: config.dry_run,
        };
        let report = manager
            .run(files, &plan, cancel, Arc::new(bus.clone()))
            .await;
        if report.not_dispatched > 0 {
            bus.emit(EmitMessage::warn(format!(
                "Stop requested; {} file(s) not attempted.",
                report.not_dispatched
            )));
        }
        self.apply(Msg::DownloadsFinished(report.summary));
        false
    }
}
