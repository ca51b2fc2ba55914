use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use engine_logging::{engine_debug, engine_error, engine_warn};
use exams_core::{EmitMessage, FileItem, ItemStatus, ProgressUpdate, Summary, MAX_WORKERS};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::events::EventSink;
use crate::fetch::Fetcher;
use crate::persist::AtomicFileWriter;

/// Where and how a batch of items is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub root: PathBuf,
    pub dry_run: bool,
}

/// Terminal status of one dispatched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub url: String,
    pub destination: PathBuf,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DownloadReport {
    /// Outcomes of dispatched items, in completion order.
    pub outcomes: Vec<ItemOutcome>,
    pub summary: Summary,
    /// Items never dispatched because a stop was requested.
    pub not_dispatched: usize,
}

#[derive(Debug, Default)]
struct Tally {
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
    dryrun: AtomicUsize,
    completed: AtomicUsize,
}

impl Tally {
    /// Record a terminal status; returns the number of items completed so far.
    fn record(&self, status: ItemStatus) -> usize {
        let counter = match status {
            ItemStatus::Downloaded => &self.downloaded,
            ItemStatus::Skipped => &self.skipped,
            ItemStatus::Failed => &self.failed,
            ItemStatus::DryRun => &self.dryrun,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn summary(&self) -> Summary {
        Summary {
            downloaded: self.downloaded.load(Ordering::SeqCst),
            skipped: self.skipped.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            dryrun: self.dryrun.load(Ordering::SeqCst),
            fatal: false,
        }
    }
}

/// Bounded worker pool that fetches and persists file items.
///
/// Workers share nothing but the event sink and atomic counters. A stop is
/// observed before each dispatch only; dispatched items always run to a
/// terminal status.
pub struct DownloadManager {
    fetcher: Arc<dyn Fetcher>,
    writer: AtomicFileWriter,
    workers: usize,
}

impl DownloadManager {
    pub fn new(fetcher: Arc<dyn Fetcher>, workers: usize) -> Self {
        Self {
            fetcher,
            writer: AtomicFileWriter::new(),
            workers: workers.clamp(1, MAX_WORKERS),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn run(
        &self,
        items: Vec<FileItem>,
        plan: &DownloadPlan,
        cancel: &CancellationToken,
        sink: Arc<dyn EventSink>,
    ) -> DownloadReport {
        let total = items.len();
        let permits = Arc::new(Semaphore::new(self.workers));
        let tally = Arc::new(Tally::default());
        let mut tasks = JoinSet::new();
        let mut outcomes = Vec::with_capacity(total);
        let mut claimed = HashSet::new();
        let mut dispatched = 0;

        for item in items {
            if cancel.is_cancelled() {
                break;
            }
            let destination = item.destination(&plan.root);
            // Two links may sanitize to the same path; only the first one owns it.
            if !claimed.insert(destination.clone()) {
                dispatched += 1;
                engine_warn!("{} maps to an already claimed {:?}", item.url, destination);
                sink.emit(EmitMessage::warn(format!(
                    "Skipped (duplicate name): {}",
                    item.filename
                )));
                let done = tally.record(ItemStatus::Skipped);
                sink.emit(EmitMessage::Progress(ProgressUpdate::Transfer { done, total }));
                outcomes.push(ItemOutcome {
                    url: item.url,
                    destination,
                    status: ItemStatus::Skipped,
                });
                continue;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = permits.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };
            if cancel.is_cancelled() {
                break;
            }
            dispatched += 1;

            let fetcher = Arc::clone(&self.fetcher);
            let writer = self.writer;
            let sink = Arc::clone(&sink);
            let tally = Arc::clone(&tally);
            let dry_run = plan.dry_run;
            tasks.spawn(async move {
                let outcome = resolve_item(
                    item,
                    destination,
                    dry_run,
                    fetcher.as_ref(),
                    writer,
                    sink.as_ref(),
                )
                .await;
                let done = tally.record(outcome.status);
                sink.emit(EmitMessage::Progress(ProgressUpdate::Transfer { done, total }));
                drop(permit);
                outcome
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    engine_error!("download worker aborted: {}", err);
                    tally.record(ItemStatus::Failed);
                    sink.emit(EmitMessage::error(format!("Download worker aborted: {err}")));
                }
            }
        }

        DownloadReport {
            outcomes,
            summary: tally.summary(),
            not_dispatched: total - dispatched,
        }
    }
}

async fn resolve_item(
    item: FileItem,
    destination: PathBuf,
    dry_run: bool,
    fetcher: &dyn Fetcher,
    writer: AtomicFileWriter,
    sink: &dyn EventSink,
) -> ItemOutcome {
    let status = resolve_status(&item, &destination, dry_run, fetcher, writer, sink).await;
    engine_debug!("{} -> {:?}", item.url, status);
    ItemOutcome {
        url: item.url,
        destination,
        status,
    }
}

async fn resolve_status(
    item: &FileItem,
    destination: &Path,
    dry_run: bool,
    fetcher: &dyn Fetcher,
    writer: AtomicFileWriter,
    sink: &dyn EventSink,
) -> ItemStatus {
    if dry_run {
        sink.emit(EmitMessage::dry_run(destination.display().to_string()));
        return ItemStatus::DryRun;
    }

    // An existing destination was completed by an earlier run: no network call.
    if tokio::fs::try_exists(destination).await.unwrap_or(false) {
        sink.emit(EmitMessage::info(format!(
            "Skipped (exists): {}",
            item.filename
        )));
        return ItemStatus::Skipped;
    }

    let page = match fetcher.fetch(&item.url, sink).await {
        Ok(page) => page,
        Err(_) => {
            sink.emit(EmitMessage::error(format!("Failed: {}", item.url)));
            return ItemStatus::Failed;
        }
    };

    let target = destination.to_path_buf();
    let written = tokio::task::spawn_blocking(move || writer.write(&target, &page.body))
        .await
        .map_err(|err| err.to_string())
        .and_then(|result| result.map_err(|err| err.to_string()));
    match written {
        Ok(_bytes) => {
            sink.emit(EmitMessage::download(item.filename.clone()));
            ItemStatus::Downloaded
        }
        Err(reason) => {
            sink.emit(EmitMessage::error(format!("Failed: {} ({reason})", item.url)));
            ItemStatus::Failed
        }
    }
}
