use std::path::PathBuf;

use serde::{Deserialize, Deserializer};

use crate::{Filters, Summary};

pub type JobId = u64;

pub const DEFAULT_OUTPUT_DIR: &str = "downloads";
pub const DEFAULT_WORKERS: usize = 3;
pub const MAX_WORKERS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobStatus {
    #[default]
    Idle,
    Running,
    Stopping,
}

/// Options accepted by a start request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub grades: Vec<String>,
    pub years: Vec<String>,
    #[serde(alias = "output_dir", deserialize_with = "output_root_or_default")]
    pub output_root: PathBuf,
    pub dry_run: bool,
    #[serde(alias = "threads")]
    pub workers: usize,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            grades: Vec::new(),
            years: Vec::new(),
            output_root: PathBuf::from(DEFAULT_OUTPUT_DIR),
            dry_run: false,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl JobConfig {
    pub fn filters(&self) -> Filters {
        Filters::new(self.grades.iter().cloned(), self.years.iter().cloned())
    }

    /// Worker-pool width, clamped to `1..=MAX_WORKERS`.
    pub fn worker_count(&self) -> usize {
        self.workers.clamp(1, MAX_WORKERS)
    }
}

fn output_root_or_default<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(PathBuf::from(DEFAULT_OUTPUT_DIR))
    } else {
        Ok(PathBuf::from(trimmed))
    }
}

/// Running counters of the current job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Counters {
    pub scanned: usize,
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub dryrun: usize,
}

impl Counters {
    pub fn summary(&self) -> Summary {
        Summary {
            downloaded: self.downloaded,
            skipped: self.skipped,
            failed: self.failed,
            dryrun: self.dryrun,
            fatal: false,
        }
    }
}

/// Process-wide job state. Only [`crate::update`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobState {
    status: JobStatus,
    job_id: Option<JobId>,
    next_job_id: JobId,
    config: Option<JobConfig>,
    counters: Counters,
}

impl JobState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    pub fn config(&self) -> Option<&JobConfig> {
        self.config.as_ref()
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn is_active(&self) -> bool {
        self.status != JobStatus::Idle
    }

    pub(crate) fn begin(&mut self, config: JobConfig) -> JobId {
        self.next_job_id += 1;
        let job_id = self.next_job_id;
        self.status = JobStatus::Running;
        self.job_id = Some(job_id);
        self.config = Some(config);
        self.counters = Counters::default();
        job_id
    }

    pub(crate) fn mark_stopping(&mut self) {
        self.status = JobStatus::Stopping;
    }

    pub(crate) fn counters_mut(&mut self) -> &mut Counters {
        &mut self.counters
    }

    pub(crate) fn reset(&mut self) {
        self.status = JobStatus::Idle;
        self.job_id = None;
        self.config = None;
        self.counters = Counters::default();
    }
}
