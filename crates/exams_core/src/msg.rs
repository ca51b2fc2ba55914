use crate::{JobConfig, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// A front end asked for a new job.
    StartRequested(JobConfig),
    /// A front end asked the running job to stop.
    StopRequested,
    /// Discovery has found this many files so far.
    FilesScanned { total: usize },
    /// The download phase resolved every dispatched item.
    DownloadsFinished(Summary),
    /// The pipeline has returned; `fatal` when the index was unreachable.
    JobFinished { fatal: bool },
}
