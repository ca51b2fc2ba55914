use crate::{JobConfig, JobId, Summary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    LaunchJob { job_id: JobId, config: JobConfig },
    StartRejected,
    SignalCancel { job_id: JobId },
    EmitSummary(Summary),
}
