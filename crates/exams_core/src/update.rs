use crate::{Effect, JobState, JobStatus, Msg, Summary};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: JobState, msg: Msg) -> (JobState, Vec<Effect>) {
    let effects = match msg {
        Msg::StartRequested(config) => {
            if state.status() == JobStatus::Idle {
                let job_id = state.begin(config.clone());
                vec![Effect::LaunchJob { job_id, config }]
            } else {
                vec![Effect::StartRejected]
            }
        }
        Msg::StopRequested => match (state.status(), state.job_id()) {
            (JobStatus::Running, Some(job_id)) => {
                state.mark_stopping();
                vec![Effect::SignalCancel { job_id }]
            }
            _ => Vec::new(),
        },
        Msg::FilesScanned { total } => {
            if state.is_active() {
                state.counters_mut().scanned = total;
            }
            Vec::new()
        }
        Msg::DownloadsFinished(summary) => {
            if state.is_active() {
                let counters = state.counters_mut();
                counters.downloaded = summary.downloaded;
                counters.skipped = summary.skipped;
                counters.failed = summary.failed;
                counters.dryrun = summary.dryrun;
            }
            Vec::new()
        }
        Msg::JobFinished { fatal } => {
            if !state.is_active() {
                return (state, Vec::new());
            }
            let summary = if fatal {
                Summary::fatal()
            } else {
                state.counters().summary()
            };
            state.reset();
            vec![Effect::EmitSummary(summary)]
        }
    };

    (state, effects)
}
