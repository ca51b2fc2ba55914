use anyhow::{bail, Result};
use engine_logging::{engine_info, engine_warn};
use exams_core::{EmitMessage, JobConfig, Summary};
use exams_engine::{JobController, StartOutcome};

/// Run one job to completion, turning Ctrl-C into a stop request.
///
/// Frames are logged by the event bus as they are produced; this only waits
/// for the summary.
pub async fn run(controller: &JobController, job: JobConfig) -> Result<Summary> {
    let StartOutcome::Accepted { job_id, mut events } = controller.start(job) else {
        bail!("a job is already running");
    };
    engine_info!("job {} running", job_id);

    let mut stop_sent = false;
    loop {
        tokio::select! {
            frame = events.next_frame() => match frame {
                Some(EmitMessage::Done(summary)) => return Ok(summary),
                Some(_) => {}
                None => bail!("job {job_id} ended without a summary"),
            },
            signal = tokio::signal::ctrl_c(), if !stop_sent => {
                stop_sent = true;
                match signal {
                    Ok(()) => {
                        engine_warn!("Stop requested; finishing in-flight downloads.");
                        controller.stop();
                    }
                    Err(err) => engine_warn!("Ctrl-C handler unavailable: {}", err),
                }
            }
        }
    }
}
