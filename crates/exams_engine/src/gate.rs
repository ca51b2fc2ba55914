use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide politeness gate.
///
/// Every outgoing request passes through [`RequestGate::wait_turn`]. The lock is
/// held while sleeping, so request starts are serialized across all callers and
/// any two of them are at least `spacing` apart, however many workers run.
#[derive(Debug)]
pub struct RequestGate {
    spacing: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RequestGate {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_start: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait until this caller may start a request. The first call never waits.
    pub async fn wait_turn(&self) {
        let mut last_start = self.last_start.lock().await;
        if let Some(previous) = *last_start {
            let ready_at = previous + self.spacing;
            if ready_at > Instant::now() {
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last_start = Some(Instant::now());
    }
}
