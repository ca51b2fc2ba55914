//! Progress fan-out: producers append [`EmitMessage`]s, one consumer drains them.
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_error, engine_info, engine_trace, engine_warn};
use exams_core::EmitMessage;
use futures_util::Stream;
use tokio::sync::mpsc;

pub const DEFAULT_KEEPALIVE: Duration = Duration::from_secs(1);

/// Anything that accepts progress messages. Implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, message: EmitMessage);
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn emit(&self, message: EmitMessage) {
        (**self).emit(message);
    }
}

/// Producer side of the job feed. Cheap to clone; every clone feeds the same
/// FIFO queue.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<EmitMessage>,
}

impl EventBus {
    /// Create a bus and the single publisher that drains it.
    pub fn channel(keepalive: Duration) -> (EventBus, StreamPublisher) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            EventBus { tx },
            StreamPublisher {
                rx,
                keepalive,
                finished: false,
            },
        )
    }
}

impl EventSink for EventBus {
    fn emit(&self, message: EmitMessage) {
        log_message(&message);
        // The observer may have gone away; the job keeps running regardless.
        let _ = self.tx.send(message);
    }
}

/// Consumer side of the job feed.
///
/// Yields messages in enqueue order, a [`EmitMessage::Ping`] whenever nothing
/// arrives within the keep-alive interval, and ends after the `done` frame.
#[derive(Debug)]
pub struct StreamPublisher {
    rx: mpsc::UnboundedReceiver<EmitMessage>,
    keepalive: Duration,
    finished: bool,
}

impl StreamPublisher {
    pub async fn next_frame(&mut self) -> Option<EmitMessage> {
        if self.finished {
            return None;
        }
        match tokio::time::timeout(self.keepalive, self.rx.recv()).await {
            Ok(Some(message)) => {
                self.finished = message.is_done();
                Some(message)
            }
            // Every producer is gone without a summary; nothing more can arrive.
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(_elapsed) => Some(EmitMessage::Ping),
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = EmitMessage> + Send + 'static {
        futures_util::stream::unfold(self, |mut publisher| async move {
            publisher
                .next_frame()
                .await
                .map(|frame| (frame, publisher))
        })
    }
}

fn log_message(message: &EmitMessage) {
    match message {
        EmitMessage::Warn { msg } => engine_warn!("{msg}"),
        EmitMessage::Error { msg } => engine_error!("{msg}"),
        EmitMessage::Ping | EmitMessage::Progress(_) => engine_trace!("{message:?}"),
        EmitMessage::Done(summary) => engine_info!(
            "done: downloaded={} skipped={} failed={} dryrun={}",
            summary.downloaded,
            summary.skipped,
            summary.failed,
            summary.dryrun
        ),
        other => engine_info!("[{}] {}", other.kind(), other.text().unwrap_or_default()),
    }
}
