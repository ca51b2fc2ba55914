mod common;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{fast_settings, init_logging};
use exams_core::{EmitMessage, JobConfig, JobStatus, Summary};
use exams_engine::{
    EngineConfig, EventSink, FetchError, FetchOutput, Fetcher, HtmlAnchorExtractor, JobController,
    StartOutcome, StopOutcome, StreamPublisher,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INDEX_PATH: &str = "/ExaminationPapers.htm";

fn controller(server: &MockServer) -> JobController {
    init_logging();
    let config = EngineConfig {
        index_url: format!("{}{INDEX_PATH}", server.uri()),
        fetch: fast_settings(),
        keepalive: Duration::from_millis(200),
    };
    JobController::from_config(&config).unwrap()
}

fn job(root: &TempDir) -> JobConfig {
    JobConfig {
        output_root: root.path().to_path_buf(),
        ..JobConfig::default()
    }
}

async fn mount_index(server: &MockServer, body: &str, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.to_string(), "text/html")
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Every non-ping frame up to and including `done`.
async fn drain(mut events: StreamPublisher) -> Vec<EmitMessage> {
    let collect = async {
        let mut frames = Vec::new();
        while let Some(frame) = events.next_frame().await {
            if frame != EmitMessage::Ping {
                frames.push(frame);
            }
        }
        frames
    };
    tokio::time::timeout(Duration::from_secs(20), collect)
        .await
        .expect("job finished")
}

fn texts(frames: &[EmitMessage], kind: &str) -> Vec<String> {
    frames
        .iter()
        .filter(|frame| frame.kind() == kind)
        .filter_map(|frame| frame.text().map(str::to_string))
        .collect()
}

fn accepted(outcome: StartOutcome) -> StreamPublisher {
    match outcome {
        StartOutcome::Accepted { events, .. } => events,
        StartOutcome::Conflict => panic!("start was rejected"),
    }
}

#[tokio::test]
async fn job_runs_index_to_downloads_and_reports_done() {
    let server = MockServer::start().await;
    mount_index(
        &server,
        r#"<a href="2024_Grade_12_Nov.htm">Grade 12 November 2024</a>"#,
        Duration::ZERO,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/2024_Grade_12_Nov.htm"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<a href="P1.pdf">Paper 1</a><a href="P2.pdf">Paper 2</a>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    for name in ["P1.pdf", "P2.pdf"] {
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_string("%PDF"))
            .expect(1)
            .mount(&server)
            .await;
    }

    let temp = TempDir::new().unwrap();
    let controller = controller(&server);
    let frames = drain(accepted(controller.start(job(&temp)))).await;

    assert_eq!(
        frames.last(),
        Some(&EmitMessage::Done(Summary {
            downloaded: 2,
            ..Summary::default()
        }))
    );
    let info = texts(&frames, "info");
    assert_eq!(info[0], "Fetching index page…");
    assert!(info.contains(&"Found 1 exam session(s) matching filters.".to_string()));
    assert!(info.contains(&"Total files found: 2".to_string()));
    let mut downloaded = texts(&frames, "download");
    downloaded.sort();
    assert_eq!(downloaded, vec!["Paper 1.pdf", "Paper 2.pdf"]);
    assert_eq!(controller.status(), JobStatus::Idle);
    assert!(temp
        .path()
        .join("Grade 12/2024/Grade 12 November 2024/Paper 1.pdf")
        .exists());
}

#[tokio::test]
async fn second_start_conflicts_while_running() {
    let server = MockServer::start().await;
    mount_index(&server, "<p>nothing yet</p>", Duration::from_millis(300)).await;

    let temp = TempDir::new().unwrap();
    let controller = controller(&server);
    let first = accepted(controller.start(job(&temp)));

    assert!(matches!(controller.start(job(&temp)), StartOutcome::Conflict));
    assert_eq!(controller.status(), JobStatus::Running);

    let frames = drain(first).await;
    assert_eq!(frames.last(), Some(&EmitMessage::Done(Summary::default())));
    assert_eq!(controller.status(), JobStatus::Idle);

    match controller.start(job(&temp)) {
        StartOutcome::Accepted { job_id, events } => {
            assert_eq!(job_id, 2);
            drain(events).await;
        }
        StartOutcome::Conflict => panic!("idle controller rejected a start"),
    }
}

#[tokio::test]
async fn unreachable_index_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(INDEX_PATH))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let controller = controller(&server);
    let frames = drain(accepted(controller.start(job(&temp)))).await;

    let errors = texts(&frames, "error");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Could not fetch index page"));
    assert_eq!(frames.last(), Some(&EmitMessage::Done(Summary::fatal())));
    assert_eq!(controller.status(), JobStatus::Idle);
}

#[tokio::test]
async fn stop_halts_session_discovery() {
    let server = MockServer::start().await;
    mount_index(
        &server,
        r#"<a href="a.htm">Grade 12 November 2024</a><a href="b.htm">Grade 11 November 2024</a>"#,
        Duration::from_millis(300),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/a.htm"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp = TempDir::new().unwrap();
    let controller = controller(&server);
    let events = accepted(controller.start(job(&temp)));

    assert_eq!(controller.stop(), StopOutcome::Stopping);
    assert_eq!(controller.status(), JobStatus::Stopping);
    assert_eq!(controller.stop(), StopOutcome::Stopping);

    let frames = drain(events).await;
    assert!(texts(&frames, "warn")
        .iter()
        .any(|warning| warning.contains("session discovery halted")));
    assert_eq!(frames.last(), Some(&EmitMessage::Done(Summary::default())));
    assert_eq!(controller.stop(), StopOutcome::Idle);
}

#[tokio::test]
async fn stop_while_idle_is_a_no_op() {
    let server = MockServer::start().await;
    let controller = controller(&server);
    assert_eq!(controller.stop(), StopOutcome::Idle);
    assert_eq!(controller.status(), JobStatus::Idle);
}

struct BrokenFetcher;

#[async_trait]
impl Fetcher for BrokenFetcher {
    async fn fetch(&self, _url: &str, _sink: &dyn EventSink) -> Result<FetchOutput, FetchError> {
        panic!("fetcher bug");
    }
}

#[tokio::test]
async fn pipeline_panic_reports_error_and_non_fatal_done() {
    init_logging();
    let controller = JobController::new(
        &EngineConfig::default(),
        Arc::new(BrokenFetcher),
        Arc::new(HtmlAnchorExtractor::new()),
    )
    .unwrap();
    let temp = TempDir::new().unwrap();

    let frames = drain(accepted(controller.start(job(&temp)))).await;

    assert_eq!(texts(&frames, "error"), vec!["Unexpected error: job aborted."]);
    assert_eq!(frames.last(), Some(&EmitMessage::Done(Summary::default())));
    assert_eq!(controller.status(), JobStatus::Idle);
}
