//! HTTP front end: `POST /start`, `GET /stream`, `POST /stop`.
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use engine_logging::{engine_info, engine_warn};
use exams_core::JobConfig;
use exams_engine::{JobController, StartOutcome, StopOutcome, StreamPublisher};
use futures_util::StreamExt;
use serde_json::json;
use tokio::net::TcpListener;

#[derive(Clone)]
pub struct AppState {
    controller: JobController,
    /// Feed of the most recently started job, until a client claims it.
    pending: Arc<Mutex<Option<StreamPublisher>>>,
}

impl AppState {
    pub fn new(controller: JobController) -> Self {
        Self {
            controller,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    fn set_pending(&self, events: StreamPublisher) {
        *self.pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(events);
    }

    fn take_pending(&self) -> Option<StreamPublisher> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/start", post(start_job))
        .route("/stream", get(stream_events))
        .route("/stop", post(stop_job))
        .with_state(state)
}

pub async fn serve(listen: SocketAddr, controller: JobController) -> Result<()> {
    let listener = TcpListener::bind(listen)
        .await
        .with_context(|| format!("could not listen on {listen}"))?;
    engine_info!("Listening on http://{}", listen);

    axum::serve(listener, router(AppState::new(controller)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    engine_info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        engine_warn!("Ctrl-C handler unavailable: {}", err);
        std::future::pending::<()>().await;
    }
}

/// An empty body starts a job with default options.
async fn start_job(State(state): State<AppState>, body: Bytes) -> Response {
    let job = if body.iter().all(u8::is_ascii_whitespace) {
        JobConfig::default()
    } else {
        match serde_json::from_slice::<JobConfig>(&body) {
            Ok(job) => job,
            Err(err) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": format!("Invalid job options: {err}") })),
                )
                    .into_response();
            }
        }
    };

    match state.controller.start(job) {
        StartOutcome::Accepted { events, .. } => {
            state.set_pending(events);
            (StatusCode::OK, Json(json!({ "status": "started" }))).into_response()
        }
        StartOutcome::Conflict => (
            StatusCode::CONFLICT,
            Json(json!({ "error": "A job is already running." })),
        )
            .into_response(),
    }
}

async fn stream_events(State(state): State<AppState>) -> Response {
    let Some(events) = state.take_pending() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No job stream is pending." })),
        )
            .into_response();
    };

    let frames = events.into_stream().map(|frame| {
        let event = Event::default().json_data(&frame).unwrap_or_else(|err| {
            engine_warn!("Failed to serialize frame: {}", err);
            Event::default().comment("unserializable frame")
        });
        Ok::<_, Infallible>(event)
    });
    Sse::new(frames).into_response()
}

async fn stop_job(State(state): State<AppState>) -> Json<serde_json::Value> {
    match state.controller.stop() {
        StopOutcome::Stopping => Json(json!({ "status": "stopping" })),
        StopOutcome::Idle => Json(json!({ "status": "idle" })),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use exams_engine::{EngineConfig, FetchSettings};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn app(server: &MockServer) -> Router {
        let config = EngineConfig {
            index_url: format!("{}/ExaminationPapers.htm", server.uri()),
            fetch: FetchSettings {
                backoff_unit: Duration::from_millis(5),
                min_request_spacing: Duration::ZERO,
                ..FetchSettings::default()
            },
            ..EngineConfig::default()
        };
        router(AppState::new(JobController::from_config(&config).unwrap()))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn slow_empty_index(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/ExaminationPapers.htm"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<p>no sessions</p>", "text/html")
                    .set_delay(Duration::from_millis(300)),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn start_conflicts_then_stream_ends_with_done() {
        let server = MockServer::start().await;
        slow_empty_index(&server).await;
        let app = app(&server);

        let (status, body) = call(&app, "POST", "/start", r#"{"dry_run": true}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"started"}"#);

        let (status, body) = call(&app, "POST", "/start", "").await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body, r#"{"error":"A job is already running."}"#);

        let (status, body) = call(&app, "GET", "/stream", "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with(r#"data: {"kind":"info","msg":"Fetching index page…"}"#));
        assert!(body.contains(r#"data: {"kind":"info","msg":"Total files found: 0"}"#));
        assert!(body
            .trim_end()
            .ends_with(r#"data: {"kind":"done","dl":0,"skip":0,"fail":0,"dry":0}"#));

        let (_, body) = call(&app, "POST", "/stop", "").await;
        assert_eq!(body, r#"{"status":"idle"}"#);
    }

    #[tokio::test]
    async fn stop_while_running_reports_stopping() {
        let server = MockServer::start().await;
        slow_empty_index(&server).await;
        let app = app(&server);

        call(&app, "POST", "/start", "").await;
        let (status, body) = call(&app, "POST", "/stop", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"stopping"}"#);

        let (_, body) = call(&app, "GET", "/stream", "").await;
        assert!(body.contains(r#""kind":"done""#));
    }

    #[tokio::test]
    async fn stream_without_job_is_not_found() {
        let server = MockServer::start().await;
        let (status, _) = call(&app(&server), "GET", "/stream", "").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_options_are_rejected() {
        let server = MockServer::start().await;
        let (status, body) = call(&app(&server), "POST", "/start", "{\"workers\": \"many\"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("Invalid job options"));
    }
}
