use std::time::Duration;

use bytes::{Bytes, BytesMut};
use engine_logging::{engine_debug, engine_warn};
use exams_core::EmitMessage;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;

use crate::events::EventSink;
use crate::gate::RequestGate;
use crate::{FailureKind, FetchError, FetchMetadata, FetchOutput};

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; ECExamsScraper/1.0)";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Attempts per URL, including the first.
    pub max_attempts: u32,
    /// The wait after failed attempt `k` is `backoff_unit * backoff_factor^k`.
    pub backoff_unit: Duration,
    pub backoff_factor: u32,
    /// Minimum gap between the starts of any two requests, process-wide.
    pub min_request_spacing: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 100 * 1024 * 1024,
            max_attempts: 3,
            backoff_unit: Duration::from_secs(1),
            backoff_factor: 2,
            min_request_spacing: Duration::from_millis(400),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        self.backoff_unit
            .saturating_mul(self.backoff_factor.saturating_pow(attempt))
    }
}

/// Politeness-aware retrieval of one URL.
///
/// Implementations resolve to content or an explicit failure; they never
/// panic on network problems and report retries through `sink`.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, sink: &dyn EventSink) -> Result<FetchOutput, FetchError>;
}

#[derive(Debug)]
pub struct ReqwestFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
    gate: RequestGate,
}

impl ReqwestFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        let gate = RequestGate::new(settings.min_request_spacing);
        Ok(Self {
            settings,
            client,
            gate,
        })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    async fn fetch_once(&self, url: &reqwest::Url) -> Result<FetchOutput, FetchError> {
        self.gate.wait_turn().await;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        let max_bytes = self.settings.max_bytes;
        if let Some(content_len) = response.content_length() {
            if content_len > max_bytes {
                return Err(too_large(max_bytes, content_len));
            }
        }

        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > max_bytes {
                return Err(too_large(max_bytes, next_len));
            }
            body.extend_from_slice(&chunk);
        }
        let body: Bytes = body.freeze();

        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url,
                content_type,
                byte_len: body.len() as u64,
                attempts: 1,
            },
            body,
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str, sink: &dyn EventSink) -> Result<FetchOutput, FetchError> {
        let parsed = reqwest::Url::parse(url).map_err(|err| {
            let err = FetchError::new(FailureKind::InvalidUrl, err.to_string());
            sink.emit(EmitMessage::warn(format!("Skipping {url}: {err}")));
            err
        })?;

        let max_attempts = self.settings.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.fetch_once(&parsed).await {
                Ok(mut output) => {
                    output.metadata.attempts = attempt;
                    engine_debug!("fetched {} ({} bytes)", url, output.metadata.byte_len);
                    return Ok(output);
                }
                Err(err) => {
                    sink.emit(EmitMessage::warn(format!(
                        "Retry {attempt}/{max_attempts} – {url}: {err}"
                    )));
                    if attempt >= max_attempts || !err.kind.is_transient() {
                        engine_warn!("giving up on {} after {} attempt(s)", url, attempt);
                        return Err(err);
                    }
                    tokio::time::sleep(self.settings.backoff_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
