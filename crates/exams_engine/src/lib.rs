//! Exams engine: fetching, discovery, downloads and job orchestration.
mod anchors;
mod config;
mod controller;
mod decode;
mod download;
mod events;
mod fetch;
mod gate;
mod index;
mod persist;
mod session;
mod types;

pub use anchors::{resolve_url, Anchor, AnchorSource, HtmlAnchorExtractor};
pub use config::{EngineConfig, DEFAULT_INDEX_URL};
pub use controller::{EngineError, JobController, StartOutcome, StopOutcome};
pub use decode::decode_page;
pub use download::{DownloadManager, DownloadPlan, DownloadReport, ItemOutcome};
pub use events::{EventBus, EventSink, StreamPublisher, DEFAULT_KEEPALIVE};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, DEFAULT_USER_AGENT};
pub use gate::RequestGate;
pub use index::IndexDiscoverer;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use session::SessionDiscoverer;
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput};
