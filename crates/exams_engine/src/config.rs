use std::time::Duration;

use crate::events::DEFAULT_KEEPALIVE;
use crate::fetch::FetchSettings;

pub const DEFAULT_INDEX_URL: &str = "https://www.ecexams.co.za/ExaminationPapers.htm";

/// Settings shared by every job the controller runs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Top-level listing page; session links are resolved against it.
    pub index_url: String,
    pub fetch: FetchSettings,
    /// Idle interval after which the stream publisher emits a ping.
    pub keepalive: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            fetch: FetchSettings::default(),
            keepalive: DEFAULT_KEEPALIVE,
        }
    }
}
