use std::fs;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::engine_info;
use exams_engine::{EngineConfig, FetchSettings, DEFAULT_INDEX_URL, DEFAULT_KEEPALIVE};
use serde::Deserialize;
use thiserror::Error;

/// Shorter intervals would turn an idle stream into a ping flood.
pub const MIN_KEEPALIVE_MS: u64 = 100;

pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 5000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0} does not exist")]
    Missing(PathBuf),
    #[error("could not read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// Settings read from the optional `--config` RON file.
///
/// Every field is optional; omitted ones keep their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub listen: SocketAddr,
    pub index_url: String,
    pub keepalive_ms: u64,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub max_attempts: u32,
    pub backoff_unit_ms: u64,
    pub backoff_factor: u32,
    pub min_request_spacing_ms: u64,
    pub user_agent: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN,
            index_url: DEFAULT_INDEX_URL.to_string(),
            keepalive_ms: DEFAULT_KEEPALIVE.as_millis() as u64,
            fetch: FetchConfig::default(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
            max_attempts: settings.max_attempts,
            backoff_unit_ms: settings.backoff_unit.as_millis() as u64,
            backoff_factor: settings.backoff_factor,
            min_request_spacing_ms: settings.min_request_spacing.as_millis() as u64,
            user_agent: settings.user_agent,
        }
    }
}

impl AppConfig {
    /// Defaults when `path` is `None`; otherwise the named file, which must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path).map_err(|err| match err.kind() {
            io::ErrorKind::NotFound => ConfigError::Missing(path.to_path_buf()),
            _ => ConfigError::Read {
                path: path.to_path_buf(),
                source: err,
            },
        })?;
        let config = Self::parse(&content).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })?;
        engine_info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, String> {
        let config: Self = ron::from_str(content).map_err(|err| err.to_string())?;
        if config.keepalive_ms < MIN_KEEPALIVE_MS {
            return Err(format!(
                "keepalive_ms must be at least {MIN_KEEPALIVE_MS}, got {}",
                config.keepalive_ms
            ));
        }
        Ok(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        let fetch = &self.fetch;
        EngineConfig {
            index_url: self.index_url.clone(),
            fetch: FetchSettings {
                connect_timeout: Duration::from_secs(fetch.connect_timeout_secs),
                request_timeout: Duration::from_secs(fetch.request_timeout_secs),
                redirect_limit: fetch.redirect_limit,
                max_bytes: fetch.max_bytes,
                max_attempts: fetch.max_attempts,
                backoff_unit: Duration::from_millis(fetch.backoff_unit_ms),
                backoff_factor: fetch.backoff_factor,
                min_request_spacing: Duration::from_millis(fetch.min_request_spacing_ms),
                user_agent: fetch.user_agent.clone(),
            },
            keepalive: Duration::from_millis(self.keepalive_ms),
        }
    }
}
