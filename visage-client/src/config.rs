//! Client configuration.
//!
//! Defaults mirror the gallery service's own limits: 16 MiB per file,
//! jpg/jpeg/png only, 30 second request timeout. Every field can be
//! overridden from `VISAGE_*` environment variables so deployments do not
//! need a config file.

use std::env;
use std::time::Duration;

use url::Url;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_FILE_BYTES: u64 = 16 * 1024 * 1024;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_STATS_REFRESH_MS: u64 = 2_000;

/// Errors raised while reading configuration overrides.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base url {value:?}: {source}")]
    InvalidBaseUrl {
        value: String,
        source: url::ParseError,
    },

    #[error("invalid value {value:?} for {key}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Settings for the orchestration core and its HTTP gateway.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the gallery service API, e.g. `http://host:8000/api`.
    pub base_url: Url,
    /// Timeout applied to every request.
    pub request_timeout: Duration,
    /// Per-file admission cap for the validation gate.
    pub max_file_bytes: u64,
    /// Accepted file extensions, matched case-insensitively.
    pub allowed_extensions: Vec<String>,
    /// Default page size for photo listings.
    pub page_size: u32,
    /// Delay before the one-shot stats re-fetch scheduled after a reprocess.
    pub stats_refresh_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base url parses"),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            allowed_extensions: vec!["jpg".into(), "jpeg".into(), "png".into()],
            page_size: DEFAULT_PAGE_SIZE,
            stats_refresh_delay: Duration::from_millis(DEFAULT_STATS_REFRESH_MS),
        }
    }
}

impl ClientConfig {
    /// Build a config from defaults plus any `VISAGE_*` overrides present in
    /// the environment.
    ///
    /// Recognized keys: `VISAGE_BASE_URL`, `VISAGE_TIMEOUT_SECS`,
    /// `VISAGE_MAX_FILE_BYTES`, `VISAGE_ALLOWED_EXTENSIONS` (comma
    /// separated), `VISAGE_PAGE_SIZE`, `VISAGE_STATS_REFRESH_MS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = ClientConfig::default();

        if let Ok(value) = env::var("VISAGE_BASE_URL") {
            config.base_url = Url::parse(&value)
                .map_err(|source| ConfigError::InvalidBaseUrl { value, source })?;
        }
        if let Some(secs) = parse_env_u64("VISAGE_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(bytes) = parse_env_u64("VISAGE_MAX_FILE_BYTES")? {
            config.max_file_bytes = bytes;
        }
        if let Ok(value) = env::var("VISAGE_ALLOWED_EXTENSIONS") {
            config.allowed_extensions = value
                .split(',')
                .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect();
        }
        if let Some(size) = parse_env_u64("VISAGE_PAGE_SIZE")? {
            config.page_size = size as u32;
        }
        if let Some(millis) = parse_env_u64("VISAGE_STATS_REFRESH_MS")? {
            config.stats_refresh_delay = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn parse_env_u64(key: &'static str) -> Result<Option<u64>, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
        Err(_) => Ok(None),
    }
}
