//! Settings read from the environment.

use std::env;
use std::time::Duration;

use tracing::warn;

/// Default search backend URL.
pub const DEFAULT_ELASTICSEARCH_URL: &str = "http://localhost:9200";

/// Default index shared by models that do not name their own.
pub const DEFAULT_INDEX: &str = "django";

/// Default number of documents per bulk request when reindexing.
pub const DEFAULT_BULK_SIZE: usize = 100;

/// Default connection retry interval in seconds.
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 15;

/// Startup connection policy of the bootstrap binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// Fail immediately if the backend does not answer.
    FailFast,
    /// Retry every retry interval until the backend answers.
    Retry,
}

impl ConnectionMode {
    /// Parse a connection mode.
    ///
    /// Valid values: "fail-fast" or "retry" (case-insensitive).
    /// Defaults to `Retry` if unset or invalid.
    fn parse(value: Option<String>) -> Self {
        let Some(value) = value else {
            return Self::Retry;
        };
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" | "fail_fast" => Self::FailFast,
            "retry" => Self::Retry,
            _ => {
                warn!(value = %value, "Invalid ELASTICSEARCH_CONNECTION_MODE, defaulting to 'retry'");
                Self::Retry
            }
        }
    }
}

/// Search sync settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncSettings {
    /// Backend URL, also used for the connectivity probe.
    pub url: String,
    /// Index used by models without an explicit index.
    pub default_index: String,
    /// Upper bound for the connectivity probe and for every request.
    /// `None` waits indefinitely.
    pub max_timeout: Option<Duration>,
    /// Whether save, delete and migrate events are mirrored.
    pub auto_index: bool,
    /// Documents per bulk request when reindexing.
    pub bulk_size: usize,
    pub connection_mode: ConnectionMode,
    pub retry_interval: Duration,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_ELASTICSEARCH_URL.to_string(),
            default_index: DEFAULT_INDEX.to_string(),
            max_timeout: None,
            auto_index: false,
            bulk_size: DEFAULT_BULK_SIZE,
            connection_mode: ConnectionMode::Retry,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
        }
    }
}

impl SyncSettings {
    /// Read settings from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `ELASTICSEARCH_URL`: backend URL (default: http://localhost:9200)
    /// - `ELASTICSEARCH_DEFAULT_INDEX`: default index (default: "django")
    /// - `ELASTICSEARCH_MAX_TIMEOUT`: probe and request timeout in seconds, fractions allowed (default: none)
    /// - `ELASTICSEARCH_AUTO_INDEX`: "1", "true", "yes" or "on" to mirror record changes (default: off)
    /// - `ELASTICSEARCH_BULK_SIZE`: documents per bulk request when reindexing (default: 100)
    /// - `ELASTICSEARCH_CONNECTION_MODE`: "fail-fast" or "retry" (default: retry)
    /// - `ELASTICSEARCH_RETRY_INTERVAL_SECS`: retry interval in seconds (default: 15)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let url = lookup("ELASTICSEARCH_URL").unwrap_or(defaults.url);
        let default_index = lookup("ELASTICSEARCH_DEFAULT_INDEX").unwrap_or(defaults.default_index);
        let max_timeout = lookup("ELASTICSEARCH_MAX_TIMEOUT").and_then(|s| parse_timeout(&s));
        let auto_index = lookup("ELASTICSEARCH_AUTO_INDEX")
            .map(|s| parse_flag(&s))
            .unwrap_or(defaults.auto_index);
        let bulk_size = lookup("ELASTICSEARCH_BULK_SIZE")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|size| *size > 0)
            .unwrap_or(defaults.bulk_size);
        let connection_mode = ConnectionMode::parse(lookup("ELASTICSEARCH_CONNECTION_MODE"));
        let retry_interval = lookup("ELASTICSEARCH_RETRY_INTERVAL_SECS")
            .and_then(|s| s.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry_interval);

        Self {
            url,
            default_index,
            max_timeout,
            auto_index,
            bulk_size,
            connection_mode,
            retry_interval,
        }
    }
}

fn parse_timeout(value: &str) -> Option<Duration> {
    let timeout = value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

    if timeout.is_none() {
        warn!(value = %value, "Invalid ELASTICSEARCH_MAX_TIMEOUT, requests will not time out");
    }
    timeout
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
