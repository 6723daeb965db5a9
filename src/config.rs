//! Recorder configuration.
//!
//! Compiled-in defaults, plus a `key = value` configuration file format for
//! the relay binary (same shape as `beacon_relay.conf`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

use crate::error::{RecorderError, Result};

// Default constants
const ENDPOINT:           &str  = "http://localhost:4001";
const FLUSH_DELAY_MS:     u64   = 100;
const RETRY_DELAY_MS:     u64   = 10_000;
const RETRY_MAX_MS:       u64   = 120_000;
const MIN_FIRST_SEND:     usize = 25;
const REQUEST_TIMEOUT_MS: u64   = 30_000;

/// Backoff strategy applied to consecutive failed upload attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffKind {
    /// Retry after a constant delay.
    Fixed,
    /// Double the delay per consecutive failure, up to `retry_max_ms`.
    Exponential,
}

impl Default for BackoffKind {
    fn default() -> Self { BackoffKind::Fixed }
}

/// Full recorder configuration.
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Collection origin; uploads POST to `<endpoint>/record`.
    pub endpoint: String,
    /// Immediate-class delay after new data becomes eligible, in ms.
    pub flush_delay_ms: u64,
    /// Failure-class base delay before a retry, in ms.
    pub retry_delay_ms: u64,
    /// How the retry delay grows across consecutive failures.
    pub retry_backoff: BackoffKind,
    /// Upper bound on the retry delay when backoff is exponential, in ms.
    pub retry_max_ms: u64,
    /// A session that has never had bytes accepted holds back until the
    /// buffer strictly exceeds this many bytes.
    pub min_first_send: usize,
    /// Whole-request HTTP timeout, in ms.
    pub request_timeout_ms: u64,
    /// Directory for persisted preferences (consent, tag).
    pub pref_dir: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            endpoint:           ENDPOINT.to_string(),
            flush_delay_ms:     FLUSH_DELAY_MS,
            retry_delay_ms:     RETRY_DELAY_MS,
            retry_backoff:      BackoffKind::Fixed,
            retry_max_ms:       RETRY_MAX_MS,
            min_first_send:     MIN_FIRST_SEND,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            pref_dir:           std::env::temp_dir().join("beacon-prefs"),
        }
    }
}

impl RecorderConfig {
    /// Immediate-class flush delay.
    pub fn flush_delay(&self) -> Duration {
        Duration::from_millis(self.flush_delay_ms)
    }

    /// Whole-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Parse `path` as a `key = value` configuration file.
pub fn load_config(path: &Path) -> Result<RecorderConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| RecorderError::Config(format!("cannot read {}: {e}", path.display())))?;
    let mut cfg = RecorderConfig::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = match parts.next() {
            Some(k) => k.trim().to_ascii_lowercase(),
            None => continue,
        };
        let val = match parts.next() {
            Some(v) => v.trim().to_string(),
            None => continue,
        };
        if val.is_empty() {
            continue;
        }

        match key.as_str() {
            "endpoint"           => cfg.endpoint           = val,
            "flush_delay_ms"     => cfg.flush_delay_ms     = val.parse().unwrap_or(FLUSH_DELAY_MS),
            "retry_delay_ms"     => cfg.retry_delay_ms     = val.parse().unwrap_or(RETRY_DELAY_MS),
            "retry_max_ms"       => cfg.retry_max_ms       = val.parse().unwrap_or(RETRY_MAX_MS),
            "min_first_send"     => cfg.min_first_send     = val.parse().unwrap_or(MIN_FIRST_SEND),
            "request_timeout_ms" => cfg.request_timeout_ms = val.parse().unwrap_or(REQUEST_TIMEOUT_MS),
            "pref_dir"           => cfg.pref_dir           = PathBuf::from(&val),
            "retry_backoff" => {
                cfg.retry_backoff = match val.to_ascii_lowercase().as_str() {
                    "exponential" => BackoffKind::Exponential,
                    _             => BackoffKind::Fixed,
                };
            }
            _ => {} // ignore unknown keys
        }
    }

    Ok(cfg)
}

/// Validate that the configuration can actually drive an upload.
pub fn validate_config(cfg: &RecorderConfig) -> Result<()> {
    let url = Url::parse(&cfg.endpoint)
        .map_err(|e| RecorderError::Config(format!("endpoint {}: {e}", cfg.endpoint)))?;
    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(RecorderError::Config(format!(
                "endpoint scheme {other} is not supported"
            )));
        }
    }
    if cfg.flush_delay_ms == 0 || cfg.retry_delay_ms == 0 {
        return Err(RecorderError::Config("delays must be nonzero".into()));
    }
    Ok(())
}
