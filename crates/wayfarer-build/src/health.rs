//! Routing engine liveness probe.
//!
//! A short client-side timeout keeps status endpoints responsive while the
//! engine is down. Every outcome maps to a stable error code; nothing is
//! returned as an error to the caller.

use crate::config::OrchestratorConfig;
use reqwest::{Client, Url};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub const DEFAULT_HEALTH_PATH: &str = "/status";
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Why the engine was judged unreachable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeFailure {
    #[error("no base URL configured")]
    BaseUrlMissing,

    #[error("base URL is not an absolute http(s) URI")]
    BaseUrlInvalid,

    #[error("engine answered HTTP {0}")]
    HttpStatus(u16),

    /// Client timeout or caller cancellation.
    #[error("engine did not answer in time")]
    Timeout,

    #[error("network failure: {0}")]
    Network(&'static str),
}

impl ProbeFailure {
    /// Stable error code exposed to callers.
    pub fn code(&self) -> String {
        match self {
            Self::BaseUrlMissing => "base_url_absente".to_string(),
            Self::BaseUrlInvalid => "base_url_invalide".to_string(),
            Self::HttpStatus(status) => format!("http_{status}"),
            Self::Timeout => "timeout".to_string(),
            Self::Network(kind) => (*kind).to_string(),
        }
    }
}

/// `(reachable, error_code)` result of a probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub reachable: bool,
    pub error: Option<String>,
}

impl From<Result<(), ProbeFailure>> for ProbeOutcome {
    fn from(result: Result<(), ProbeFailure>) -> Self {
        match result {
            Ok(()) => Self {
                reachable: true,
                error: None,
            },
            Err(failure) => Self {
                reachable: false,
                error: Some(failure.code()),
            },
        }
    }
}

/// Parse and validate an engine base URL.
pub fn parse_base_url(base_url: &str) -> Result<Url, ProbeFailure> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ProbeFailure::BaseUrlMissing);
    }

    let url = Url::parse(trimmed).map_err(|_| ProbeFailure::BaseUrlInvalid)?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ProbeFailure::BaseUrlInvalid);
    }
    Ok(url)
}

/// Join the health path onto the base URL, keeping any base path prefix.
pub fn health_url(base_url: &str, health_path: &str) -> Result<Url, ProbeFailure> {
    let base = parse_base_url(base_url)?;
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        health_path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|_| ProbeFailure::BaseUrlInvalid)
}

fn classify(err: &reqwest::Error) -> ProbeFailure {
    if err.is_timeout() {
        ProbeFailure::Timeout
    } else if err.is_connect() {
        ProbeFailure::Network("connect_error")
    } else if err.is_redirect() {
        ProbeFailure::Network("redirect_error")
    } else if err.is_body() {
        ProbeFailure::Network("body_error")
    } else if err.is_decode() {
        ProbeFailure::Network("decode_error")
    } else if err.is_request() {
        ProbeFailure::Network("request_error")
    } else {
        ProbeFailure::Network("network_error")
    }
}

/// Probes the routing engine's health endpoint.
#[derive(Debug, Clone)]
pub struct ServiceHealthProbe {
    health_path: String,
    timeout: Duration,
}

impl Default for ServiceHealthProbe {
    fn default() -> Self {
        Self::new(DEFAULT_HEALTH_PATH, DEFAULT_PROBE_TIMEOUT)
    }
}

impl ServiceHealthProbe {
    pub fn new(health_path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            health_path: health_path.into(),
            timeout,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(config.health_path.clone(), config.probe_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Probe `base_url`, reporting the outcome as `(reachable, error_code)`.
    pub async fn probe(
        &self,
        base_url: Option<&str>,
        client: &Client,
        cancel: &CancellationToken,
    ) -> ProbeOutcome {
        self.check(base_url, client, cancel).await.into()
    }

    /// Same as [`probe`](Self::probe), keeping the typed failure.
    pub async fn check(
        &self,
        base_url: Option<&str>,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Result<(), ProbeFailure> {
        let url = health_url(base_url.unwrap_or_default(), &self.health_path)?;

        let request = client.get(url.clone()).timeout(self.timeout).send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ProbeFailure::Timeout),
            result = request => result,
        };

        let result = match response {
            Ok(resp) if resp.status().is_success() => Ok(()),
            Ok(resp) => Err(ProbeFailure::HttpStatus(resp.status().as_u16())),
            Err(err) => Err(classify(&err)),
        };

        debug!(url = %url, outcome = ?result, "routing engine probe finished");
        result
    }
}
