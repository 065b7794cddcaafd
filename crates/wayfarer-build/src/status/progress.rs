//! `build-status.json` reader.

use super::{log_degradation, parse_timestamp, read_document};
use crate::error::StatusReadError;
use crate::layout::{self, BUILD_STATUS_FILE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const READY_MESSAGE: &str = "Routing data is ready.";
pub const WAITING_MESSAGE: &str = "Waiting for routing data build to start.";

const READY_PHASE: &str = "ready";
const INITIAL_PHASE: &str = "initialisation";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    #[default]
    Unknown,
    Running,
    Completed,
    Failed,
}

impl BuildState {
    /// Lenient mapping of the script's state string; unknown values map to `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for BuildState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress snapshot shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildProgressSnapshot {
    pub state: BuildState,
    pub phase: String,
    pub progress_pct: u8,
    pub message: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl BuildProgressSnapshot {
    fn ready(updated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            state: BuildState::Completed,
            phase: READY_PHASE.to_string(),
            progress_pct: 100,
            message: READY_MESSAGE.to_string(),
            updated_at,
        }
    }

    fn waiting() -> Self {
        Self {
            state: BuildState::Unknown,
            phase: INITIAL_PHASE.to_string(),
            progress_pct: 0,
            message: WAITING_MESSAGE.to_string(),
            updated_at: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawBuildStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    progress_pct: Option<f64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
}

/// Typed contents of `build-status.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildStatusDocument {
    pub state: BuildState,
    pub phase: String,
    pub progress_pct: u8,
    pub message: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<RawBuildStatus> for BuildStatusDocument {
    fn from(raw: RawBuildStatus) -> Self {
        let progress_pct = raw
            .progress_pct
            .filter(|pct| pct.is_finite())
            .map(|pct| pct.clamp(0.0, 100.0).round() as u8)
            .unwrap_or(0);

        Self {
            state: raw.state.as_deref().map(BuildState::parse).unwrap_or_default(),
            phase: raw.phase.unwrap_or_default(),
            progress_pct,
            message: raw.message.unwrap_or_default(),
            updated_at: parse_timestamp(raw.updated_at.as_deref()),
        }
    }
}

/// Parse `{data_path}/build-status.json`.
pub fn load_build_status(data_path: &Path) -> Result<BuildStatusDocument, StatusReadError> {
    read_document::<RawBuildStatus>(&data_path.join(BUILD_STATUS_FILE)).map(Into::into)
}

/// Build progress as shown to callers.
///
/// Once `ready` is true, readiness is authoritative: the snapshot is forced to
/// completed/100% and only `updated_at` is taken from the file (best effort).
/// Otherwise the file is parsed, falling back to an "initialisation" snapshot
/// when it is missing or corrupt. Never fails.
pub fn read_build_progress(data_path: Option<&Path>, ready: bool) -> BuildProgressSnapshot {
    let loaded = layout::configured(data_path).map(load_build_status);

    if ready {
        let updated_at = loaded
            .and_then(Result::ok)
            .and_then(|doc| doc.updated_at);
        return BuildProgressSnapshot::ready(updated_at);
    }

    match loaded {
        Some(Ok(doc)) => BuildProgressSnapshot {
            state: doc.state,
            phase: doc.phase,
            progress_pct: doc.progress_pct,
            message: doc.message,
            updated_at: doc.updated_at,
        },
        Some(Err(err)) => {
            log_degradation(BUILD_STATUS_FILE, &err);
            BuildProgressSnapshot::waiting()
        }
        None => BuildProgressSnapshot::waiting(),
    }
}
