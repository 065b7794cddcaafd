//! Build progress and update status readers.
//!
//! Both documents are written by external scripts and may be missing, half
//! written or corrupt at any moment. Parsing returns an explicit
//! [`StatusReadError`]; the public readers log it and degrade to a documented
//! default snapshot. Nothing here ever writes.

mod progress;
mod update;

pub use progress::{
    BuildProgressSnapshot, BuildState, BuildStatusDocument, READY_MESSAGE, WAITING_MESSAGE,
    load_build_status, read_build_progress,
};
pub use update::{
    REASON_STATUS_ABSENT, REASON_STATUS_INVALID, RemoteMetadata, UpdateStatusDocument,
    UpdateStatusSnapshot, load_update_status, read_update_status,
};

use crate::error::StatusReadError;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, warn};

pub(crate) fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, StatusReadError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StatusReadError::Missing(path.to_path_buf()));
        }
        Err(source) => {
            return Err(StatusReadError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    serde_json::from_slice(&bytes).map_err(|source| StatusReadError::Invalid {
        path: path.to_path_buf(),
        source,
    })
}

/// Single place where a failed read turns into a default snapshot.
pub(crate) fn log_degradation(document: &str, err: &StatusReadError) {
    if err.is_missing() {
        debug!(document, "status document absent, using defaults");
    } else {
        warn!(document, kind = err.kind(), error = %err, "status document unreadable, using defaults");
    }
}

/// RFC 3339 timestamp; anything unparsable is treated as absent.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
        .map(|ts| ts.with_timezone(&Utc))
}
