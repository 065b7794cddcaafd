//! `update-status.json` and `.valhalla_update_available` reader.

use super::{log_degradation, parse_timestamp, read_document};
use crate::error::StatusReadError;
use crate::layout::{self, UPDATE_MARKER_FILE, UPDATE_STATUS_FILE};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const REASON_STATUS_ABSENT: &str = "status_absent";
pub const REASON_STATUS_INVALID: &str = "status_invalide";

/// Last known characteristics of the remote source artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RemoteMetadata {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub content_length: Option<u64>,
    pub checked_at: Option<DateTime<Utc>>,
    pub available: bool,
    pub error: Option<String>,
}

impl RemoteMetadata {
    /// Field-by-field mapping; wrong types and missing fields default to null/false.
    fn from_value(value: Option<&Value>) -> Self {
        let Some(obj) = value.and_then(Value::as_object) else {
            return Self::default();
        };
        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            etag: text("etag"),
            last_modified: text("last_modified"),
            content_length: obj.get("content_length").and_then(Value::as_u64),
            checked_at: parse_timestamp(obj.get("checked_at").and_then(Value::as_str)),
            available: obj.get("available").and_then(Value::as_bool).unwrap_or(false),
            error: text("error"),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawUpdateStatus {
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    update_available: Option<bool>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    checked_at: Option<String>,
    #[serde(default)]
    next_check_at: Option<String>,
    #[serde(default)]
    remote: Option<Value>,
}

/// Typed contents of `update-status.json`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatusDocument {
    pub state: String,
    pub update_available: bool,
    pub reason: String,
    pub message: String,
    pub checked_at: Option<DateTime<Utc>>,
    pub next_check_at: Option<DateTime<Utc>>,
    pub remote: RemoteMetadata,
}

impl From<RawUpdateStatus> for UpdateStatusDocument {
    fn from(raw: RawUpdateStatus) -> Self {
        Self {
            state: raw.state.unwrap_or_else(|| "unknown".to_string()),
            update_available: raw.update_available.unwrap_or(false),
            reason: raw.reason.unwrap_or_default(),
            message: raw.message.unwrap_or_default(),
            checked_at: parse_timestamp(raw.checked_at.as_deref()),
            next_check_at: parse_timestamp(raw.next_check_at.as_deref()),
            remote: RemoteMetadata::from_value(raw.remote.as_ref()),
        }
    }
}

/// Update status as shown to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateStatusSnapshot {
    pub state: String,
    pub update_available: bool,
    pub reason: String,
    pub message: String,
    pub checked_at: Option<DateTime<Utc>>,
    pub next_check_at: Option<DateTime<Utc>>,
    pub marker_exists: bool,
    pub remote: RemoteMetadata,
}

impl UpdateStatusSnapshot {
    fn fallback(marker_exists: bool, reason: &str) -> Self {
        Self {
            state: "unknown".to_string(),
            update_available: marker_exists,
            reason: reason.to_string(),
            message: String::new(),
            checked_at: None,
            next_check_at: None,
            marker_exists,
            remote: RemoteMetadata::default(),
        }
    }
}

/// Parse `{data_path}/update-status.json`.
pub fn load_update_status(data_path: &Path) -> Result<UpdateStatusDocument, StatusReadError> {
    read_document::<RawUpdateStatus>(&data_path.join(UPDATE_STATUS_FILE)).map(Into::into)
}

/// Update status as shown to callers. Never fails.
///
/// The zero-byte marker is checked first and OR'ed into `update_available`,
/// so it still signals an update when the JSON document is absent or corrupt.
pub fn read_update_status(data_path: Option<&Path>) -> UpdateStatusSnapshot {
    let Some(root) = layout::configured(data_path) else {
        return UpdateStatusSnapshot::fallback(false, REASON_STATUS_ABSENT);
    };

    let marker_exists = root.join(UPDATE_MARKER_FILE).is_file();

    match load_update_status(root) {
        Ok(doc) => UpdateStatusSnapshot {
            state: doc.state,
            update_available: doc.update_available || marker_exists,
            reason: doc.reason,
            message: doc.message,
            checked_at: doc.checked_at,
            next_check_at: doc.next_check_at,
            marker_exists,
            remote: doc.remote,
        },
        Err(err) => {
            log_degradation(UPDATE_STATUS_FILE, &err);
            let reason = if err.is_missing() {
                REASON_STATUS_ABSENT
            } else {
                REASON_STATUS_INVALID
            };
            UpdateStatusSnapshot::fallback(marker_exists, reason)
        }
    }
}
