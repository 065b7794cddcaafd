//! Readiness probe: can routing requests be served from the active dataset?
//!
//! Checks run in a fixed order and stop at the first failure. Callers key UI
//! messaging off the returned reason, so both the order and the thresholds are
//! part of the contract:
//!
//! 1. tiles directory present
//! 2. config file present and at least [`MIN_CONFIG_BYTES`]
//! 3. admin database present and at least [`MIN_ADMIN_DB_BYTES`]
//! 4. at least one tile artifact under `tiles/`

use crate::layout::{self, ADMIN_DB_FILE, CONFIG_FILE, TILES_DIR, TILE_EXTENSION};
use serde::Serialize;
use std::fmt;
use std::path::Path;

pub const MIN_CONFIG_BYTES: u64 = 100;
pub const MIN_ADMIN_DB_BYTES: u64 = 1024;

/// Why a configured dataset cannot serve requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotReadyReason {
    TilesDirMissing,
    ConfigMissing,
    AdminDbMissing,
    NoTileArtifacts,
}

impl NotReadyReason {
    pub fn message(&self) -> &'static str {
        match self {
            Self::TilesDirMissing => "tiles directory missing",
            Self::ConfigMissing => "config file absent or empty",
            Self::AdminDbMissing => "admin database absent or too small",
            Self::NoTileArtifacts => "no tile artifacts detected",
        }
    }
}

impl fmt::Display for NotReadyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Readiness of a data path.
///
/// `Disabled` (no data path configured) is a healthy, non-blocking state and
/// reports as ready with an empty reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Disabled,
    Ready,
    NotReady(NotReadyReason),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        !matches!(self, Readiness::NotReady(_))
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Readiness::Disabled)
    }

    /// Reason string for the external `(bool, reason)` view; empty when ready.
    pub fn reason(&self) -> &'static str {
        match self {
            Readiness::NotReady(reason) => reason.message(),
            Readiness::Disabled | Readiness::Ready => "",
        }
    }

    pub fn not_ready_reason(&self) -> Option<NotReadyReason> {
        match self {
            Readiness::NotReady(reason) => Some(*reason),
            _ => None,
        }
    }
}

/// Evaluate readiness of the active dataset under `data_path`.
///
/// Pure read, safe for any number of concurrent callers.
pub fn check_readiness(data_path: Option<&Path>) -> Readiness {
    let Some(active) = layout::resolve_active_dataset(data_path) else {
        return Readiness::Disabled;
    };

    let tiles = active.join(TILES_DIR);
    if !tiles.is_dir() {
        return Readiness::NotReady(NotReadyReason::TilesDirMissing);
    }

    if !file_at_least(&active.join(CONFIG_FILE), MIN_CONFIG_BYTES) {
        return Readiness::NotReady(NotReadyReason::ConfigMissing);
    }

    if !file_at_least(&active.join(ADMIN_DB_FILE), MIN_ADMIN_DB_BYTES) {
        return Readiness::NotReady(NotReadyReason::AdminDbMissing);
    }

    if !contains_tile_artifact(&tiles) {
        return Readiness::NotReady(NotReadyReason::NoTileArtifacts);
    }

    Readiness::Ready
}

/// `(ready, reason)` view of [`check_readiness`].
pub fn is_ready(data_path: Option<&Path>) -> (bool, &'static str) {
    let readiness = check_readiness(data_path);
    (readiness.is_ready(), readiness.reason())
}

fn file_at_least(path: &Path, min_len: u64) -> bool {
    std::fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() >= min_len)
        .unwrap_or(false)
}

/// Depth-first search that stops at the first `*.gph` file.
/// Unreadable sub-directories are skipped.
fn contains_tile_artifact(dir: &Path) -> bool {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return false;
    };

    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            subdirs.push(path);
        } else if path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(TILE_EXTENSION))
        {
            return true;
        }
    }

    subdirs.iter().any(|sub| contains_tile_artifact(sub))
}
