//! On-disk layout of a routing dataset and active dataset resolution.
//!
//! ```text
//! {data_path}/
//!   tiles/**/*.gph              tile artifacts
//!   valhalla.json               engine config
//!   admins.sqlite               admin boundaries
//!   live/valhalla.json          promoted copy; non-empty => live/ is served
//!   build-status.json           progress written by the build script
//!   update-status.json          remote update check result
//!   .valhalla_update_available  zero-byte update marker
//!   .build.lock                 zero-byte build lock
//! ```

use std::path::{Path, PathBuf};

pub const TILES_DIR: &str = "tiles";
pub const TILE_EXTENSION: &str = "gph";
pub const CONFIG_FILE: &str = "valhalla.json";
pub const ADMIN_DB_FILE: &str = "admins.sqlite";
pub const LIVE_DIR: &str = "live";
pub const BUILD_STATUS_FILE: &str = "build-status.json";
pub const UPDATE_STATUS_FILE: &str = "update-status.json";
pub const UPDATE_MARKER_FILE: &str = ".valhalla_update_available";
pub const BUILD_LOCK_FILE: &str = ".build.lock";
pub const BUILD_LOG_FILE: &str = "build.log";

/// Returns the data path if one is configured. An empty path counts as unset.
pub fn configured(data_path: Option<&Path>) -> Option<&Path> {
    data_path.filter(|p| !p.as_os_str().is_empty())
}

/// Resolve the directory actually served.
///
/// `{data_path}/live` wins when it holds a non-empty config file; otherwise
/// the data path itself is served. Returns `None` when routing is disabled.
pub fn resolve_active_dataset(data_path: Option<&Path>) -> Option<PathBuf> {
    let root = configured(data_path)?;
    let live = root.join(LIVE_DIR);

    let promoted = std::fs::metadata(live.join(CONFIG_FILE))
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false);

    if promoted {
        Some(live)
    } else {
        Some(root.to_path_buf())
    }
}
