//! Orchestrator configuration
//!
//! Sources, lowest to highest precedence:
//!
//! - built-in defaults
//! - an optional TOML / YAML / JSON file (format detected from the extension)
//! - `WAYFARER_*` environment variables (`WAYFARER_DATA_PATH`, `WAYFARER_ENGINE_URL`, ...)

use crate::error::{ConfigError, ConfigResult};
use config::{Config as Cfg, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "WAYFARER";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Root of the routing dataset. Unset or empty disables routing.
    pub data_path: Option<PathBuf>,
    /// Base URL of the routing engine HTTP service.
    pub engine_url: Option<String>,
    /// Health endpoint path on the routing engine.
    pub health_path: String,
    pub probe_timeout_secs: u64,
    /// Age after which an on-disk build lock is considered abandoned.
    pub lock_stale_after_secs: u64,
    /// Build script stem; `.sh` or `.ps1` is appended per platform.
    pub script_name: String,
    /// Script directory, relative to the repository root.
    pub scripts_dir: PathBuf,
    pub auto_update_on_startup: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            engine_url: None,
            health_path: "/status".to_string(),
            probe_timeout_secs: 3,
            lock_stale_after_secs: 300,
            script_name: "build-valhalla".to_string(),
            scripts_dir: PathBuf::from("scripts"),
            auto_update_on_startup: true,
        }
    }
}

impl OrchestratorConfig {
    /// Load from an optional file plus the environment, then validate.
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Cfg::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.probe_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "probe_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.lock_stale_after_secs == 0 {
            return Err(ConfigError::Invalid(
                "lock_stale_after_secs must be greater than zero".to_string(),
            ));
        }
        if self.script_name.trim().is_empty() {
            return Err(ConfigError::Invalid("script_name must not be empty".to_string()));
        }
        if let Some(url) = self.engine_url.as_deref().filter(|u| !u.trim().is_empty()) {
            crate::health::parse_base_url(url)
                .map_err(|_| ConfigError::Invalid(format!("engine_url is not an absolute http(s) URL: {url}")))?;
        }
        Ok(())
    }

    pub fn data_path(&self) -> Option<&Path> {
        crate::layout::configured(self.data_path.as_deref())
    }

    pub fn engine_url(&self) -> Option<&str> {
        self.engine_url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn lock_stale_after(&self) -> Duration {
        Duration::from_secs(self.lock_stale_after_secs)
    }

    pub fn with_data_path(mut self, data_path: impl Into<PathBuf>) -> Self {
        self.data_path = Some(data_path.into());
        self
    }

    pub fn with_engine_url(mut self, url: impl Into<String>) -> Self {
        self.engine_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_preserve_five_minute_staleness() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.lock_stale_after(), Duration::from_secs(300));
        assert_eq!(config.health_path, "/status");
        assert!(config.data_path().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_data_path_counts_as_unset() {
        let config = OrchestratorConfig::default().with_data_path("");
        assert!(config.data_path().is_none());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("wayfarer.toml");
        std::fs::write(
            &file,
            "data_path = \"/srv/routing/valhalla\"\nengine_url = \"http://localhost:8002\"\nlock_stale_after_secs = 900\n",
        )
        .unwrap();

        let config = OrchestratorConfig::load(Some(&file)).unwrap();
        assert_eq!(config.data_path(), Some(Path::new("/srv/routing/valhalla")));
        assert_eq!(config.engine_url(), Some("http://localhost:8002"));
        assert_eq!(config.lock_stale_after(), Duration::from_secs(900));
        assert_eq!(config.probe_timeout_secs, 3);
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let result = OrchestratorConfig::load(Some(Path::new("/nonexistent/wayfarer.toml")));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn zero_timeouts_are_rejected() {
        let config = OrchestratorConfig {
            probe_timeout_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = OrchestratorConfig {
            lock_stale_after_secs: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn relative_engine_url_is_rejected() {
        let config = OrchestratorConfig::default().with_engine_url("localhost:8002/status");
        assert!(config.validate().is_err());
    }
}
