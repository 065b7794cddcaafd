//! Aggregated routing status, as served by the status endpoint.

use crate::config::OrchestratorConfig;
use crate::health::{ProbeOutcome, ServiceHealthProbe};
use crate::layout;
use crate::readiness::check_readiness;
use crate::status::{BuildProgressSnapshot, UpdateStatusSnapshot, read_build_progress, read_update_status};
use reqwest::Client;
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub routing_enabled: bool,
    pub ready: bool,
    pub reason: String,
    pub active_dataset: Option<PathBuf>,
    pub build: BuildProgressSnapshot,
    pub update: UpdateStatusSnapshot,
    /// `None` until the engine has been probed.
    pub service: Option<ProbeOutcome>,
}

impl StatusReport {
    /// Filesystem part of the report; `service` stays `None`.
    pub fn from_filesystem(config: &OrchestratorConfig) -> Self {
        let data_path = config.data_path();
        let readiness = check_readiness(data_path);

        Self {
            routing_enabled: !readiness.is_disabled(),
            ready: readiness.is_ready(),
            reason: readiness.reason().to_string(),
            active_dataset: layout::resolve_active_dataset(data_path),
            build: read_build_progress(data_path, readiness.is_ready()),
            update: read_update_status(data_path),
            service: None,
        }
    }

    /// Full report including a live probe of the routing engine.
    pub async fn collect(
        config: &OrchestratorConfig,
        probe: &ServiceHealthProbe,
        client: &Client,
        cancel: &CancellationToken,
    ) -> Self {
        let mut report = Self::from_filesystem(config);
        report.service = Some(probe.probe(config.engine_url(), client, cancel).await);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::BuildState;

    #[tokio::test]
    async fn disabled_routing_report() {
        let config = OrchestratorConfig::default();
        let report = StatusReport::collect(
            &config,
            &ServiceHealthProbe::default(),
            &Client::new(),
            &CancellationToken::new(),
        )
        .await;

        assert!(!report.routing_enabled);
        assert!(report.ready);
        assert_eq!(report.reason, "");
        assert_eq!(report.build.state, BuildState::Completed);
        assert_eq!(report.build.progress_pct, 100);
        let service = report.service.expect("collect always probes");
        assert!(!service.reachable);
        assert_eq!(service.error.as_deref(), Some("base_url_absente"));
    }

    #[test]
    fn not_ready_report_serializes_snake_case() {
        let dir = tempfile::tempdir().unwrap();
        let config = OrchestratorConfig::default().with_data_path(dir.path());
        let report = StatusReport::from_filesystem(&config);

        assert!(report.routing_enabled);
        assert!(!report.ready);
        assert_eq!(report.reason, "tiles directory missing");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["build"]["state"], "unknown");
        assert_eq!(json["build"]["phase"], "initialisation");
        assert_eq!(json["update"]["reason"], "status_absent");
        assert!(json["service"].is_null());
    }

    #[test]
    fn filesystem_report_does_not_claim_missing_url() {
        let config = OrchestratorConfig::default().with_engine_url("http://127.0.0.1:8002");
        let report = StatusReport::from_filesystem(&config);
        assert_eq!(report.service, None);
    }
}
