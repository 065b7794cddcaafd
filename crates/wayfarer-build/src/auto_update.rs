//! Startup-time auto-update trigger.
//!
//! Runs once when the host process starts: if no build is running and an
//! update is available, launch a (non-forced) build. It never blocks or aborts
//! startup; panics inside the check are caught by the task join and logged.

use crate::launcher::{BuildLaunchResult, BuildStarter};
use crate::readiness::check_readiness;
use crate::status::{BuildState, read_build_progress, read_update_status};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// What the trigger decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoUpdateOutcome {
    RoutingDisabled,
    BuildRunning,
    NoUpdate,
    Launched(BuildLaunchResult),
}

pub struct AutoUpdateTrigger {
    data_path: Option<PathBuf>,
    starter: Arc<dyn BuildStarter>,
}

impl AutoUpdateTrigger {
    pub fn new(data_path: Option<PathBuf>, starter: Arc<dyn BuildStarter>) -> Self {
        Self { data_path, starter }
    }

    pub fn run_once(&self) -> AutoUpdateOutcome {
        let data_path = crate::layout::configured(self.data_path.as_deref());
        let Some(data_path) = data_path else {
            return AutoUpdateOutcome::RoutingDisabled;
        };

        let readiness = check_readiness(Some(data_path));
        let progress = read_build_progress(Some(data_path), readiness.is_ready());
        if progress.state == BuildState::Running {
            info!(
                phase = %progress.phase,
                progress_pct = progress.progress_pct,
                "build already running, skipping startup update"
            );
            return AutoUpdateOutcome::BuildRunning;
        }

        let update = read_update_status(Some(data_path));
        if !update.update_available {
            return AutoUpdateOutcome::NoUpdate;
        }

        let result = self.starter.try_start_build(Some(data_path), false);
        if result.started {
            info!(pid = ?result.pid, update_reason = %update.reason, "startup update build launched");
        } else {
            warn!(reason = %result.reason, message = %result.message, "startup update build not launched");
        }
        AutoUpdateOutcome::Launched(result)
    }

    /// Run [`run_once`](Self::run_once) on a blocking task. Must be called
    /// from within a Tokio runtime.
    pub fn spawn_on_startup(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(move || self.run_once()).await {
                Ok(outcome) => info!(?outcome, "startup auto-update check finished"),
                Err(e) => error!(error = %e, "startup auto-update check failed"),
            }
        })
    }
}
