//! `wayfarer serve` command implementation
//!
//! Host-process mode: runs the startup auto-update check once, then logs
//! readiness transitions until interrupted.

use crate::CliError;
use crate::context::CliContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use wayfarer_build::BuildCoordinator;
use wayfarer_build::auto_update::AutoUpdateTrigger;
use wayfarer_build::readiness::{Readiness, check_readiness};

pub async fn run(ctx: &CliContext, interval_secs: u64) -> Result<(), CliError> {
    let config = &ctx.config;
    let coordinator = Arc::new(BuildCoordinator::from_config(config));

    let startup = if config.auto_update_on_startup {
        let trigger = AutoUpdateTrigger::new(config.data_path().map(Into::into), coordinator.clone());
        Some(trigger.spawn_on_startup())
    } else {
        info!("startup auto-update disabled");
        None
    };

    let shutdown = CancellationToken::new();
    let watcher = tokio::spawn(watch_readiness(
        coordinator.clone(),
        config.data_path().map(Into::into),
        Duration::from_secs(interval_secs.max(1)),
        shutdown.clone(),
    ));

    info!(data_path = ?config.data_path(), "wayfarer serving, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    shutdown.cancel();

    if let Some(startup) = startup {
        if let Err(e) = startup.await {
            warn!(error = %e, "startup task did not finish cleanly");
        }
    }
    if let Err(e) = watcher.await {
        warn!(error = %e, "readiness watcher did not finish cleanly");
    }
    Ok(())
}

/// Tracks the last seen readiness and logs changes.
#[derive(Debug, Default)]
struct ReadinessWatch {
    last: Option<Readiness>,
}

impl ReadinessWatch {
    /// Returns true when `current` differs from the previous observation.
    fn observe(&mut self, current: Readiness) -> bool {
        if self.last == Some(current) {
            return false;
        }
        match current {
            Readiness::Disabled => info!("routing disabled"),
            Readiness::Ready => info!("routing data ready"),
            Readiness::NotReady(reason) => info!(%reason, "routing data not ready"),
        }
        self.last = Some(current);
        true
    }
}

/// Re-check readiness every `every` until `shutdown`, reaping finished builds
/// on each tick. Returns the last readiness seen.
async fn watch_readiness(
    coordinator: Arc<BuildCoordinator>,
    data_path: Option<PathBuf>,
    every: Duration,
    shutdown: CancellationToken,
) -> Option<Readiness> {
    let mut ticker = tokio::time::interval(every);
    let mut watch = ReadinessWatch::default();

    loop {
        tokio::select! {
            biased;
            _ = ticker.tick() => {}
            _ = shutdown.cancelled() => break,
        }

        coordinator.reap_finished();
        watch.observe(check_readiness(data_path.as_deref()));
    }

    watch.last
}
