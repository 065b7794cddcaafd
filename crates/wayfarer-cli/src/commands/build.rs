//! `wayfarer build` command implementation
//!
//! Launches the build script and returns immediately. The build keeps running
//! after this process exits; its on-disk lock is recovered by staleness rules.

use crate::CliError;
use crate::context::CliContext;
use crate::output::{print_json, status_icon};
use colored::Colorize;
use serde::Serialize;
use wayfarer_build::{BuildCoordinator, BuildLaunchResult};

#[derive(Debug, Serialize)]
struct BuildView<'a> {
    #[serde(flatten)]
    result: &'a BuildLaunchResult,
    http_status: u16,
}

pub fn run(ctx: &CliContext, force: bool) -> Result<(), CliError> {
    let coordinator = BuildCoordinator::from_config(&ctx.config);
    let result = coordinator.try_start_build(ctx.config.data_path(), force);

    if ctx.format.is_json() {
        print_json(&BuildView {
            result: &result,
            http_status: result.reason.http_status(),
        })?;
    } else if let Some(pid) = result.pid.filter(|_| result.started) {
        println!("{} build started (pid {})", status_icon(true), pid.to_string().cyan());
        if force {
            println!("    Full rebuild requested");
        }
    } else {
        println!(
            "{} build not started [{}] {}",
            status_icon(false),
            result.reason.as_str().yellow(),
            result.message
        );
    }

    if !result.started {
        return Err(CliError::BuildRejected {
            reason: result.reason,
            message: result.message,
        });
    }
    Ok(())
}
