//! `wayfarer ready` command implementation

use crate::CliError;
use crate::context::CliContext;
use crate::output::{print_json, status_icon};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use wayfarer_build::layout;
use wayfarer_build::readiness::check_readiness;

#[derive(Debug, Serialize)]
struct ReadyView {
    ready: bool,
    reason: &'static str,
    routing_enabled: bool,
    active_dataset: Option<PathBuf>,
}

pub fn run(ctx: &CliContext) -> Result<(), CliError> {
    let data_path = ctx.config.data_path();
    let readiness = check_readiness(data_path);
    let view = ReadyView {
        ready: readiness.is_ready(),
        reason: readiness.reason(),
        routing_enabled: !readiness.is_disabled(),
        active_dataset: layout::resolve_active_dataset(data_path),
    };

    if ctx.format.is_json() {
        print_json(&view)?;
    } else if readiness.is_disabled() {
        println!("{} routing disabled (no data path configured)", "-".yellow());
    } else if view.ready {
        println!("{} routing data ready", status_icon(true));
        if let Some(active) = &view.active_dataset {
            println!("    Dataset: {}", active.display().to_string().cyan());
        }
    } else {
        println!("{} routing data not ready: {}", status_icon(false), view.reason.red());
    }

    if !view.ready {
        return Err(CliError::NotReady(view.reason.to_string()));
    }
    Ok(())
}
