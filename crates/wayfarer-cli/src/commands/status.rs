//! `wayfarer status` command implementation

use crate::CliError;
use crate::commands::update_status::print_update;
use crate::context::CliContext;
use crate::output::{or_dash, print_json, status_icon};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use wayfarer_build::health::ServiceHealthProbe;
use wayfarer_build::report::StatusReport;

pub async fn run(ctx: &CliContext) -> Result<(), CliError> {
    let client = ctx.http_client()?;
    let probe = ServiceHealthProbe::from_config(&ctx.config);
    let report = StatusReport::collect(&ctx.config, &probe, &client, &CancellationToken::new()).await;

    if ctx.format.is_json() {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &StatusReport) {
    println!("{} Wayfarer routing status", "→".green());
    if !report.routing_enabled {
        println!("  Routing: {}", "disabled".yellow());
    } else {
        println!(
            "  Dataset: {}",
            or_dash(report.active_dataset.as_ref().map(|p| p.display().to_string())).cyan()
        );
    }
    println!();

    println!("{} {}", status_icon(report.ready), "Readiness".bold());
    if !report.ready {
        println!("    {}", report.reason.red());
    }

    let build = &report.build;
    println!("  {}", "Build".bold());
    println!(
        "    State: {}   Phase: {}   Progress: {}%",
        build.state.as_str().yellow(),
        build.phase,
        build.progress_pct
    );
    println!("    {}", build.message);
    println!("    Updated: {}", or_dash(build.updated_at.map(|t| t.to_rfc3339())));

    print_update(&report.update);

    match &report.service {
        Some(service) => {
            println!("{} {}", status_icon(service.reachable), "Engine".bold());
            if let Some(error) = &service.error {
                println!("    {}", error.red());
            }
        }
        None => println!("{} {}", "-".yellow(), "Engine (not probed)".bold()),
    }
}
