//! `wayfarer probe` command implementation

use crate::CliError;
use crate::context::CliContext;
use crate::output::{print_json, status_icon};
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use wayfarer_build::health::ServiceHealthProbe;

pub async fn run(ctx: &CliContext, url: Option<&str>) -> Result<(), CliError> {
    let base_url = url.or(ctx.config.engine_url());
    let client = ctx.http_client()?;
    let probe = ServiceHealthProbe::from_config(&ctx.config);
    let outcome = probe.probe(base_url, &client, &CancellationToken::new()).await;

    if ctx.format.is_json() {
        print_json(&outcome)?;
    } else if outcome.reachable {
        println!("{} routing engine reachable", status_icon(true));
    } else {
        println!(
            "{} routing engine unreachable: {}",
            status_icon(false),
            outcome.error.as_deref().unwrap_or_default().red()
        );
    }

    match outcome.error {
        Some(code) if !outcome.reachable => Err(CliError::Unreachable(code)),
        _ => Ok(()),
    }
}
