//! Wayfarer CLI - routing data readiness, build status and build launches

mod cli;
mod commands;
mod context;
mod error;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::CliContext;
use tracing_subscriber::EnvFilter;

pub use error::CliError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --verbose; logs go to stderr so `--json` stays parseable
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_command_async(cli))
}

async fn run_command_async(cli: Cli) -> anyhow::Result<()> {
    let ctx = CliContext::load(&cli)?;

    match cli.command {
        Commands::Ready => commands::ready::run(&ctx)?,
        Commands::Status => commands::status::run(&ctx).await?,
        Commands::UpdateStatus => commands::update_status::run(&ctx)?,
        Commands::Build { force } => commands::build::run(&ctx, force)?,
        Commands::Probe { url } => commands::probe::run(&ctx, url.as_deref()).await?,
        Commands::Serve { interval } => commands::serve::run(&ctx, interval).await?,
    }

    Ok(())
}
