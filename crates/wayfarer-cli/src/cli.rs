//! CLI command definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Wayfarer - routing data orchestrator
#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short = 'c', long, global = true, env = "WAYFARER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Routing data directory, overrides the configuration
    #[arg(short = 'd', long, global = true)]
    pub data_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Check whether routing data can serve requests (exit code 1 when not)
    Ready,

    /// Show readiness, build progress, update status and engine health
    Status,

    /// Show the result of the last remote update check
    UpdateStatus,

    /// Start the routing data build in the background
    Build {
        /// Force a full rebuild
        #[arg(short, long)]
        force: bool,
    },

    /// Probe the routing engine's health endpoint
    Probe {
        /// Engine base URL, overrides the configuration
        #[arg(short, long)]
        url: Option<String>,
    },

    /// Run as host process: startup auto-update, then watch readiness until Ctrl-C
    Serve {
        /// Seconds between readiness checks
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wayfarer", "build", "--force", "--json", "-d", "/srv/valhalla"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.data_path, Some(PathBuf::from("/srv/valhalla")));
        assert!(matches!(cli.command, Commands::Build { force: true }));
    }

    #[test]
    fn serve_interval_defaults() {
        let cli = Cli::try_parse_from(["wayfarer", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { interval: 30 }));
    }
}
