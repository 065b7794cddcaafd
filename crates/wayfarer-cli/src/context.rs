//! Resolved configuration shared by all commands

use crate::CliError;
use crate::cli::Cli;
use crate::output::OutputFormat;
use reqwest::Client;
use wayfarer_build::config::OrchestratorConfig;

pub struct CliContext {
    pub config: OrchestratorConfig,
    pub format: OutputFormat,
}

impl CliContext {
    pub fn load(cli: &Cli) -> Result<Self, CliError> {
        let mut config = OrchestratorConfig::load(cli.config.as_deref())?;
        if let Some(data_path) = &cli.data_path {
            config = config.with_data_path(data_path);
        }

        Ok(Self {
            config,
            format: OutputFormat::from_json_flag(cli.json),
        })
    }

    /// HTTP client for engine probes; the per-request timeout comes from the probe.
    pub fn http_client(&self) -> Result<Client, CliError> {
        Ok(Client::builder().build()?)
    }
}
