//! Orchestrator error types

use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("config parsing error: {0}")]
    Parse(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Failure to obtain a typed snapshot from one of the persisted status documents.
///
/// Public readers never surface this; they log it and degrade to a default
/// snapshot. It exists so the degradation point is observable in tests.
#[derive(Debug, Error)]
pub enum StatusReadError {
    #[error("status file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid status document {}: {source}", .path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StatusReadError {
    /// Short, stable label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            StatusReadError::Missing(_) => "missing",
            StatusReadError::Io { .. } => "io",
            StatusReadError::Invalid { .. } => "invalid",
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, StatusReadError::Missing(_))
    }
}
