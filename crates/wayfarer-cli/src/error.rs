use wayfarer_build::{ConfigError, LaunchReason};

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Routing data not ready: {0}")]
    NotReady(String),

    #[error("Build not started ({reason}, HTTP {}): {message}", .reason.http_status())]
    BuildRejected {
        reason: LaunchReason,
        message: String,
    },

    #[error("Routing engine unreachable: {0}")]
    Unreachable(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
