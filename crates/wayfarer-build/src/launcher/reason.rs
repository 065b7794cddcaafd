//! Launch outcome codes and their HTTP mapping.

use serde::{Serialize, Serializer};
use std::fmt;

/// Closed set of launch outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaunchReason {
    Started,
    AlreadyRunning,
    DataPathInvalid,
    RepoRootNotFound,
    NoShell,
    NoScript,
    StartFailed,
}

impl LaunchReason {
    pub const ALL: [LaunchReason; 7] = [
        LaunchReason::Started,
        LaunchReason::AlreadyRunning,
        LaunchReason::DataPathInvalid,
        LaunchReason::RepoRootNotFound,
        LaunchReason::NoShell,
        LaunchReason::NoScript,
        LaunchReason::StartFailed,
    ];

    /// Wire code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::AlreadyRunning => "already_running",
            Self::DataPathInvalid => "data_path_invalid",
            Self::RepoRootNotFound => "repo_root_not_found",
            Self::NoShell => "no_shell",
            Self::NoScript => "no_script",
            Self::StartFailed => "start_failed",
        }
    }

    /// Status code used by the HTTP layer for the build-trigger endpoint.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Started => 202,
            Self::AlreadyRunning => 409,
            Self::DataPathInvalid => 400,
            Self::RepoRootNotFound | Self::NoShell | Self::NoScript | Self::StartFailed => 500,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|reason| reason.as_str() == code)
    }
}

impl fmt::Display for LaunchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LaunchReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A launch attempt that stopped before spawning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: LaunchReason,
    pub message: String,
}

impl Rejection {
    pub fn new(reason: LaunchReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// Result of [`BuildCoordinator::try_start_build`](super::BuildCoordinator::try_start_build).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildLaunchResult {
    pub started: bool,
    pub reason: LaunchReason,
    pub message: String,
    pub pid: Option<u32>,
}

impl BuildLaunchResult {
    pub fn started(pid: u32) -> Self {
        Self {
            started: true,
            reason: LaunchReason::Started,
            message: "Routing data build started.".to_string(),
            pid: Some(pid),
        }
    }

    pub fn already_running(message: impl Into<String>) -> Self {
        Rejection::new(LaunchReason::AlreadyRunning, message).into()
    }
}

impl From<Rejection> for BuildLaunchResult {
    fn from(rejection: Rejection) -> Self {
        Self {
            started: false,
            reason: rejection.reason,
            message: rejection.message,
            pid: None,
        }
    }
}
