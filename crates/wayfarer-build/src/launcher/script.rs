//! Platform launch strategies for the external build script.

use super::reason::{LaunchReason, Rejection};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

/// Where the build script lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLocation {
    pub scripts_dir: PathBuf,
    pub script_name: String,
}

impl ScriptLocation {
    pub fn new(scripts_dir: impl Into<PathBuf>, script_name: impl Into<String>) -> Self {
        Self {
            scripts_dir: scripts_dir.into(),
            script_name: script_name.into(),
        }
    }

    fn script_path(&self, repo_root: &Path, extension: &str) -> PathBuf {
        repo_root
            .join(&self.scripts_dir)
            .join(format!("{}.{extension}", self.script_name))
    }
}

/// Turns a repository root into a ready-to-spawn command for the build script.
///
/// Implementations check for the interpreter first (`no_shell`), then the
/// script itself (`no_script`).
pub trait BuildScriptLauncher: Send + Sync {
    fn name(&self) -> &'static str;

    fn prepare(&self, repo_root: &Path, script: &ScriptLocation) -> Result<Command, Rejection>;
}

/// `/bin/sh` running `<script>.sh`.
#[derive(Debug, Clone)]
pub struct PosixShellLauncher {
    fixed_shell: Option<PathBuf>,
    search_path: Option<OsString>,
}

impl PosixShellLauncher {
    pub fn from_env() -> Self {
        Self {
            fixed_shell: Some(PathBuf::from("/bin/sh")),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Only look for `sh` on the given search path.
    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            fixed_shell: None,
            search_path: Some(search_path.into()),
        }
    }

    fn shell(&self) -> Option<PathBuf> {
        self.fixed_shell
            .clone()
            .filter(|shell| shell.is_file())
            .or_else(|| find_in_path("sh", self.search_path.as_deref()))
    }
}

impl BuildScriptLauncher for PosixShellLauncher {
    fn name(&self) -> &'static str {
        "posix-sh"
    }

    fn prepare(&self, repo_root: &Path, script: &ScriptLocation) -> Result<Command, Rejection> {
        let shell = self
            .shell()
            .ok_or_else(|| Rejection::new(LaunchReason::NoShell, "no POSIX shell found"))?;

        let script_path = script.script_path(repo_root, "sh");
        if !script_path.is_file() {
            return Err(Rejection::new(
                LaunchReason::NoScript,
                format!("build script not found: {}", script_path.display()),
            ));
        }

        let mut cmd = Command::new(shell);
        cmd.arg(script_path);
        Ok(cmd)
    }
}

/// `pwsh` (or Windows PowerShell) running `<script>.ps1`.
#[derive(Debug, Clone)]
pub struct PowerShellLauncher {
    search_path: Option<OsString>,
}

impl PowerShellLauncher {
    pub fn from_env() -> Self {
        Self {
            search_path: std::env::var_os("PATH"),
        }
    }

    pub fn with_search_path(search_path: impl Into<OsString>) -> Self {
        Self {
            search_path: Some(search_path.into()),
        }
    }
}

impl BuildScriptLauncher for PowerShellLauncher {
    fn name(&self) -> &'static str {
        "powershell"
    }

    fn prepare(&self, repo_root: &Path, script: &ScriptLocation) -> Result<Command, Rejection> {
        let shell = ["pwsh", "powershell"]
            .iter()
            .find_map(|candidate| find_in_path(candidate, self.search_path.as_deref()))
            .ok_or_else(|| Rejection::new(LaunchReason::NoShell, "no PowerShell executable on PATH"))?;

        let script_path = script.script_path(repo_root, "ps1");
        if !script_path.is_file() {
            return Err(Rejection::new(
                LaunchReason::NoScript,
                format!("build script not found: {}", script_path.display()),
            ));
        }

        let mut cmd = Command::new(shell);
        cmd.args(["-NoProfile", "-ExecutionPolicy", "Bypass", "-File"])
            .arg(script_path);
        Ok(cmd)
    }
}

/// The launcher for the platform this binary was built for.
pub fn platform_launcher() -> Arc<dyn BuildScriptLauncher> {
    #[cfg(windows)]
    {
        Arc::new(PowerShellLauncher::from_env())
    }

    #[cfg(not(windows))]
    {
        Arc::new(PosixShellLauncher::from_env())
    }
}

pub(crate) fn find_in_path(binary: &str, path_var: Option<&OsStr>) -> Option<PathBuf> {
    let path_var = path_var?;

    std::env::split_paths(path_var).find_map(|dir| {
        let direct = dir.join(binary);
        if direct.is_file() {
            return Some(direct);
        }

        #[cfg(windows)]
        {
            for ext in [".exe", ".cmd", ".bat"] {
                let with_ext = dir.join(format!("{binary}{ext}"));
                if with_ext.is_file() {
                    return Some(with_ext);
                }
            }
        }

        None
    })
}
