//! Single-flight launcher for the external routing data build.
//!
//! Two independent layers keep a second build from starting:
//!
//! - an in-process handle to the spawned child, one mutex-guarded slot per
//!   data path, held for the whole decide-then-spawn sequence
//! - the on-disk `.build.lock` marker, which survives host restarts and is
//!   recovered once judged stale (see [`lock`])
//!
//! The spawned build is fire-and-forget. Its progress is observed only by
//! re-reading `build-status.json`.

mod lock;
mod reason;
mod script;

pub use reason::{BuildLaunchResult, LaunchReason, Rejection};
pub use script::{
    BuildScriptLauncher, PosixShellLauncher, PowerShellLauncher, ScriptLocation,
    platform_launcher,
};

use crate::config::OrchestratorConfig;
use crate::layout::{self, BUILD_LOG_FILE};
use chrono::Utc;
use dashmap::DashMap;
use lock::{BuildLock, LockVerdict};
use parking_lot::Mutex;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Environment variable read by the build script to force a full rebuild.
pub const FORCE_REBUILD_ENV: &str = "VALHALLA_FORCE_REBUILD";
/// Environment variable carrying the data path to the build script.
pub const DATA_PATH_ENV: &str = "VALHALLA_DATA_PATH";

/// Anything that can start a routing data build.
pub trait BuildStarter: Send + Sync {
    fn try_start_build(&self, data_path: Option<&Path>, force_rebuild: bool) -> BuildLaunchResult;
}

/// Tunables for [`BuildCoordinator`].
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub stale_after: Duration,
    pub script: ScriptLocation,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self::from_config(&OrchestratorConfig::default())
    }
}

impl LaunchSettings {
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self {
            stale_after: config.lock_stale_after(),
            script: ScriptLocation::new(config.scripts_dir.clone(), config.script_name.clone()),
        }
    }
}

type Slot = Arc<Mutex<Option<Child>>>;

/// Owns the in-process build handles. Create one per hosting process.
pub struct BuildCoordinator {
    settings: LaunchSettings,
    launcher: Arc<dyn BuildScriptLauncher>,
    slots: DashMap<PathBuf, Slot>,
}

impl BuildCoordinator {
    pub fn new(settings: LaunchSettings, launcher: Arc<dyn BuildScriptLauncher>) -> Self {
        Self {
            settings,
            launcher,
            slots: DashMap::new(),
        }
    }

    /// Coordinator using the platform's script launcher.
    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(LaunchSettings::from_config(config), platform_launcher())
    }

    pub fn settings(&self) -> &LaunchSettings {
        &self.settings
    }

    fn slot(&self, key: &Path) -> Slot {
        self.slots
            .entry(key.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    /// PID of the build this process started for `data_path`, if still alive.
    ///
    /// An exited build is reaped on the way: its handle is dropped and its
    /// lock removed.
    pub fn running_pid(&self, data_path: &Path) -> Option<u32> {
        let key = slot_key(data_path);
        let slot = self.slots.get(&key)?.clone();
        let mut handle = slot.lock();
        reap(&key, &mut handle)
    }

    /// Reap every build this process started that has since exited.
    pub fn reap_finished(&self) {
        let slots: Vec<(PathBuf, Slot)> = self
            .slots
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        for (data_path, slot) in slots {
            reap(&data_path, &mut slot.lock());
        }
    }

    /// Start the build script in the background unless a build is already active.
    ///
    /// The whole decision and spawn run under the data path's mutex, so of two
    /// concurrent callers exactly one sees `started`.
    pub fn try_start_build(&self, data_path: Option<&Path>, force_rebuild: bool) -> BuildLaunchResult {
        let Some(data_path) = layout::configured(data_path) else {
            return Rejection::new(LaunchReason::DataPathInvalid, "no data path configured").into();
        };

        let key = slot_key(data_path);
        let slot = self.slot(&key);
        let mut handle = slot.lock();

        match self.launch_locked(&key, &mut handle, force_rebuild) {
            Ok(pid) => BuildLaunchResult::started(pid),
            Err(rejection) => {
                debug!(
                    data_path = %key.display(),
                    reason = %rejection.reason,
                    message = %rejection.message,
                    "build not started"
                );
                rejection.into()
            }
        }
    }

    fn launch_locked(
        &self,
        data_path: &Path,
        handle: &mut Option<Child>,
        force_rebuild: bool,
    ) -> Result<u32, Rejection> {
        let lock = BuildLock::at(data_path);

        if let Some(pid) = reap(data_path, handle) {
            return Err(Rejection::new(
                LaunchReason::AlreadyRunning,
                format!("build already running (pid {pid})"),
            ));
        }

        if !data_path.is_dir() {
            return Err(Rejection::new(
                LaunchReason::DataPathInvalid,
                format!("data path does not exist: {}", data_path.display()),
            ));
        }

        if lock.exists() {
            match lock.assess(data_path, self.settings.stale_after, Utc::now()) {
                LockVerdict::Held => {
                    return Err(Rejection::new(
                        LaunchReason::AlreadyRunning,
                        "a build lock is held for this data path",
                    ));
                }
                LockVerdict::Stale(why) => {
                    info!(lock = %lock.path().display(), reason = why, "removing stale build lock");
                    lock.release();
                }
            }
        }

        let repo_root = repo_root(data_path)
            .filter(|root| root.join(&self.settings.script.scripts_dir).is_dir())
            .ok_or_else(|| {
                Rejection::new(
                    LaunchReason::RepoRootNotFound,
                    format!("no repository root with scripts above {}", data_path.display()),
                )
            })?;

        let mut cmd = self.launcher.prepare(&repo_root, &self.settings.script)?;
        cmd.current_dir(&repo_root)
            .env(DATA_PATH_ENV, data_path)
            .stdin(Stdio::null());
        if force_rebuild {
            cmd.env(FORCE_REBUILD_ENV, "1");
        }
        attach_build_log(&mut cmd, data_path);
        detach(&mut cmd);

        if let Err(e) = lock.acquire() {
            warn!(lock = %lock.path().display(), error = %e, "could not write build lock");
        }

        let child = cmd.spawn().map_err(|e| {
            error!(launcher = self.launcher.name(), error = %e, "failed to spawn build script");
            lock.release();
            Rejection::new(LaunchReason::StartFailed, e.to_string())
        })?;

        let pid = child.id();
        info!(
            pid,
            data_path = %data_path.display(),
            force_rebuild,
            launcher = self.launcher.name(),
            "routing data build started"
        );
        *handle = Some(child);
        Ok(pid)
    }
}

impl BuildStarter for BuildCoordinator {
    fn try_start_build(&self, data_path: Option<&Path>, force_rebuild: bool) -> BuildLaunchResult {
        BuildCoordinator::try_start_build(self, data_path, force_rebuild)
    }
}

/// Returns the pid while the child runs; otherwise clears the handle, removing
/// the lock if the child was seen exiting.
fn reap(data_path: &Path, handle: &mut Option<Child>) -> Option<u32> {
    let child = handle.as_mut()?;
    match child.try_wait() {
        Ok(None) => return Some(child.id()),
        Ok(Some(status)) => {
            info!(pid = child.id(), %status, "build process exited");
            BuildLock::at(data_path).release();
        }
        Err(e) => {
            warn!(pid = child.id(), error = %e, "cannot query build process, dropping handle");
        }
    }
    *handle = None;
    None
}

fn slot_key(data_path: &Path) -> PathBuf {
    std::fs::canonicalize(data_path).unwrap_or_else(|_| data_path.to_path_buf())
}

/// Repository root: two levels above the data path (`<repo>/data/valhalla`).
fn repo_root(data_path: &Path) -> Option<PathBuf> {
    data_path
        .ancestors()
        .nth(2)
        .filter(|root| !root.as_os_str().is_empty() && root.is_dir())
        .map(Path::to_path_buf)
}

fn attach_build_log(cmd: &mut std::process::Command, data_path: &Path) {
    let log_path = data_path.join(BUILD_LOG_FILE);
    let opened = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .and_then(|out| out.try_clone().map(|err| (out, err)));

    match opened {
        Ok((out, err)) => {
            cmd.stdout(out).stderr(err);
        }
        Err(e) => {
            warn!(log = %log_path.display(), error = %e, "build log unavailable, discarding output");
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
    }
}

/// Keep terminal signals aimed at the host away from the build.
fn detach(cmd: &mut std::process::Command) {
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
        cmd.creation_flags(CREATE_NEW_PROCESS_GROUP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use tempfile::tempdir;

    /// Launcher that resolves to a fixed program, for deterministic tests.
    struct FixedLauncher(&'static str);

    impl BuildScriptLauncher for FixedLauncher {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn prepare(&self, _repo_root: &Path, _script: &ScriptLocation) -> Result<Command, Rejection> {
            Ok(Command::new(self.0))
        }
    }

    fn repo_with_data() -> (tempfile::TempDir, PathBuf) {
        let repo = tempdir().unwrap();
        let data = repo.path().join("data").join("valhalla");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir(repo.path().join("scripts")).unwrap();
        (repo, data)
    }

    #[test]
    fn unset_data_path_is_invalid() {
        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));
        let result = coordinator.try_start_build(None, false);
        assert!(!result.started);
        assert_eq!(result.reason, LaunchReason::DataPathInvalid);
    }

    #[test]
    fn missing_data_path_is_invalid() {
        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));
        let result = coordinator.try_start_build(Some(Path::new("/nonexistent/data/valhalla")), false);
        assert_eq!(result.reason, LaunchReason::DataPathInvalid);
    }

    #[test]
    fn repo_without_scripts_dir_is_not_found() {
        let repo = tempdir().unwrap();
        let data = repo.path().join("data").join("valhalla");
        std::fs::create_dir_all(&data).unwrap();

        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));
        let result = coordinator.try_start_build(Some(&data), false);
        assert_eq!(result.reason, LaunchReason::RepoRootNotFound);
    }

    #[test]
    fn spawn_failure_reports_start_failed_and_leaves_no_lock() {
        let (_repo, data) = repo_with_data();
        let coordinator = BuildCoordinator::new(
            LaunchSettings::default(),
            Arc::new(FixedLauncher("/nonexistent/wayfarer-build-script")),
        );

        let result = coordinator.try_start_build(Some(&data), false);
        assert!(!result.started);
        assert_eq!(result.reason, LaunchReason::StartFailed);
        assert!(!result.message.is_empty());
        assert!(!BuildLock::at(&data).exists());
        assert!(coordinator.running_pid(&data).is_none());
    }

    #[test]
    fn held_lock_blocks_launch() {
        let (_repo, data) = repo_with_data();
        BuildLock::at(&data).acquire().unwrap();

        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));
        let result = coordinator.try_start_build(Some(&data), false);
        assert_eq!(result.reason, LaunchReason::AlreadyRunning);
        assert!(BuildLock::at(&data).exists());
    }

    #[cfg(unix)]
    #[test]
    fn exited_build_is_reaped_and_unlocked() {
        let (_repo, data) = repo_with_data();
        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));

        let result = coordinator.try_start_build(Some(&data), false);
        assert!(result.started, "{result:?}");
        assert!(BuildLock::at(&data).exists());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while coordinator.running_pid(&data).is_some() {
            assert!(std::time::Instant::now() < deadline, "build never exited");
            std::thread::sleep(Duration::from_millis(20));
        }
        assert!(!BuildLock::at(&data).exists());
    }

    #[cfg(unix)]
    #[test]
    fn reap_finished_sweeps_all_slots() {
        let (_repo, data) = repo_with_data();
        let coordinator = BuildCoordinator::new(LaunchSettings::default(), Arc::new(FixedLauncher("true")));
        assert!(coordinator.try_start_build(Some(&data), false).started);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while BuildLock::at(&data).exists() {
            assert!(std::time::Instant::now() < deadline, "lock never released");
            std::thread::sleep(Duration::from_millis(20));
            coordinator.reap_finished();
        }
    }

    #[test]
    fn repo_root_is_two_levels_up() {
        assert!(repo_root(Path::new("/")).is_none());

        let (repo, data) = repo_with_data();
        assert_eq!(repo_root(&data).unwrap(), repo.path());
    }
}
