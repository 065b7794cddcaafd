//! On-disk build lock with staleness-based recovery.
//!
//! The lock is advisory: a zero-byte `.build.lock` marker. It survives host
//! restarts, and a lock whose build shows no sign of life for longer than the
//! threshold is treated as abandoned.

use crate::layout::BUILD_LOCK_FILE;
use crate::status::{BuildState, load_build_status};
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone)]
pub(crate) struct BuildLock {
    path: PathBuf,
}

/// Verdict on an existing lock file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LockVerdict {
    Held,
    Stale(&'static str),
}

impl BuildLock {
    pub fn at(data_path: &Path) -> Self {
        Self {
            path: data_path.join(BUILD_LOCK_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn acquire(&self) -> io::Result<()> {
        std::fs::File::create(&self.path).map(|_| ())
    }

    pub fn release(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(lock = %self.path.display(), error = %e, "failed to remove build lock"),
        }
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        std::fs::metadata(&self.path)
            .and_then(|meta| meta.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    /// Decide whether the existing lock still guards a live build.
    ///
    /// The status file only speaks for this lock when its `updated_at` is at
    /// or after the lock's mtime; an older document belongs to a previous
    /// build. An owning status frees the lock once it is not `running`, or
    /// once `updated_at` is older than `stale_after`. Otherwise the lock's own
    /// mtime is aged.
    pub fn assess(&self, data_path: &Path, stale_after: Duration, now: DateTime<Utc>) -> LockVerdict {
        // Timestamps in the future count as fresh.
        let older_than_threshold = |ts: DateTime<Utc>| {
            now.signed_duration_since(ts)
                .to_std()
                .is_ok_and(|age| age > stale_after)
        };

        let Some(locked_at) = self.modified_at() else {
            return LockVerdict::Stale("lock file age unknown");
        };

        let owning_status = load_build_status(data_path)
            .ok()
            .and_then(|status| status.updated_at.map(|ts| (status.state, ts)))
            .filter(|(_, updated_at)| *updated_at >= locked_at);

        match owning_status {
            Some((state, _)) if state != BuildState::Running => {
                LockVerdict::Stale("build status is not running")
            }
            Some((_, updated_at)) if older_than_threshold(updated_at) => {
                LockVerdict::Stale("build status not updated recently")
            }
            Some(_) => LockVerdict::Held,
            None if older_than_threshold(locked_at) => LockVerdict::Stale("lock file is old"),
            None => LockVerdict::Held,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::BUILD_STATUS_FILE;
    use std::time::SystemTime;
    use tempfile::tempdir;

    const FIVE_MINUTES: Duration = Duration::from_secs(300);

    fn age_file(path: &Path, age: Duration) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
    }

    fn write_status(dir: &Path, state: &str, updated_at: DateTime<Utc>) {
        std::fs::write(
            dir.join(BUILD_STATUS_FILE),
            format!(r#"{{"state":"{state}","updated_at":"{}"}}"#, updated_at.to_rfc3339()),
        )
        .unwrap();
    }

    #[test]
    fn old_lock_without_status_is_stale() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        age_file(lock.path(), Duration::from_secs(600));

        assert!(matches!(
            lock.assess(dir.path(), FIVE_MINUTES, Utc::now()),
            LockVerdict::Stale(_)
        ));
    }

    #[test]
    fn fresh_lock_without_status_is_held() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();

        assert_eq!(lock.assess(dir.path(), FIVE_MINUTES, Utc::now()), LockVerdict::Held);
    }

    #[test]
    fn finished_build_releases_the_lock() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        age_file(lock.path(), Duration::from_secs(30));
        write_status(dir.path(), "completed", Utc::now());

        assert!(matches!(
            lock.assess(dir.path(), FIVE_MINUTES, Utc::now()),
            LockVerdict::Stale(_)
        ));
    }

    #[test]
    fn running_build_with_old_heartbeat_is_stale() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        age_file(lock.path(), Duration::from_secs(600));
        write_status(dir.path(), "running", Utc::now() - chrono::Duration::minutes(6));

        assert!(matches!(
            lock.assess(dir.path(), FIVE_MINUTES, Utc::now()),
            LockVerdict::Stale(_)
        ));
    }

    #[test]
    fn running_build_with_recent_heartbeat_is_held() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        age_file(lock.path(), Duration::from_secs(120));
        write_status(dir.path(), "running", Utc::now() - chrono::Duration::minutes(1));

        assert_eq!(lock.assess(dir.path(), FIVE_MINUTES, Utc::now()), LockVerdict::Held);
    }

    #[test]
    fn leftover_completed_status_does_not_free_a_new_lock() {
        let dir = tempdir().unwrap();
        write_status(dir.path(), "completed", Utc::now() - chrono::Duration::hours(1));
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();

        assert_eq!(lock.assess(dir.path(), FIVE_MINUTES, Utc::now()), LockVerdict::Held);
    }

    #[test]
    fn leftover_running_status_defers_to_lock_age() {
        let dir = tempdir().unwrap();
        write_status(dir.path(), "running", Utc::now() - chrono::Duration::minutes(30));
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        assert_eq!(lock.assess(dir.path(), FIVE_MINUTES, Utc::now()), LockVerdict::Held);

        age_file(lock.path(), Duration::from_secs(600));
        assert!(matches!(
            lock.assess(dir.path(), FIVE_MINUTES, Utc::now()),
            LockVerdict::Stale("lock file is old")
        ));
    }

    #[test]
    fn running_without_timestamp_falls_back_to_lock_age() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        std::fs::write(dir.path().join(BUILD_STATUS_FILE), r#"{"state":"running"}"#).unwrap();
        assert_eq!(lock.assess(dir.path(), FIVE_MINUTES, Utc::now()), LockVerdict::Held);

        age_file(lock.path(), Duration::from_secs(600));
        assert!(matches!(
            lock.assess(dir.path(), FIVE_MINUTES, Utc::now()),
            LockVerdict::Stale(_)
        ));
    }

    #[test]
    fn release_is_idempotent() {
        let dir = tempdir().unwrap();
        let lock = BuildLock::at(dir.path());
        lock.acquire().unwrap();
        lock.release();
        lock.release();
        assert!(!lock.exists());
    }
}
