//! Startup flow: readiness, status files and the auto-update trigger together.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use wayfarer_build::auto_update::{AutoUpdateOutcome, AutoUpdateTrigger};
use wayfarer_build::config::OrchestratorConfig;
use wayfarer_build::layout::{BUILD_STATUS_FILE, UPDATE_STATUS_FILE};
use wayfarer_build::readiness::{NotReadyReason, Readiness, check_readiness, is_ready};
use wayfarer_build::report::StatusReport;
use wayfarer_build::{BuildLaunchResult, BuildStarter};

#[derive(Default)]
struct RecordingStarter {
    calls: AtomicUsize,
    forced: AtomicUsize,
}

impl BuildStarter for RecordingStarter {
    fn try_start_build(&self, _data_path: Option<&Path>, force_rebuild: bool) -> BuildLaunchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if force_rebuild {
            self.forced.fetch_add(1, Ordering::SeqCst);
        }
        BuildLaunchResult::started(1)
    }
}

fn write_ready_dataset(dir: &Path) {
    fs::create_dir_all(dir.join("tiles/2/000/000")).unwrap();
    fs::write(dir.join("tiles/2/000/000/001.gph"), b"tile").unwrap();
    fs::write(dir.join("valhalla.json"), vec![b' '; 128]).unwrap();
    fs::write(dir.join("admins.sqlite"), vec![0u8; 2048]).unwrap();
}

#[test]
fn available_update_without_running_build_launches_once() {
    let dir = tempfile::tempdir().unwrap();
    write_ready_dataset(dir.path());
    fs::write(
        dir.path().join(UPDATE_STATUS_FILE),
        r#"{"state":"update_available","update_available":true,"reason":"etag_changed"}"#,
    )
    .unwrap();

    let starter = Arc::new(RecordingStarter::default());
    let trigger = AutoUpdateTrigger::new(Some(dir.path().to_path_buf()), starter.clone());

    assert!(matches!(trigger.run_once(), AutoUpdateOutcome::Launched(r) if r.started));
    assert_eq!(starter.calls.load(Ordering::SeqCst), 1);
    assert_eq!(starter.forced.load(Ordering::SeqCst), 0);
}

#[test]
fn running_build_suppresses_the_startup_launch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(BUILD_STATUS_FILE), r#"{"state":"running","progress_pct":12}"#).unwrap();
    fs::write(dir.path().join(UPDATE_STATUS_FILE), r#"{"update_available":true}"#).unwrap();

    let starter = Arc::new(RecordingStarter::default());
    let trigger = AutoUpdateTrigger::new(Some(dir.path().to_path_buf()), starter.clone());

    assert_eq!(trigger.run_once(), AutoUpdateOutcome::BuildRunning);
    assert_eq!(starter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn corrupt_update_status_means_no_update() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(UPDATE_STATUS_FILE), "{ not json").unwrap();

    let starter = Arc::new(RecordingStarter::default());
    let trigger = AutoUpdateTrigger::new(Some(dir.path().to_path_buf()), starter.clone());

    assert_eq!(trigger.run_once(), AutoUpdateOutcome::NoUpdate);
    assert_eq!(starter.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn promoted_live_dataset_is_the_one_checked() {
    let dir = tempfile::tempdir().unwrap();
    write_ready_dataset(dir.path());
    assert_eq!(check_readiness(Some(dir.path())), Readiness::Ready);

    // A promoted but incomplete live/ dataset takes over.
    fs::create_dir_all(dir.path().join("live/tiles")).unwrap();
    fs::write(dir.path().join("live/valhalla.json"), vec![b' '; 128]).unwrap();
    assert_eq!(
        check_readiness(Some(dir.path())),
        Readiness::NotReady(NotReadyReason::AdminDbMissing)
    );
    assert_eq!(is_ready(Some(dir.path())), (false, "admin database absent or too small"));
}

#[test]
fn report_for_ready_dataset() {
    let dir = tempfile::tempdir().unwrap();
    write_ready_dataset(dir.path());
    fs::write(
        dir.path().join(BUILD_STATUS_FILE),
        r#"{"state":"running","progress_pct":55,"updated_at":"2026-03-01T10:00:00Z"}"#,
    )
    .unwrap();

    let config = OrchestratorConfig::default().with_data_path(dir.path());
    let report = StatusReport::from_filesystem(&config);

    assert!(report.ready);
    assert_eq!(report.active_dataset.as_deref(), Some(dir.path()));
    assert_eq!(report.build.progress_pct, 100);
    assert_eq!(report.build.message, "Routing data is ready.");
    assert!(report.build.updated_at.is_some());
}
