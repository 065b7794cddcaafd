//! `wayfarer-build`: routing data build orchestrator.
//!
//! Supervises the external tile build for the routing engine and answers the
//! question every routing request path asks first: can requests be served?
//!
//! | Component | Entry point |
//! |-----------|-------------|
//! | Active dataset resolution | [`layout::resolve_active_dataset`] |
//! | Readiness probe | [`readiness::check_readiness`], [`readiness::is_ready`] |
//! | Build / update status | [`status::read_build_progress`], [`status::read_update_status`] |
//! | Single-flight build launcher | [`launcher::BuildCoordinator`] |
//! | Routing engine liveness | [`health::ServiceHealthProbe`] |
//! | Startup auto-update | [`auto_update::AutoUpdateTrigger`] |
//! | Aggregated status | [`report::StatusReport`] |
//!
//! Readiness and status reads are pure filesystem reads and take no lock.
//! Only [`launcher::BuildCoordinator`] mutates state (the `.build.lock`
//! marker and the in-process child handle).
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use wayfarer_build::auto_update::AutoUpdateTrigger;
//! use wayfarer_build::config::OrchestratorConfig;
//! use wayfarer_build::launcher::BuildCoordinator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = OrchestratorConfig::load(None).expect("config");
//!     let coordinator = Arc::new(BuildCoordinator::from_config(&config));
//!
//!     AutoUpdateTrigger::new(config.data_path().map(Into::into), coordinator.clone())
//!         .spawn_on_startup();
//! }
//! ```

pub mod auto_update;
pub mod config;
pub mod error;
pub mod health;
pub mod launcher;
pub mod layout;
pub mod readiness;
pub mod report;
pub mod status;

pub use error::{ConfigError, StatusReadError};
pub use launcher::{BuildCoordinator, BuildLaunchResult, BuildStarter, LaunchReason};
pub use readiness::{NotReadyReason, Readiness};
