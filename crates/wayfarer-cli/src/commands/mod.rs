//! CLI command implementations

pub mod build;
pub mod probe;
pub mod ready;
pub mod serve;
pub mod status;
pub mod update_status;
