//! # Xnat4tests Stop Command
//!
//! File: cli/src/commands/stop.rs
//!
//! Stops the test-XNAT container if it is running; an absent container is a
//! logged no-op, never an error. `stop` only ever observes the current
//! container state and never launches anything to have something to stop.
//! The engine removes the stopped container itself (auto-remove), so there
//! is no separate remove step here.

use crate::common::docker::lifecycle;
use crate::core::config::{Config, ConfigSource};
use crate::core::error::Result;

/// Handles the `stop` subcommand.
pub async fn handle_stop(source: ConfigSource) -> Result<()> {
    let cfg = Config::load(source)?;
    stop_xnat(&cfg).await
}

/// Stops the configured test-XNAT container, tolerating its absence.
pub async fn stop_xnat(cfg: &Config) -> Result<()> {
    lifecycle::stop(&cfg.docker_container).await
}
