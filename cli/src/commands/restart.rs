//! # Xnat4tests Restart Command
//!
//! File: cli/src/commands/restart.rs
//!
//! Restarts the test-XNAT container in place, preserving its identity and
//! volumes (Tomcat redeploys, the database survives). Unlike `stop`, a
//! container that is not running is an error here: there is nothing to
//! restart.

use crate::common::docker::lifecycle;
use crate::core::config::{Config, ConfigSource};
use crate::core::error::Result;

/// Handles the `restart` subcommand.
pub async fn handle_restart(source: ConfigSource) -> Result<()> {
    let cfg = Config::load(source)?;
    restart_xnat(&cfg).await
}

/// Restarts the configured test-XNAT container in place. Fails with
/// `ContainerNotRunning` when it is not running.
pub async fn restart_xnat(cfg: &Config) -> Result<()> {
    lifecycle::restart(&cfg.docker_container).await
}
