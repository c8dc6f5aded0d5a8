//! # Xnat4tests Start Command
//!
//! File: cli/src/commands/start.rs
//!
//! ## Overview
//!
//! Brings a test-XNAT instance to a ready, authenticated state:
//!
//! 1. ensure the image exists (rebuilt by default, reused with
//!    `--reuse-build`);
//! 2. drive the container to a running state (reusing a healthy container,
//!    replacing a stale or force-relaunched one);
//! 3. block on the bounded readiness probe until the instance accepts an
//!    authenticated session;
//! 4. on a fresh launch only, register the local Docker socket with the
//!    XNAT container service;
//! 5. optionally seed the sample datasets named with `--with-data`.
//!
//! The flags come in polarity pairs (`--keep-mounts`/`--wipe-mounts` and so
//! on) so scripts can spell the default behaviour explicitly.
//!
use crate::commands::add_data::upload_dataset;
use crate::common::docker::{images, lifecycle};
use crate::common::xnat::{configure_container_service, connect_with_retries};
use crate::core::config::{Config, ConfigSource};
use crate::core::error::Result;
use clap::Parser;
use tracing::{info, instrument};

/// Arguments for the `start` subcommand.
#[derive(Parser, Debug, Default)]
pub struct StartArgs {
    /// Preserve the contents of the mount directories from a previous run
    #[arg(long, conflicts_with = "wipe_mounts")]
    pub keep_mounts: bool,

    /// Wipe and recreate the mount directories before launching (default)
    #[arg(long)]
    pub wipe_mounts: bool,

    /// Rebuild the image even if one with the configured tag exists (default)
    #[arg(long, conflicts_with = "reuse_build")]
    pub rebuild: bool,

    /// Reuse an existing image with the configured tag instead of rebuilding
    #[arg(long)]
    pub reuse_build: bool,

    /// Replace a running container even when its image is up to date
    #[arg(long, conflicts_with = "reuse_launch")]
    pub relaunch: bool,

    /// Reuse a running container whose image is up to date (default)
    #[arg(long)]
    pub reuse_launch: bool,

    /// Seed a sample dataset after startup (repeatable)
    #[arg(long = "with-data", value_name = "DATASET")]
    pub with_data: Vec<String>,
}

/// Behaviour switches for [`start_xnat`], mirroring the `start` flags.
#[derive(Debug, Clone, Copy)]
pub struct StartOptions {
    /// Preserve mount-directory contents across the launch.
    pub keep_mounts: bool,
    /// Rebuild the image even when one with the configured tag exists.
    pub rebuild: bool,
    /// Replace a running container even when its image is up to date.
    pub relaunch: bool,
}

impl Default for StartOptions {
    fn default() -> Self {
        StartOptions {
            keep_mounts: false,
            rebuild: true,
            relaunch: false,
        }
    }
}

impl From<&StartArgs> for StartOptions {
    fn from(args: &StartArgs) -> Self {
        StartOptions {
            keep_mounts: args.keep_mounts,
            rebuild: !args.reuse_build,
            relaunch: args.relaunch,
        }
    }
}

/// Handles the `start` subcommand.
pub async fn handle_start(source: ConfigSource, args: &StartArgs) -> Result<()> {
    let cfg = Config::load(source)?;
    start_xnat(&cfg, StartOptions::from(args)).await?;

    for dataset in &args.with_data {
        let session = connect_with_retries(&cfg).await?;
        let result = upload_dataset(&session, dataset).await;
        session.logout().await?;
        result?;
    }

    println!("XNAT is up at {} (user: {})", cfg.xnat_uri(), cfg.xnat_user);
    Ok(())
}

/// Starts (or reuses) the test-XNAT instance and blocks until it is ready.
/// The post-launch container-service configuration runs only when a fresh
/// container was launched, never on reuse.
#[instrument(skip(cfg, opts), fields(container = %cfg.docker_container))]
pub async fn start_xnat(cfg: &Config, opts: StartOptions) -> Result<()> {
    images::ensure_image(cfg, opts.rebuild).await?;
    let fresh_launch = lifecycle::ensure_running(cfg, opts.keep_mounts, opts.relaunch).await?;

    let session = connect_with_retries(cfg).await?;
    let result = if fresh_launch {
        configure_container_service(&session, cfg).await
    } else {
        Ok(())
    };
    let logout = session.logout().await;
    result?;
    logout?;

    info!("Test XNAT ready at {}", cfg.xnat_uri());
    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_rebuild_and_wipe() {
        let opts = StartOptions::default();
        assert!(opts.rebuild);
        assert!(!opts.keep_mounts);
        assert!(!opts.relaunch);
    }

    #[test]
    fn test_args_map_onto_options() {
        let args = StartArgs {
            keep_mounts: true,
            reuse_build: true,
            relaunch: true,
            ..Default::default()
        };
        let opts = StartOptions::from(&args);
        assert!(opts.keep_mounts);
        assert!(!opts.rebuild);
        assert!(opts.relaunch);
    }

    #[test]
    fn test_explicit_default_polarity_flags_are_noops() {
        let args = StartArgs {
            wipe_mounts: true,
            rebuild: true,
            reuse_launch: true,
            ..Default::default()
        };
        let opts = StartOptions::from(&args);
        assert!(!opts.keep_mounts);
        assert!(opts.rebuild);
        assert!(!opts.relaunch);
    }
}
