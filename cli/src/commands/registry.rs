//! # Xnat4tests Registry Command
//!
//! File: cli/src/commands/registry.rs
//!
//! ## Overview
//!
//! Lifecycle of the companion Docker image registry, used when tests need
//! the XNAT container service to pull pipeline images from somewhere local.
//! The registry image is pulled (never built), the container runs on the
//! shared network with the registry's port 5000 published at the configured
//! host port, and, like the XNAT container, it is auto-removed on stop.
//!
use crate::common::docker::{images, lifecycle, network, state};
use crate::core::config::{Config, ConfigSource};
use crate::core::error::Result;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use tracing::{info, instrument};

/// Arguments for the `registry` subcommand.
#[derive(Parser, Debug)]
pub struct RegistryArgs {
    #[command(subcommand)]
    pub command: RegistryCommand,
}

/// Registry lifecycle operations.
#[derive(Subcommand, Debug)]
pub enum RegistryCommand {
    /// Launch the companion image registry (reusing a running one)
    Start,
    /// Stop the registry container (no-op when absent)
    Stop,
    /// Restart the registry container in place
    Restart,
}

/// Handles the `registry` subcommand.
pub async fn handle_registry(source: ConfigSource, args: &RegistryArgs) -> Result<()> {
    let cfg = Config::load(source)?;
    match args.command {
        RegistryCommand::Start => {
            start_registry(&cfg).await?;
            println!(
                "Docker registry is up at {}:{}",
                cfg.registry_uri(),
                cfg.registry_port
            );
            Ok(())
        }
        RegistryCommand::Stop => stop_registry(&cfg).await,
        RegistryCommand::Restart => restart_registry(&cfg).await,
    }
}

/// Ensures the companion registry container is running on the shared
/// network. A registry that is already present is reused as-is; the image
/// is pulled only when no local copy exists.
#[instrument(skip(cfg), fields(container = %cfg.docker_registry_container))]
pub async fn start_registry(cfg: &Config) -> Result<()> {
    let network_id = network::ensure_network(&cfg.docker_network_name).await?;

    if !images::image_exists(&cfg.docker_registry_image).await? {
        images::pull_image(&cfg.docker_registry_image).await?;
    }

    if state::get_container(&cfg.docker_registry_container)
        .await?
        .is_some()
    {
        info!(
            "Found existing '{}' container, reusing.",
            cfg.docker_registry_container
        );
        return Ok(());
    }

    lifecycle::run_detached(
        &cfg.docker_registry_container,
        &cfg.docker_registry_image,
        &[("5000/tcp", &cfg.registry_port)],
        &network_id,
        Vec::new(),
        HashMap::new(),
    )
    .await
}

/// Stops the registry container, tolerating its absence.
pub async fn stop_registry(cfg: &Config) -> Result<()> {
    lifecycle::stop(&cfg.docker_registry_container).await
}

/// Restarts the registry container in place. Fails with
/// `ContainerNotRunning` when it is not running.
pub async fn restart_registry(cfg: &Config) -> Result<()> {
    lifecycle::restart(&cfg.docker_registry_container).await
}
