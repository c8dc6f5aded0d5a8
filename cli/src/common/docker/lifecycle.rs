//! # Xnat4tests Container Lifecycle
//!
//! File: cli/src/common/docker/lifecycle.rs
//!
//! ## Overview
//!
//! The container lifecycle state machine at the heart of xnat4tests. A
//! `start` request drives the named container through one of four observed
//! states:
//!
//! - **absent** → launch a fresh container bound to the resolved image,
//!   mounts, network and port;
//! - **running, matching image** → reuse as-is, unless the caller forces a
//!   relaunch;
//! - **running, stale image** (or forced relaunch) → stop it, wait for the
//!   engine to finish auto-removing it, then launch as absent;
//! - **stopped-pending-removal** → the wait in the previous arm.
//!
//! ## Architecture
//!
//! The auto-remove wait is an active poll of container-list membership, not
//! a fixed sleep: the engine deletes an auto-remove container asynchronously
//! after `stop` returns, and creating a new container with the same name
//! races that deletion. Polling until the name disappears closes the window.
//!
//! `stop` on an absent container is a logged no-op; `restart` on a
//! container that is not actually running (absent, or stopped and pending
//! auto-removal) is an error (`ContainerNotRunning`). Removal is always
//! left to the engine via the auto-remove flag set at launch.
//!
use crate::common::docker::{images, network, state};
use crate::common::fs::prepare_mount_dirs;
use crate::core::config::Config;
use crate::core::error::{Result, Xnat4testsError};
use anyhow::{anyhow, Context};
use bollard::container::{
    Config as ContainerConfig, CreateContainerOptions, RestartContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::models::{HostConfig, Mount, MountTypeEnum, PortBinding};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::connect::connect_docker;

/// Docker control socket, bound into the container so the XNAT container
/// service can launch sibling containers.
const DOCKER_SOCK: &str = "/var/run/docker.sock";

/// Poll interval while waiting for the engine to finish auto-removal.
const REMOVAL_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Ensures the configured test-XNAT container is running, reusing it where
/// allowed. Returns `true` when a fresh launch occurred (the caller runs the
/// post-launch configuration only in that case).
///
/// * `keep_mounts`: skip wiping the XNAT root directory before a launch.
/// * `relaunch`: replace a running container even when its image matches.
#[instrument(skip(cfg, keep_mounts, relaunch), fields(container = %cfg.docker_container))]
pub async fn ensure_running(cfg: &Config, keep_mounts: bool, relaunch: bool) -> Result<bool> {
    let mut relaunch = relaunch;

    match state::get_container(&cfg.docker_container).await? {
        None => {
            relaunch = true;
        }
        Some(details) => {
            let wanted_image = images::image_id(&cfg.docker_image).await?;
            // A container bound to a different image ID than the current
            // local image is stale and must be replaced.
            let stale = wanted_image.is_none() || details.image != wanted_image;
            if relaunch || stale {
                if stale {
                    info!(
                        "Existing '{}' container uses a stale image, replacing it.",
                        cfg.docker_container
                    );
                } else {
                    info!("Relaunch requested, stopping '{}'.", cfg.docker_container);
                }
                stop_and_await_removal(&cfg.docker_container).await?;
                relaunch = true;
            }
        }
    }

    if !relaunch {
        info!(
            "Found existing '{}' container, reusing.",
            cfg.docker_container
        );
        return Ok(false);
    }

    info!("Launching fresh '{}' container.", cfg.docker_container);
    prepare_mount_dirs(cfg, keep_mounts)?;
    launch_xnat_container(cfg).await?;
    info!("'{}' launched successfully.", cfg.docker_container);
    Ok(true)
}

/// Stops the named container. An absent container is a no-op; removal is
/// performed asynchronously by the engine (auto-remove).
#[instrument(skip(name), fields(container = %name))]
pub async fn stop(name: &str) -> Result<()> {
    if state::get_container(name).await?.is_none() {
        info!("Container '{}' was not running, nothing to stop.", name);
        return Ok(());
    }
    info!("Stopping container '{}'.", name);
    stop_container(name).await
}

/// Restarts the named container in place (same identity, same volumes).
/// Fails with `ContainerNotRunning` if it is absent or merely listed while
/// the engine finishes auto-removing it.
#[instrument(skip(name), fields(container = %name))]
pub async fn restart(name: &str) -> Result<()> {
    if !state::container_running(name).await? {
        return Err(anyhow!(Xnat4testsError::ContainerNotRunning {
            name: name.to_string()
        }));
    }
    let docker = connect_docker().await?;
    info!("Restarting '{}'.", name);
    docker
        .restart_container(name, None::<RestartContainerOptions>)
        .await
        .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))
        .with_context(|| format!("Failed to restart container '{name}'"))
}

/// Issues a stop, treating "already stopped" (Docker 304) and "not found"
/// (404, lost a race with auto-removal) as success.
pub(crate) async fn stop_container(name: &str) -> Result<()> {
    let docker = connect_docker().await?;
    match docker
        .stop_container(name, None::<StopContainerOptions>)
        .await
    {
        Ok(()) => Ok(()),
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 304, ..
        }) => {
            debug!("Container '{}' was already stopped.", name);
            Ok(())
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            debug!("Container '{}' disappeared before stop.", name);
            Ok(())
        }
        Err(e) => Err(anyhow!(Xnat4testsError::DockerApi { source: e })
            .context(format!("Failed to stop container '{name}'"))),
    }
}

/// Stops a container and blocks until the engine has finished auto-removing
/// it, so a follow-up create with the same name cannot collide.
async fn stop_and_await_removal(name: &str) -> Result<()> {
    stop_container(name).await?;
    while state::container_listed(name).await? {
        debug!("Waiting for '{}' container to be auto-removed.", name);
        tokio::time::sleep(REMOVAL_POLL_INTERVAL).await;
    }
    Ok(())
}

/// Creates and starts the test-XNAT container: Docker socket and mount-dir
/// bindings, port 8080 published at the configured host port, attached to
/// the shared network, auto-removed on stop.
async fn launch_xnat_container(cfg: &Config) -> Result<()> {
    let network_id = network::ensure_network(&cfg.docker_network_name).await?;

    let mut mounts = vec![Mount {
        source: Some(DOCKER_SOCK.to_string()),
        target: Some(DOCKER_SOCK.to_string()),
        typ: Some(MountTypeEnum::BIND),
        read_only: Some(false),
        ..Default::default()
    }];
    for spec in &cfg.xnat_mnt_dirs {
        mounts.push(Mount {
            source: Some(
                spec.host_path(&cfg.xnat_root_dir)
                    .to_string_lossy()
                    .into_owned(),
            ),
            target: Some(spec.container_path()),
            typ: Some(MountTypeEnum::BIND),
            read_only: Some(false),
            ..Default::default()
        });
    }

    run_detached(
        &cfg.docker_container,
        &cfg.docker_image,
        &[("8080/tcp", &cfg.xnat_port)],
        &network_id,
        mounts,
        HashMap::new(),
    )
    .await
}

/// Creates and starts a detached, auto-removed container on the given
/// network. Shared by the XNAT launch path and the registry launch path.
pub(crate) async fn run_detached(
    name: &str,
    image: &str,
    ports: &[(&str, &str)],
    network_id: &str,
    mounts: Vec<Mount>,
    env: HashMap<String, String>,
) -> Result<()> {
    let docker = connect_docker().await?;

    let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
    let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
    for (container_port, host_port) in ports {
        exposed_ports.insert(container_port.to_string(), HashMap::new());
        port_bindings.insert(
            container_port.to_string(),
            Some(vec![PortBinding {
                host_ip: None,
                host_port: Some(host_port.to_string()),
            }]),
        );
    }

    let host_config = HostConfig {
        port_bindings: Some(port_bindings),
        auto_remove: Some(true),
        network_mode: Some(network_id.to_string()),
        mounts: if mounts.is_empty() {
            None
        } else {
            Some(mounts)
        },
        ..Default::default()
    };

    let env_list: Vec<String> = env.iter().map(|(k, v)| format!("{k}={v}")).collect();
    let container_config = ContainerConfig {
        image: Some(image.to_string()),
        exposed_ports: Some(exposed_ports),
        env: if env_list.is_empty() {
            None
        } else {
            Some(env_list)
        },
        host_config: Some(host_config),
        ..Default::default()
    };

    info!("Creating container '{}' from image '{}'.", name, image);
    let create_options = Some(CreateContainerOptions {
        name: name.to_string(),
        platform: None,
    });
    let created = docker
        .create_container(create_options, container_config)
        .await
        .map_err(|e| match e {
            bollard::errors::Error::DockerResponseServerError {
                status_code: 409,
                message,
            } => {
                warn!("Conflict creating container '{}': {}.", name, message);
                anyhow!(Xnat4testsError::DockerOperation(format!(
                    "Conflict creating container '{name}': {message}. It may already exist."
                )))
            }
            other => anyhow!(Xnat4testsError::DockerApi { source: other }),
        })
        .with_context(|| format!("Failed to create container '{name}'"))?;

    debug!("Starting container '{}' (ID: {}).", name, created.id);
    docker
        .start_container(name, None::<StartContainerOptions<String>>)
        .await
        .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))
        .with_context(|| format!("Failed to start container '{name}'"))?;

    Ok(())
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    // The state machine's branches depend on live daemon responses; the
    // hermetic pieces (mount preparation, config resolution, name matching)
    // are unit tested in their own modules, and the end-to-end transitions
    // are covered by the ignored Docker-backed tests in tests/cli.rs:
    // - absent -> launch (fresh container, mounts wiped)
    // - running + matching image + no relaunch -> reuse (same container ID)
    // - stale image / forced relaunch -> stop, await removal, launch
    // - stop on absent container -> no-op
    // - restart on absent or stopped container -> ContainerNotRunning

    #[test]
    fn test_removal_poll_interval_is_subsecond() {
        // The auto-remove window is typically well under a second; a coarse
        // poll would add that latency to every relaunch.
        assert!(super::REMOVAL_POLL_INTERVAL < std::time::Duration::from_secs(1));
    }
}
