//! # Xnat4tests Docker Network Provisioning
//!
//! File: cli/src/common/docker/network.rs
//!
//! ## Overview
//!
//! Get-or-create semantics for the named Docker network shared by the test
//! XNAT container, the optional registry container, and any sibling
//! containers the XNAT container service launches. Containers on this
//! network address each other by container name.
//!
use crate::core::error::{Result, Xnat4testsError};
use anyhow::{anyhow, Context};
use bollard::network::{CreateNetworkOptions, InspectNetworkOptions};
use tracing::{debug, info, instrument};

use super::connect::connect_docker;

/// Ensures the named network exists and returns its engine-assigned ID.
/// Idempotent: an existing network is reused as-is.
#[instrument(skip(name), fields(network = %name))]
pub async fn ensure_network(name: &str) -> Result<String> {
    let docker = connect_docker().await?;

    match docker
        .inspect_network(name, None::<InspectNetworkOptions<String>>)
        .await
    {
        Ok(network) => {
            debug!("Network '{}' already exists.", name);
            network
                .id
                .ok_or_else(|| anyhow!(Xnat4testsError::DockerOperation(format!(
                    "Network '{name}' has no ID in inspect response"
                ))))
        }
        Err(bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        }) => {
            info!("Network '{}' not found, creating it.", name);
            docker
                .create_network(CreateNetworkOptions {
                    name: name.to_string(),
                    ..Default::default()
                })
                .await
                .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))
                .with_context(|| format!("Failed to create network '{name}'"))?;
            // Re-inspect rather than trusting the create response shape.
            let network = docker
                .inspect_network(name, None::<InspectNetworkOptions<String>>)
                .await
                .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))?;
            network
                .id
                .ok_or_else(|| anyhow!(Xnat4testsError::DockerOperation(format!(
                    "Network '{name}' has no ID after creation"
                ))))
        }
        Err(e) => Err(anyhow!(Xnat4testsError::DockerApi { source: e })
            .context(format!("Failed to inspect network '{name}'"))),
    }
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    /// Requires a running Docker daemon; verifies the get-or-create call is
    /// idempotent. Run locally with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_ensure_network_idempotent() {
        let first = ensure_network("xnat4tests-nettest").await.unwrap();
        let second = ensure_network("xnat4tests-nettest").await.unwrap();
        assert_eq!(first, second);
    }
}
