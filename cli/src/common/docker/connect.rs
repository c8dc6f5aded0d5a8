//! # Xnat4tests Docker Connection Helper
//!
//! File: cli/src/common/docker/connect.rs
//!
//! ## Overview
//!
//! Single standardized entry point for obtaining a `bollard` client connected
//! to the local Docker daemon. Centralizes connection error handling for the
//! rest of `common::docker`. Every invocation re-queries live state from the
//! daemon, which is the single source of truth; no client or state is cached
//! across calls.
//!
use crate::core::error::{Result, Xnat4testsError};
use anyhow::{anyhow, Context};
use bollard::Docker;
use tracing::instrument;

/// Establishes a connection to the local Docker daemon using default
/// settings (`/var/run/docker.sock` on Unix, named pipe on Windows).
///
/// # Errors
///
/// Returns `Xnat4testsError::DockerApi` with context if the daemon is not
/// running or not accessible.
#[instrument]
pub async fn connect_docker() -> Result<Docker> {
    Docker::connect_with_local_defaults()
        .map_err(|e| anyhow!(Xnat4testsError::DockerApi { source: e }))
        .context("Failed to connect to Docker daemon. Is it running and accessible?")
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    /// Requires a running Docker daemon; run locally with
    /// `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_connect_docker_success() {
        let result = connect_docker().await;
        assert!(
            result.is_ok(),
            "Should connect successfully if Docker is running"
        );
    }
}
