//! # Xnat4tests Error Types
//!
//! File: cli/src/core/error.rs
//!
//! ## Overview
//!
//! This module defines the error types used throughout xnat4tests. It provides
//! a consistent approach to error management: a `thiserror`-derived enum for
//! the conditions callers may want to match on, plus an `anyhow::Result` alias
//! for flexible propagation with context.
//!
//! ## Architecture
//!
//! The error system consists of two components:
//! - `Xnat4testsError`: a custom error enum covering the failure taxonomy
//!   (configuration, image build, container lifecycle, XNAT connectivity)
//! - `Result<T>`: a type alias for `anyhow::Result<T>`
//!
//! Fatal conditions propagate uncaught to the entry point (CLI exit code /
//! test failure) with no local recovery. The only conditions handled
//! gracefully are the documented idempotent no-ops (stopping an absent
//! container, reusing a reachable container) and the retryable connectivity
//! failures consumed by the readiness probe.
//!
//! ## Examples
//!
//! ```rust,ignore
//! // Return a specific error type
//! if !path.exists() {
//!     return Err(Xnat4testsError::ConfigNotFound { path })?;
//! }
//!
//! // Add context using anyhow
//! let content = fs::read_to_string(&path)
//!     .with_context(|| format!("Failed to read file: {}", path.display()))?;
//! ```
//!
use std::path::PathBuf;
use thiserror::Error;

/// Custom error type for xnat4tests.
#[derive(Error, Debug)]
pub enum Xnat4testsError {
    /// The named profile has no backing file.
    #[error("Configuration file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    /// A resolved configuration value failed a cross-field constraint.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// The Docker image build reported failure; carries the build log text.
    #[error("Building image '{image}' failed with the following errors:\n\n{log}")]
    ImageBuild { image: String, log: String },

    /// Restart was requested for a container that is not running.
    #[error("Test XNAT container '{name}' is not running.")]
    ContainerNotRunning { name: String },

    /// The Docker daemon returned an error we did not handle specifically.
    #[error("Docker API interaction failed: {source}")]
    DockerApi {
        #[from]
        source: bollard::errors::Error,
    },

    /// A Docker operation failed for a reason other than an API error
    /// (conflicts, containers failing to reach the expected state, ...).
    #[error("Docker operation failed: {0}")]
    DockerOperation(String),

    /// The XNAT endpoint refused or dropped the connection. Retryable during
    /// the readiness probe.
    #[error("Could not reach XNAT at {uri}: {source}")]
    XnatUnreachable {
        uri: String,
        source: reqwest::Error,
    },

    /// XNAT accepted the connection but has not finished booting (5xx or
    /// auth layer not yet up). Retryable during the readiness probe.
    #[error("XNAT at {uri} is not ready yet (HTTP {status})")]
    XnatNotReady { uri: String, status: u16 },

    /// Any other failure from the XNAT REST API. Not retried.
    #[error("XNAT API request failed: {0}")]
    XnatApi(String),
}

impl Xnat4testsError {
    /// Whether the readiness probe should retry after this error. Only
    /// connection-level failures and the "still booting" signal are
    /// retryable; everything else propagates immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Xnat4testsError::XnatUnreachable { .. } | Xnat4testsError::XnatNotReady { .. }
        )
    }
}

/// Type alias for Result using anyhow::Error for broad compatibility.
pub type Result<T> = anyhow::Result<T>;

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let not_found = Xnat4testsError::ConfigNotFound {
            path: PathBuf::from("/home/me/.xnat4tests/configs/missing.yaml"),
        };
        assert_eq!(
            not_found.to_string(),
            "Configuration file not found: /home/me/.xnat4tests/configs/missing.yaml"
        );

        let not_running = Xnat4testsError::ContainerNotRunning {
            name: "xnat4tests".into(),
        };
        assert_eq!(
            not_running.to_string(),
            "Test XNAT container 'xnat4tests' is not running."
        );

        let build = Xnat4testsError::ImageBuild {
            image: "xnat4tests".into(),
            log: "step 3 failed".into(),
        };
        assert!(build.to_string().contains("step 3 failed"));
    }

    #[test]
    fn test_retryable_classification() {
        assert!(Xnat4testsError::XnatNotReady {
            uri: "http://localhost:8080".into(),
            status: 503,
        }
        .is_retryable());

        assert!(!Xnat4testsError::XnatApi("bad request".into()).is_retryable());
        assert!(!Xnat4testsError::ConfigValidation("oops".into()).is_retryable());
    }
}
