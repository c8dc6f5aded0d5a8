//! # Xnat4tests Docker Utilities
//!
//! File: cli/src/common/docker/mod.rs
//!
//! Thin wrappers around the `bollard` Docker Engine API client, split by
//! concern: connection setup, read-only state queries, image operations,
//! network provisioning, and the container lifecycle state machine.

/// Shared connection helper for the local Docker daemon.
pub mod connect;
/// Image existence/identity, pulling, and the test-XNAT image build.
pub mod images;
/// Start/stop/restart/reuse state machine for the test containers.
pub mod lifecycle;
/// Get-or-create provisioning of the shared Docker network.
pub mod network;
/// Read-only container state queries.
pub mod state;
