//! # Xnat4tests Shared Utilities
//!
//! File: cli/src/common/mod.rs
//!
//! Functionality shared across commands: the Docker engine wrappers, the
//! host-side mount directory provisioning, and the XNAT REST client with
//! its readiness probe.

pub mod docker;
pub mod fs;
pub mod xnat;
