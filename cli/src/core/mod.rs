//! # Xnat4tests Core Infrastructure
//!
//! File: cli/src/core/mod.rs
//!
//! Fundamental building blocks shared by every command: the configuration
//! system and the error types. Nothing here talks to Docker or XNAT.

/// Profile loading, merging, and validation (`Config`, `ConfigSource`).
pub mod config;
/// The `Xnat4testsError` enum and the crate-wide `Result` alias.
pub mod error;
