//! # Xnat4tests CLI Integration Test Helpers
//!
//! File: cli/tests/common.rs
//!
//! Shared helpers for the integration test files in `cli/tests/`. Every
//! invocation runs against a throwaway xnat4tests home directory (via the
//! `XNAT4TESTS_HOME` environment variable) so tests never touch the real
//! `~/.xnat4tests` and never observe each other's profiles.

#![allow(dead_code)]

pub use assert_cmd::Command;
use std::path::Path;

/// An `assert_cmd::Command` pointing at the compiled `xnat4tests` binary.
///
/// ## Panics
/// Panics if the binary cannot be found via `Command::cargo_bin`.
pub fn xnat4tests_cmd() -> Command {
    Command::cargo_bin("xnat4tests").expect("Failed to find xnat4tests binary for testing")
}

/// As [`xnat4tests_cmd`], homed at `home` instead of `~/.xnat4tests`.
pub fn xnat4tests_cmd_in(home: &Path) -> Command {
    let mut cmd = xnat4tests_cmd();
    cmd.env("XNAT4TESTS_HOME", home);
    cmd
}
