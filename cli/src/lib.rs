//! # xnat4tests
//!
//! File: cli/src/lib.rs
//!
//! ## Overview
//!
//! Launches a disposable [XNAT](https://www.xnat.org) imaging-repository
//! instance inside a Docker container for use as a test fixture. The same
//! operations back both the `xnat4tests` CLI and this library surface, so a
//! test suite can do:
//!
//! ```no_run
//! use xnat4tests::{start_xnat, stop_xnat, Config, StartOptions};
//!
//! # async fn fixture() -> anyhow::Result<()> {
//! let config = Config::load("default".into())?;
//! start_xnat(&config, StartOptions::default()).await?;
//! // ... run tests against config.xnat_uri() ...
//! stop_xnat(&config).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - `core`: configuration resolution and the error taxonomy;
//! - `common`: Docker engine wrappers (image build, container lifecycle,
//!   network), mount-directory provisioning, and the XNAT REST client with
//!   its readiness probe;
//! - `commands`: the CLI subcommand handlers and the library entry points
//!   re-exported below.

pub mod commands;
pub mod common;
pub mod core;

pub use crate::commands::add_data::add_data;
pub use crate::commands::registry::{restart_registry, start_registry, stop_registry};
pub use crate::commands::restart::restart_xnat;
pub use crate::commands::start::{start_xnat, StartOptions};
pub use crate::commands::stop::stop_xnat;
pub use crate::common::xnat::{connect_with_retries as connect, XnatSession};
pub use crate::core::config::{BuildArgs, Config, ConfigSource, MountSpec};
pub use crate::core::error::{Result, Xnat4testsError};
