//! # Xnat4tests Commands
//!
//! File: cli/src/commands/mod.rs
//!
//! ## Overview
//!
//! One module per CLI subcommand. Each module pairs a clap argument struct
//! with a `handle_*` entry point called from `main`, plus a library-level
//! function (`start_xnat`, `stop_xnat`, ...) that test suites can call
//! directly with a resolved [`Config`](crate::core::config::Config).

pub mod add_data;
pub mod registry;
pub mod restart;
pub mod start;
pub mod stop;
