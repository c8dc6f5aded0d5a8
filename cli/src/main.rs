//! # Xnat4tests Main Entry Point
//!
//! File: cli/src/main.rs
//!
//! ## Overview
//!
//! The `xnat4tests` CLI: parse arguments with Clap, configure logging from
//! the `--loglevel` flag (overridable via `RUST_LOG`), resolve the
//! `--config` value into a configuration source, and route to the command
//! handlers. All errors propagate to this level for consistent display.
//!
//! ## Examples
//!
//! ```bash
//! # Launch the default test XNAT and wait for it to become ready
//! xnat4tests start
//!
//! # Launch under a named profile, reusing a previously built image
//! xnat4tests -c myprofile start --reuse-build
//!
//! # Tear it down again
//! xnat4tests stop
//! ```
//!
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};
use xnat4tests::commands;
use xnat4tests::core::config::ConfigSource;

/// Top-level command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "xnat4tests",
    about = "Launches a disposable XNAT instance in Docker for use in test suites",
    propagate_version = true,
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration profile name, or a path to a profile YAML file
    #[arg(short, long, global = true, default_value = "default")]
    config: String,

    /// Log level filter (error, warn, info, debug, trace)
    #[arg(short, long, global = true, default_value = "info")]
    loglevel: String,
}

/// All available subcommands.
#[derive(Parser, Debug)]
enum Commands {
    /// Build (if needed) and launch the test XNAT, waiting until it is ready
    Start(commands::start::StartArgs),
    /// Stop the test XNAT container (no-op when absent)
    Stop,
    /// Restart the test XNAT container in place
    Restart,
    /// Upload a sample dataset into a running test XNAT
    AddData {
        /// Dataset to upload (available: dummydicom)
        dataset: String,
    },
    /// Manage the companion Docker image registry
    Registry(commands::registry::RegistryArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.loglevel));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    tracing::debug!("Parsed CLI arguments: {:?}", cli);

    let source = ConfigSource::from_name_or_path(&cli.config);
    let command_result = match cli.command {
        Commands::Start(args) => commands::start::handle_start(source, &args).await,
        Commands::Stop => commands::stop::handle_stop(source).await,
        Commands::Restart => commands::restart::handle_restart(source).await,
        Commands::AddData { dataset } => {
            commands::add_data::handle_add_data(source, &dataset).await
        }
        Commands::Registry(args) => commands::registry::handle_registry(source, &args).await,
    };

    if let Err(e) = command_result {
        tracing::error!("Command execution failed: {:?}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
