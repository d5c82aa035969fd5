//! CLI command definitions for the `redchat` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod check;
pub mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat relay server with per-user session history.
#[derive(Parser)]
#[command(name = "redchat", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans to stdout via OpenTelemetry.
    #[arg(long, global = true)]
    pub otel: bool,

    /// Config file (defaults to `config.toml` in the data directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Host to bind to (overrides config and REDCHAT_HOST).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides config and PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print the effective configuration.
    Config,

    /// Send a minimal completion to verify provider connectivity.
    Check,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
