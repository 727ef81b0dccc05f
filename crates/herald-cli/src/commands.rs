//! CLI commands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Herald - typed in-process event dispatch
#[derive(Parser, Debug)]
#[command(name = "herald")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to load instead of searching the usual locations
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter directive (overrides telemetry.level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dispatch a burst of events through a three-level hierarchy
    Demo {
        /// Events to dispatch per round
        #[arg(short, long, default_value_t = 3)]
        events: usize,

        /// Delay per dispatch in milliseconds (overrides dispatch.default_delay_ms)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        /// List discovered config files instead
        #[arg(long)]
        paths: bool,
    },
}
