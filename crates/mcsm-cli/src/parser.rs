//! Root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Supervise Minecraft Java servers and broadcast their console and setup
/// progress to browsers.
#[derive(Debug, Parser)]
#[command(name = "mcsm")]
#[command(about = "Minecraft server supervisor")]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML); missing means defaults
    #[arg(short, long, global = true, env = "MCSM_CONFIG", default_value = "mcsm.toml")]
    pub config: PathBuf,

    /// Enable debug output (overridden by RUST_LOG)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}
