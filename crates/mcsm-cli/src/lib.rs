//! Command-line front end for mcsm.
#![deny(unused_crate_dependencies)]

#[cfg(test)]
use tempfile as _;

// Used by main.rs binary
use tokio as _;
use tracing_subscriber as _;

pub mod commands;
pub mod handlers;
pub mod parser;
pub mod progress;

pub use commands::Commands;
pub use parser::Cli;
