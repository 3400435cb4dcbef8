//! Command handlers. Each one is a thin wrapper over the library crates.

pub mod properties;
pub mod serve;
pub mod setup;
