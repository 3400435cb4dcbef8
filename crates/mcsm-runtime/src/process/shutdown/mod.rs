//! Forced and polite termination of managed processes by PID.
//!
//! The exit watcher owns the `Child`, so everything here works from the PID
//! alone. Reaping stays with the watcher.
//!
//! - Unix: the server runs in its own process group; signals go to the group
//! - Windows: `taskkill /T` terminates the process tree

use std::io;

use async_trait::async_trait;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::SignalTerminator as PlatformTerminator;
#[cfg(windows)]
pub use windows::TaskkillTerminator as PlatformTerminator;

/// Capability to end a process (tree) by PID.
#[async_trait]
pub trait Terminator: Send + Sync {
    /// Ask the process to exit; `forceful` kills it outright.
    ///
    /// A process that is already gone is not an error.
    async fn terminate(&self, pid: u32, forceful: bool) -> io::Result<()>;
}
