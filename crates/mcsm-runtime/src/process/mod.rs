//! Process supervision for Java game servers.
//!
//! # Structure
//!
//! - `Supervisor` - definition catalog plus start/stop/restart/command/status
//! - `ManagedProcess` - per-server lifecycle lock, status snapshot, console
//! - `ConsoleBuffer` - bounded console history (1000 lines, trimmed to 800)
//! - console readers - one task per output pipe, lossy UTF-8
//! - `Terminator` - platform kill by PID (signals on Unix, `taskkill` on Windows)

mod console;
mod managed;
pub mod shutdown;
mod stream;
mod supervisor;
mod types;

pub use console::{ConsoleBuffer, DEFAULT_MAX_LINES, DEFAULT_TRIM_TO};
pub use shutdown::{PlatformTerminator, Terminator};
pub use stream::PROCESS_ENDED;
pub use supervisor::Supervisor;
pub use types::{ProcessStatus, ServerSummary, StopOutcome, SupervisorConfig};
