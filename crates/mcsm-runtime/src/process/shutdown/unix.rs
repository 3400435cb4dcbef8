//! Signal-based termination (SIGTERM / SIGKILL).

use std::io;

use async_trait::async_trait;
use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tracing::debug;

use super::Terminator;

/// Signals the process group led by `pid`, falling back to the lone process.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalTerminator;

#[async_trait]
impl Terminator for SignalTerminator {
    async fn terminate(&self, pid: u32, forceful: bool) -> io::Result<()> {
        let raw = i32::try_from(pid).map_err(io::Error::other)?;
        let pid = Pid::from_raw(raw);
        let sig = if forceful {
            Signal::SIGKILL
        } else {
            Signal::SIGTERM
        };

        debug!(pid = raw, signal = ?sig, "Signalling process group");
        match signal::killpg(pid, sig) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => match signal::kill(pid, sig) {
                Ok(()) | Err(Errno::ESRCH) => Ok(()),
                Err(e) => Err(io::Error::other(e)),
            },
            Err(e) => Err(io::Error::other(e)),
        }
    }
}
