//! Tree termination through `taskkill`.

use std::io;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use super::Terminator;

/// Runs `taskkill /PID <pid> /T`, adding `/F` when forceful.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskkillTerminator;

#[async_trait]
impl Terminator for TaskkillTerminator {
    async fn terminate(&self, pid: u32, forceful: bool) -> io::Result<()> {
        let mut cmd = Command::new("taskkill");
        cmd.arg("/PID").arg(pid.to_string()).arg("/T");
        if forceful {
            cmd.arg("/F");
        }

        debug!(pid, forceful, "Running taskkill");
        let output = cmd.output().await?;
        if output.status.success() {
            return Ok(());
        }

        // 128: no such process
        if output.status.code() == Some(128) {
            return Ok(());
        }
        Err(io::Error::other(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}
