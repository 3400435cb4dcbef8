//! Per-server runtime state.

use std::sync::{Arc, PoisonError, RwLock};

use tokio::process::ChildStdin;
use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;

use super::console::ConsoleBuffer;
use super::types::ProcessStatus;

/// Published once by the exit watcher when the child has been reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exited {
    pub code: Option<i32>,
}

/// Wait until the exit watcher reports. A dropped watcher counts as exited.
pub async fn wait_exited(exit: &mut watch::Receiver<Option<Exited>>) -> Exited {
    match exit.wait_for(Option::is_some).await {
        Ok(value) => value.unwrap_or(Exited { code: None }),
        Err(_) => Exited { code: None },
    }
}

/// Live handle of a running process. Replaced on every start.
pub struct ProcessHandle {
    pub pid: u32,
    pub stdin: ChildStdin,
    pub exit: watch::Receiver<Option<Exited>>,
    pub generation: u64,
    /// Console reader tasks, awaited after exit so their output lands first.
    pub readers: Vec<JoinHandle<()>>,
}

/// State guarded by the per-process lifecycle lock.
#[derive(Default)]
pub struct Lifecycle {
    pub handle: Option<ProcessHandle>,
    /// Bumped on every spawn so a stale exit watcher cannot clear a newer handle.
    pub generation: u64,
    /// Set once the server is unregistered; this entry never starts again.
    pub retired: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Snapshot {
    pid: Option<u32>,
    exit_code: Option<i32>,
}

/// One supervised server: lifecycle lock, status snapshot and console.
///
/// Lifecycle operations hold `lifecycle` for their whole duration, which is
/// what serializes start/stop/restart/send on the same server. `status()`
/// reads `snapshot` instead and never waits on them.
pub struct ManagedProcess {
    name: Arc<str>,
    console: Arc<ConsoleBuffer>,
    lifecycle: Mutex<Lifecycle>,
    snapshot: RwLock<Snapshot>,
}

impl ManagedProcess {
    pub fn new(name: &str, console: ConsoleBuffer) -> Self {
        Self {
            name: Arc::from(name),
            console: Arc::new(console),
            lifecycle: Mutex::new(Lifecycle::default()),
            snapshot: RwLock::new(Snapshot::default()),
        }
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub const fn console(&self) -> &Arc<ConsoleBuffer> {
        &self.console
    }

    pub async fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().await
    }

    pub fn status(&self) -> ProcessStatus {
        let snapshot = *self.snapshot.read().unwrap_or_else(PoisonError::into_inner);
        match snapshot.pid {
            Some(pid) => ProcessStatus::Running { pid },
            None => ProcessStatus::Stopped {
                exit_code: snapshot.exit_code,
            },
        }
    }

    /// Call with the lifecycle lock held.
    pub fn mark_running(&self, pid: u32) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.pid = Some(pid);
        snapshot.exit_code = None;
    }

    /// Call with the lifecycle lock held.
    pub fn mark_stopped(&self, exit_code: Option<i32>) {
        let mut snapshot = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.pid = None;
        snapshot.exit_code = exit_code;
    }
}
