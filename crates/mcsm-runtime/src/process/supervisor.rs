//! Process supervisor for Java game servers.
//!
//! Owns the definition catalog and one [`ManagedProcess`] per server that was
//! ever asked to start. Each server has its own lifecycle lock, so different
//! servers start and stop fully in parallel while requests against the same
//! server are serialized.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use mcsm_core::{Event, EventSink, ProcessError, ServerDefinition};
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::console::ConsoleBuffer;
use super::managed::{Exited, Lifecycle, ManagedProcess, ProcessHandle, wait_exited};
use super::shutdown::{PlatformTerminator, Terminator};
use super::stream::{ReaderContext, StreamKind, spawn_console_reader};
use super::types::{ProcessStatus, ServerSummary, StopOutcome, SupervisorConfig};

/// Upper bound on waiting for the exit watcher after a forced kill.
const KILL_WAIT: Duration = Duration::from_secs(10);

/// Upper bound on waiting for console readers to drain after exit.
const READER_WAIT: Duration = Duration::from_secs(2);

/// Concurrent registry and lifecycle manager of game-server processes.
pub struct Supervisor {
    config: SupervisorConfig,
    definitions: DashMap<String, ServerDefinition>,
    processes: DashMap<String, Arc<ManagedProcess>>,
    sink: Option<Arc<dyn EventSink>>,
    terminator: Arc<dyn Terminator>,
}

impl Supervisor {
    /// Create a supervisor with no event sink and the platform terminator.
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            definitions: DashMap::new(),
            processes: DashMap::new(),
            sink: None,
            terminator: Arc::new(PlatformTerminator),
        }
    }

    /// Forward console lines and lifecycle notes to `sink`.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the platform terminator.
    #[must_use]
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    pub const fn config(&self) -> &SupervisorConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Definition catalog
    // ---------------------------------------------------------------------

    /// Insert or replace a definition. Returns the previous one.
    pub fn register(&self, definition: ServerDefinition) -> Option<ServerDefinition> {
        debug!(name = %definition.name, dir = %definition.directory.display(), "Registering server");
        self.definitions
            .insert(definition.name.clone(), definition)
    }

    /// Replace the definition of a registered server that is not running.
    pub async fn update(
        &self,
        definition: ServerDefinition,
    ) -> Result<ServerDefinition, ProcessError> {
        let name = definition.name.clone();
        if !self.definitions.contains_key(&name) {
            return Err(ProcessError::NotFound(name));
        }
        let Some(process) = self.process(&name) else {
            self.register(definition.clone());
            return Ok(definition);
        };

        // Swap under the lifecycle lock so a waiting start sees the new one.
        let lifecycle = process.lock().await;
        if lifecycle.retired {
            return Err(ProcessError::NotFound(name));
        }
        if lifecycle.handle.is_some() {
            return Err(ProcessError::AlreadyRunning(name));
        }
        self.register(definition.clone());
        Ok(definition)
    }

    /// Stop the server if it runs, then forget it.
    pub async fn unregister(&self, name: &str) -> Result<ServerDefinition, ProcessError> {
        // Starts that have not taken the lifecycle lock yet fail with NotFound.
        let (_, definition) = self
            .definitions
            .remove(name)
            .ok_or_else(|| ProcessError::NotFound(name.to_string()))?;

        if let Some(process) = self.process(name) {
            let mut lifecycle = process.lock().await;
            if lifecycle.handle.is_some() {
                if let Err(e) = self.stop_locked(&process, &mut lifecycle).await {
                    self.definitions.insert(name.to_string(), definition);
                    return Err(e);
                }
            }
            lifecycle.retired = true;
            self.processes.remove_if(name, |_, current| Arc::ptr_eq(current, &process));
        }
        debug!(name = %name, "Unregistered server");
        Ok(definition)
    }

    pub fn definition(&self, name: &str) -> Option<ServerDefinition> {
        self.definitions.get(name).map(|entry| entry.value().clone())
    }

    /// All definitions, sorted by name.
    pub fn definitions(&self) -> Vec<ServerDefinition> {
        let mut definitions: Vec<_> = self
            .definitions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Every definition with its current status.
    pub fn list(&self) -> Vec<ServerSummary> {
        self.definitions()
            .into_iter()
            .map(|definition| {
                let status = match self.status(&definition.name) {
                    ProcessStatus::NotFound => ProcessStatus::Stopped { exit_code: None },
                    status => status,
                };
                ServerSummary { definition, status }
            })
            .collect()
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Launch the server registered under `name`. Returns the PID.
    ///
    /// Does not wait for the server to become ready.
    pub async fn start(&self, name: &str) -> Result<u32, ProcessError> {
        if !self.definitions.contains_key(name) {
            return Err(ProcessError::NotFound(name.to_string()));
        }
        let process = self.process_entry(name);
        let mut lifecycle = process.lock().await;
        let definition = self.locked_definition(name, &process, &lifecycle)?;
        self.start_locked(&process, &mut lifecycle, &definition)
    }

    /// Ask the server to stop, killing it after the grace period.
    pub async fn stop(&self, name: &str) -> Result<StopOutcome, ProcessError> {
        let process = self
            .process(name)
            .ok_or_else(|| ProcessError::NotRunning(name.to_string()))?;
        let mut lifecycle = process.lock().await;
        self.stop_locked(&process, &mut lifecycle).await
    }

    /// Stop (if running) and start again under one lifecycle lock.
    pub async fn restart(&self, name: &str) -> Result<u32, ProcessError> {
        if !self.definitions.contains_key(name) {
            return Err(ProcessError::NotFound(name.to_string()));
        }
        let process = self.process_entry(name);
        let mut lifecycle = process.lock().await;
        let definition = self.locked_definition(name, &process, &lifecycle)?;
        if lifecycle.handle.is_some() {
            self.stop_locked(&process, &mut lifecycle).await?;
        }
        self.start_locked(&process, &mut lifecycle, &definition)
    }

    /// Write `text` plus a newline to the server's stdin.
    pub async fn send_command(&self, name: &str, text: &str) -> Result<(), ProcessError> {
        let process = self
            .process(name)
            .ok_or_else(|| ProcessError::NotRunning(name.to_string()))?;
        let mut lifecycle = process.lock().await;
        let handle = lifecycle
            .handle
            .as_mut()
            .ok_or_else(|| ProcessError::NotRunning(name.to_string()))?;

        write_line(&mut handle.stdin, text)
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::BrokenPipe => ProcessError::BrokenPipe(name.to_string()),
                _ => ProcessError::Io(e),
            })?;

        debug!(name = %name, command = %text, "Sent command");
        process.console().push(format!("> {text}"));
        Ok(())
    }

    /// Current status. Never blocks on a lifecycle operation.
    pub fn status(&self, name: &str) -> ProcessStatus {
        self.process(name)
            .map_or(ProcessStatus::NotFound, |process| process.status())
    }

    /// Console history of a registered (or previously started) server.
    pub fn console(&self, name: &str) -> Result<Vec<String>, ProcessError> {
        if let Some(process) = self.process(name) {
            return Ok(process.console().snapshot());
        }
        if self.definitions.contains_key(name) {
            return Ok(Vec::new());
        }
        Err(ProcessError::NotFound(name.to_string()))
    }

    pub fn clear_console(&self, name: &str) -> Result<(), ProcessError> {
        if let Some(process) = self.process(name) {
            process.console().clear();
            return Ok(());
        }
        if self.definitions.contains_key(name) {
            return Ok(());
        }
        Err(ProcessError::NotFound(name.to_string()))
    }

    /// Stop every running server concurrently.
    pub async fn shutdown_all(&self) {
        let running: Vec<String> = self
            .processes
            .iter()
            .filter(|entry| entry.value().status().is_running())
            .map(|entry| entry.key().clone())
            .collect();
        if running.is_empty() {
            return;
        }

        info!(count = running.len(), "Stopping all servers");
        let results = join_all(running.iter().map(|name| self.stop(name))).await;
        for (name, result) in running.iter().zip(results) {
            match result {
                Ok(outcome) => debug!(name = %name, forced = outcome.forced, "Server stopped"),
                Err(ProcessError::NotRunning(_)) => {}
                Err(e) => warn!(name = %name, error = %e, "Failed to stop server"),
            }
        }
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn process(&self, name: &str) -> Option<Arc<ManagedProcess>> {
        self.processes.get(name).map(|entry| Arc::clone(entry.value()))
    }

    fn process_entry(&self, name: &str) -> Arc<ManagedProcess> {
        let entry = self.processes.entry(name.to_string()).or_insert_with(|| {
            Arc::new(ManagedProcess::new(
                name,
                ConsoleBuffer::new(self.config.console_max_lines, self.config.console_trim_to),
            ))
        });
        Arc::clone(entry.value())
    }

    /// Definition to launch, read with the lifecycle lock held.
    ///
    /// `NotFound` when the server was unregistered while the caller waited
    /// for the lock. A fresh entry created by that caller is dropped again.
    fn locked_definition(
        &self,
        name: &str,
        process: &Arc<ManagedProcess>,
        lifecycle: &Lifecycle,
    ) -> Result<ServerDefinition, ProcessError> {
        if !lifecycle.retired {
            if let Some(definition) = self.definition(name) {
                return Ok(definition);
            }
            if lifecycle.handle.is_none() {
                self.processes.remove_if(name, |_, current| Arc::ptr_eq(current, process));
            }
        }
        Err(ProcessError::NotFound(name.to_string()))
    }

    /// Append a lifecycle note to the console and broadcast it.
    fn note(&self, process: &ManagedProcess, line: String) {
        if let Some(sink) = &self.sink {
            sink.report(Event::log(line.clone()));
        }
        process.console().push(line);
    }

    fn start_locked(
        &self,
        process: &Arc<ManagedProcess>,
        lifecycle: &mut Lifecycle,
        definition: &ServerDefinition,
    ) -> Result<u32, ProcessError> {
        let name = definition.name.as_str();
        if lifecycle.handle.is_some() {
            return Err(ProcessError::AlreadyRunning(name.to_string()));
        }

        let jar = definition.jar_path();
        if !jar.is_file() {
            return Err(ProcessError::MissingArtifact(jar));
        }
        if !is_writable(&definition.directory) {
            return Err(ProcessError::PermissionDenied(definition.directory.clone()));
        }

        let mut child = self.spawn_java(definition)?;
        self.note(process, format!("Starting server '{name}'..."));
        let pid = child
            .id()
            .ok_or_else(|| ProcessError::Io(io::Error::other("child has no PID")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProcessError::Io(io::Error::other("child stdin not captured")))?;

        lifecycle.generation += 1;
        let generation = lifecycle.generation;
        let (exit_tx, exit_rx) = watch::channel(None);

        let ctx = ReaderContext {
            name: Arc::clone(process.name()),
            console: Arc::clone(process.console()),
            sink: self.sink.clone(),
            exit: exit_rx.clone(),
        };
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_console_reader(stdout, StreamKind::Primary, ctx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_console_reader(stderr, StreamKind::Secondary, ctx));
        }

        tokio::spawn(watch_exit(
            child,
            exit_tx,
            Arc::clone(process),
            generation,
            self.sink.clone(),
        ));

        lifecycle.handle = Some(ProcessHandle {
            pid,
            stdin,
            exit: exit_rx,
            generation,
            readers,
        });
        process.mark_running(pid);

        info!(name = %name, pid, "Server started");
        Ok(pid)
    }

    fn spawn_java(&self, definition: &ServerDefinition) -> Result<Child, ProcessError> {
        let mut cmd = Command::new(&self.config.java_path);
        cmd.args(definition.launch_args())
            .current_dir(&definition.directory)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Own process group so a forced kill reaches the whole tree
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(name = %definition.name, java = %self.config.java_path.display(), "Spawning server");
        cmd.spawn().map_err(|source| ProcessError::SpawnFailed {
            name: definition.name.clone(),
            source,
        })
    }

    async fn stop_locked(
        &self,
        process: &ManagedProcess,
        lifecycle: &mut Lifecycle,
    ) -> Result<StopOutcome, ProcessError> {
        let name = Arc::clone(process.name());
        let Some(mut handle) = lifecycle.handle.take() else {
            return Err(ProcessError::NotRunning(name.to_string()));
        };

        info!(name = %name, pid = handle.pid, "Stopping server");
        if let Err(e) = write_line(&mut handle.stdin, &self.config.graceful_command).await {
            // Already exiting; the wait below still applies
            debug!(name = %name, error = %e, "Could not write stop command");
        }

        let outcome = match timeout(self.config.grace_period, wait_exited(&mut handle.exit)).await
        {
            Ok(exited) => StopOutcome {
                forced: false,
                exit_code: exited.code,
            },
            Err(_) => {
                warn!(
                    name = %name,
                    pid = handle.pid,
                    grace_secs = self.config.grace_period.as_secs(),
                    "Grace period elapsed, killing server"
                );
                if let Err(e) = self.terminator.terminate(handle.pid, true).await {
                    error!(name = %name, pid = handle.pid, error = %e, "Forced termination failed");
                }
                let exited = match timeout(KILL_WAIT, wait_exited(&mut handle.exit)).await {
                    Ok(exited) => exited,
                    Err(_) => {
                        error!(name = %name, pid = handle.pid, "Process did not exit after kill");
                        Exited { code: None }
                    }
                };
                StopOutcome {
                    forced: true,
                    exit_code: exited.code,
                }
            }
        };

        let readers = std::mem::take(&mut handle.readers);
        drop(handle);
        join_readers(&name, readers).await;
        process.mark_stopped(outcome.exit_code);

        if outcome.forced {
            self.note(process, format!("[Force killed server '{name}']"));
            self.note(process, format!("[Server '{name}' stopped]"));
        } else {
            self.note(process, format!("[Server '{name}' stopped gracefully]"));
        }
        info!(name = %name, forced = outcome.forced, exit_code = ?outcome.exit_code, "Server stopped");
        Ok(outcome)
    }
}

async fn write_line(stdin: &mut ChildStdin, text: &str) -> io::Result<()> {
    let mut line = String::with_capacity(text.len() + 1);
    line.push_str(text);
    line.push('\n');
    stdin.write_all(line.as_bytes()).await?;
    stdin.flush().await
}

/// Wait (bounded) for console readers to finish draining.
async fn join_readers(name: &str, readers: Vec<tokio::task::JoinHandle<()>>) {
    if timeout(READER_WAIT, join_all(readers)).await.is_err() {
        debug!(name = %name, "Console readers still draining");
    }
}

/// Reap `child`, publish its exit, and clear the handle on a natural exit.
async fn watch_exit(
    mut child: Child,
    exit_tx: watch::Sender<Option<Exited>>,
    process: Arc<ManagedProcess>,
    generation: u64,
    sink: Option<Arc<dyn EventSink>>,
) {
    let code = match child.wait().await {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(name = %process.name(), error = %e, "Failed to wait for server process");
            None
        }
    };
    exit_tx.send_replace(Some(Exited { code }));

    // A stop in progress holds the lock and clears the handle itself
    let mut lifecycle = process.lock().await;
    let current = lifecycle
        .handle
        .as_ref()
        .is_some_and(|handle| handle.generation == generation);
    if !current {
        return;
    }

    if let Some(handle) = lifecycle.handle.take() {
        join_readers(process.name(), handle.readers).await;
    }
    process.mark_stopped(code);
    let line = match code {
        Some(code) => format!("[Server '{}' exited with code {code}]", process.name()),
        None => format!("[Server '{}' exited]", process.name()),
    };
    info!(name = %process.name(), exit_code = ?code, "Server exited on its own");
    if let Some(sink) = &sink {
        sink.report(Event::log(line.clone()));
    }
    process.console().push(line);
}

#[cfg(unix)]
fn is_writable(dir: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};
    access(dir, AccessFlags::W_OK).is_ok()
}

#[cfg(not(unix))]
fn is_writable(dir: &Path) -> bool {
    std::fs::metadata(dir).is_ok_and(|meta| meta.is_dir() && !meta.permissions().readonly())
}
