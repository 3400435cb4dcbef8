//! Console stream readers (non-UTF8-safe).
//!
//! Game servers and their plugins can emit non-UTF8 bytes on stdout/stderr.
//! `BufReader::lines()` would end the reader on the first invalid byte, so
//! lines are read as bytes and decoded lossily.
//!
//! Until the process exits, EOF (or a read error) is treated as transient and
//! retried after a short backoff. After exit, whatever is still buffered in
//! the pipe is drained with a bounded per-read timeout.

use std::sync::Arc;
use std::time::Duration;

use mcsm_core::{Event, EventSink};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::debug;

use super::console::ConsoleBuffer;
use super::managed::Exited;

/// Backoff after EOF while the process is still alive.
const EOF_BACKOFF: Duration = Duration::from_millis(100);

/// Per-read bound while draining after exit.
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

/// Marker appended by the primary reader once output is exhausted.
pub const PROCESS_ENDED: &str = "[Process ended]";

/// Which pipe a reader is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// stdout; appends the end marker.
    Primary,
    /// stderr; merged into the same console.
    Secondary,
}

impl StreamKind {
    const fn label(self) -> &'static str {
        match self {
            Self::Primary => "stdout",
            Self::Secondary => "stderr",
        }
    }
}

/// Everything a reader needs besides the pipe itself.
#[derive(Clone)]
pub struct ReaderContext {
    pub name: Arc<str>,
    pub console: Arc<ConsoleBuffer>,
    pub sink: Option<Arc<dyn EventSink>>,
    pub exit: watch::Receiver<Option<Exited>>,
}

impl ReaderContext {
    fn emit(&self, line: String) {
        if let Some(sink) = &self.sink {
            sink.report(Event::log(format!("[{}] {line}", self.name)));
        }
        self.console.push(line);
    }
}

/// Spawn a reader task for one output pipe.
pub fn spawn_console_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
    ctx: ReaderContext,
) -> JoinHandle<()> {
    tokio::spawn(read_console(stream, kind, ctx))
}

async fn read_console(stream: impl AsyncRead + Unpin, kind: StreamKind, mut ctx: ReaderContext) {
    let mut reader = BufReader::new(stream);
    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    let mut exited = ctx.exit.borrow().is_some();
    let stream_type = kind.label();

    loop {
        let read = if exited {
            match timeout(DRAIN_TIMEOUT, reader.read_until(b'\n', &mut buf)).await {
                Ok(result) => result,
                Err(_) => break,
            }
        } else {
            // read_until keeps partial data in `buf` when the other branch wins
            tokio::select! {
                result = reader.read_until(b'\n', &mut buf) => result,
                _ = ctx.exit.wait_for(Option::is_some) => {
                    exited = true;
                    continue;
                }
            }
        };

        match read {
            Ok(0) if exited => break,
            Ok(0) => sleep(EOF_BACKOFF).await,
            Ok(_) => {
                // Trim trailing newline(s)
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                buf.clear();
                ctx.emit(line);
            }
            Err(e) if exited => {
                debug!(name = %ctx.name, %stream_type, error = %e, "Read error after exit, stopping reader");
                break;
            }
            Err(e) => {
                debug!(name = %ctx.name, %stream_type, error = %e, "Read error, retrying");
                sleep(EOF_BACKOFF).await;
            }
        }
    }

    if !buf.is_empty() {
        let line = String::from_utf8_lossy(&buf).into_owned();
        ctx.emit(line);
    }
    if kind == StreamKind::Primary {
        ctx.emit(PROCESS_ENDED.to_string());
    }
    debug!(name = %ctx.name, %stream_type, "Console reader task exiting");
}
