//! Bounded console history for one managed server.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Lines retained before a trim.
pub const DEFAULT_MAX_LINES: usize = 1000;

/// Lines kept after a trim.
pub const DEFAULT_TRIM_TO: usize = 800;

/// Ordered console lines with a hard cap.
///
/// When an append pushes the length past `max_lines`, the oldest lines are
/// dropped until only the newest `trim_to` remain.
///
/// The lock is never held across an await point, so readers on the async
/// side and snapshot callers on any thread can share it.
#[derive(Debug)]
pub struct ConsoleBuffer {
    lines: Mutex<VecDeque<String>>,
    max_lines: usize,
    trim_to: usize,
}

impl ConsoleBuffer {
    /// Create a buffer with explicit thresholds. `trim_to` is clamped to `max_lines`.
    pub fn new(max_lines: usize, trim_to: usize) -> Self {
        let max_lines = max_lines.max(1);
        Self {
            lines: Mutex::new(VecDeque::with_capacity(max_lines + 1)),
            max_lines,
            trim_to: trim_to.min(max_lines),
        }
    }

    /// Append one line, trimming if the cap is exceeded.
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.push_back(line.into());
        if lines.len() > self.max_lines {
            let excess = lines.len() - self.trim_to;
            lines.drain(..excess);
        }
    }

    /// Copy of every retained line, oldest first.
    pub fn snapshot(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    /// Most recent line, if any.
    pub fn last(&self) -> Option<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Default for ConsoleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINES, DEFAULT_TRIM_TO)
    }
}
