//! Terminal rendering of setup events.

use indicatif::{ProgressBar, ProgressStyle};
use mcsm_core::{Event, EventKind, EventSink};

/// [`EventSink`] that drives an `indicatif` bar from `progress` events.
pub struct ProgressSink {
    bar: ProgressBar,
}

impl ProgressSink {
    pub fn new() -> Self {
        let bar = ProgressBar::new(u64::from(Event::MAX_PERCENT));
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Self { bar }
    }

    /// A sink that draws nothing, for tests and non-interactive runs.
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressSink {
    fn report(&self, event: Event) {
        if let Some(percent) = event.percent() {
            self.bar.set_position(u64::from(percent));
        }
        match event.kind() {
            EventKind::Progress => self.bar.set_message(event.message().to_string()),
            EventKind::Log => self.bar.println(event.message()),
            EventKind::Success => self.bar.finish_with_message(event.message().to_string()),
            EventKind::Error => self.bar.abandon_with_message(event.message().to_string()),
            EventKind::Heartbeat => self.bar.tick(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_moves_the_bar() {
        let sink = ProgressSink::hidden();
        sink.report(Event::progress("Resolving version 'latest'...", 20));
        assert_eq!(sink.position(), 20);
        sink.report(Event::log("not a step"));
        assert_eq!(sink.position(), 20);
        sink.report(Event::success("Setup complete!"));
        assert_eq!(sink.position(), 100);
    }
}
