//! Poll statistics

use crate::action::UpdateReport;

/// Running totals across every poll of a manager
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    /// Polls completed
    pub polls: u64,
    /// Transitions dispatched
    pub transitions: u64,
    /// Candidate events produced by bindings
    pub candidates: u64,
    /// Bindings skipped because their filter was unknown
    pub skipped_bindings: u64,
    /// Bindings skipped because a source query or filter failed
    pub failed_bindings: u64,
    /// Source poll failures
    pub source_failures: u64,
    /// Transitions in the most recent poll
    pub last_poll_transitions: usize,
}

impl PollStats {
    /// Create zeroed stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one map evaluation into the totals
    pub fn record_update(&mut self, report: UpdateReport) {
        self.candidates += report.emitted as u64;
        self.skipped_bindings += report.skipped as u64;
        self.failed_bindings += report.failed as u64;
    }

    /// Close out a poll that produced `transitions` transitions
    pub fn record_poll(&mut self, transitions: usize) {
        self.polls += 1;
        self.transitions += transitions as u64;
        self.last_poll_transitions = transitions;
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "Polls: {} | Transitions: {} (last: {}) | Skipped: {} | Failed: {} | Source failures: {}",
            self.polls,
            self.transitions,
            self.last_poll_transitions,
            self.skipped_bindings,
            self.failed_bindings,
            self.source_failures
        )
    }
}
