//! Global atomic counters for audit runs.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event at the end of a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

pub struct Metrics {
    repositories_analyzed: AtomicU64,
    issues_found: AtomicU64,
    fixes_attempted: AtomicU64,
    content_mutations: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            repositories_analyzed: AtomicU64::new(0),
            issues_found: AtomicU64::new(0),
            fixes_attempted: AtomicU64::new(0),
            content_mutations: AtomicU64::new(0),
        }
    }

    pub fn inc_repositories_analyzed(&self) {
        self.repositories_analyzed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "repositories_analyzed", "counter incremented");
    }

    pub fn add_issues_found(&self, count: u64) {
        self.issues_found.fetch_add(count, Ordering::Relaxed);
        tracing::trace!(metric = "issues_found", count, "counter incremented");
    }

    pub fn inc_fixes_attempted(&self) {
        self.fixes_attempted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "fixes_attempted", "counter incremented");
    }

    /// Counted once per rate-limited content write.
    pub fn inc_content_mutations(&self) {
        self.content_mutations.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "content_mutations", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            repositories_analyzed = self.repositories_analyzed(),
            issues_found = self.issues_found(),
            fixes_attempted = self.fixes_attempted(),
            content_mutations = self.content_mutations(),
        );
    }

    pub fn repositories_analyzed(&self) -> u64 {
        self.repositories_analyzed.load(Ordering::Relaxed)
    }

    pub fn issues_found(&self) -> u64 {
        self.issues_found.load(Ordering::Relaxed)
    }

    pub fn fixes_attempted(&self) -> u64 {
        self.fixes_attempted.load(Ordering::Relaxed)
    }

    pub fn content_mutations(&self) -> u64 {
        self.content_mutations.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.repositories_analyzed.store(0, Ordering::Relaxed);
        self.issues_found.store(0, Ordering::Relaxed);
        self.fixes_attempted.store(0, Ordering::Relaxed);
        self.content_mutations.store(0, Ordering::Relaxed);
    }
}
