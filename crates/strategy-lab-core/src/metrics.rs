//! Global atomic counters for strategy lab observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. at the end of a batch).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters: no allocations, no locking.
pub struct Metrics {
    replays_executed: AtomicU64,
    tool_calls: AtomicU64,
    drift_events: AtomicU64,
    promotions_emitted: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            replays_executed: AtomicU64::new(0),
            tool_calls: AtomicU64::new(0),
            drift_events: AtomicU64::new(0),
            promotions_emitted: AtomicU64::new(0),
        }
    }

    /// Increment the replays-executed counter by one.
    pub fn inc_replays(&self) {
        self.replays_executed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "replays_executed", "counter incremented");
    }

    /// Increment the sandbox tool-call counter by one.
    pub fn inc_tool_calls(&self) {
        self.tool_calls.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "tool_calls", "counter incremented");
    }

    /// Increment the drift-event counter by one.
    pub fn inc_drift_events(&self) {
        self.drift_events.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "drift_events", "counter incremented");
    }

    /// Increment the promotions-emitted counter by one.
    pub fn inc_promotions(&self) {
        self.promotions_emitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "promotions_emitted", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            replays_executed = self.replays_executed(),
            tool_calls = self.tool_calls(),
            drift_events = self.drift_events(),
            promotions_emitted = self.promotions_emitted(),
        );
    }

    pub fn replays_executed(&self) -> u64 {
        self.replays_executed.load(Ordering::Relaxed)
    }

    pub fn tool_calls(&self) -> u64 {
        self.tool_calls.load(Ordering::Relaxed)
    }

    pub fn drift_events(&self) -> u64 {
        self.drift_events.load(Ordering::Relaxed)
    }

    pub fn promotions_emitted(&self) -> u64 {
        self.promotions_emitted.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.replays_executed.store(0, Ordering::Relaxed);
        self.tool_calls.store(0, Ordering::Relaxed);
        self.drift_events.store(0, Ordering::Relaxed);
        self.promotions_emitted.store(0, Ordering::Relaxed);
    }
}
