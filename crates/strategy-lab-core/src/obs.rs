//! Structured observability hooks for replay, routing and promotion.
//!
//! This module provides:
//! - Episode-scoped tracing spans via `replay_span`
//! - Emission functions for key lifecycle events
//!
//! Events are emitted at `info!` level except drift, which is `debug!`
//! because a divergent candidate can produce many of them per replay.

use tracing::{debug, info};

use crate::sandbox::DriftEvent;

/// Episode-scoped span for one replay.
///
/// Attach it to the replay future with `tracing::Instrument` so the span
/// follows the future across await points and threads.
///
/// # Example
///
/// ```ignore
/// async { /* replay */ }.instrument(replay_span("ep-12345", "careful@3")).await
/// ```
pub fn replay_span(episode_id: &str, strategy: &str) -> tracing::Span {
    tracing::info_span!("strategy_lab.replay", episode_id = %episode_id, strategy = %strategy)
}

/// Emit event: replay started for an episode under a strategy.
pub fn emit_replay_started(episode_id: &str, strategy: &str, trace_count: usize) {
    info!(
        event = "replay.started",
        episode_id = %episode_id,
        strategy = %strategy,
        trace_count = trace_count,
    );
}

/// Emit event: replay finished with its score.
pub fn emit_replay_finished(
    episode_id: &str,
    duration_ms: u64,
    success: bool,
    score: f64,
    drift_detected: bool,
) {
    info!(
        event = "replay.finished",
        episode_id = %episode_id,
        duration_ms = duration_ms,
        success = success,
        score = score,
        drift_detected = drift_detected,
    );
}

/// Emit event: a replay failed to produce a result and was skipped.
pub fn emit_replay_skipped(episode_id: &str, error: &dyn std::fmt::Display) {
    tracing::warn!(event = "replay.skipped", episode_id = %episode_id, error = %error);
}

/// Emit event: the sandbox recorded a drift event.
pub fn emit_drift(drift: &DriftEvent) {
    debug!(
        event = "sandbox.drift",
        index = drift.index,
        kind = %drift.kind,
        expected = drift.expected.as_deref().unwrap_or("<none>"),
        actual = %drift.actual,
    );
}

/// Emit event: the router picked a strategy for a request.
pub fn emit_router_selected(strategy: &str, role: &str, reason: &str) {
    info!(
        event = "router.selected",
        strategy = %strategy,
        role = %role,
        reason = %reason,
    );
}

/// Emit event: one candidate was checked for auto-promotion.
pub fn emit_promotion_evaluated(
    candidate: &str,
    improvement: f64,
    p_value: f64,
    eligible: bool,
) {
    info!(
        event = "promotion.evaluated",
        candidate = %candidate,
        improvement = improvement,
        p_value = p_value,
        eligible = eligible,
    );
}

/// Emit event: strategy update gate finished.
pub fn emit_gate_evaluated(candidate: &str, status: &str, validator: Option<&str>) {
    info!(
        event = "gate.evaluated",
        candidate = %candidate,
        status = %status,
        validator = validator.unwrap_or("<none>"),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_span_create() {
        let span = replay_span("test-episode", "baseline@1");
        let _guard = span.enter();
        emit_replay_started("test-episode", "baseline@1", 3);
    }
}
