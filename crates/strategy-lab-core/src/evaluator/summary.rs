//! Aggregation over evaluated tasks and baseline/candidate comparison.

use serde::{Deserialize, Serialize};

use super::scoring::EvaluationResult;

/// Aggregate view of a result set. Empty input yields all zeros.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationSummary {
    pub tasks: usize,
    pub success_rate: f64,
    pub average_score: f64,
    pub average_duration_ms: f64,
    /// Mean over the tasks that reported a cost; `None` if none did.
    pub average_cost: Option<f64>,
    pub drift_rate: f64,
    pub average_risk_events: f64,
    pub average_human_interrupts: f64,
}

/// Field-wise `candidate - baseline`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryDelta {
    pub tasks: i64,
    pub success_rate: f64,
    pub average_score: f64,
    pub average_duration_ms: f64,
    /// Only present when both sides report a cost.
    pub average_cost: Option<f64>,
    pub drift_rate: f64,
    pub average_risk_events: f64,
    pub average_human_interrupts: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub baseline: EvaluationSummary,
    pub candidate: EvaluationSummary,
    pub delta: SummaryDelta,
    /// Relative change in mean score; the baseline divisor falls back to 1
    /// when the baseline mean is zero.
    pub improvement: f64,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

fn average(results: &[EvaluationResult], field: impl Fn(&EvaluationResult) -> f64) -> f64 {
    mean(results.iter().map(field)).unwrap_or(0.0)
}

pub fn summarize(results: &[EvaluationResult]) -> EvaluationSummary {
    if results.is_empty() {
        return EvaluationSummary::default();
    }
    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    EvaluationSummary {
        tasks: results.len(),
        success_rate: average(results, |r| flag(r.success)),
        average_score: average(results, |r| r.score),
        average_duration_ms: average(results, |r| r.metrics.duration_ms as f64),
        average_cost: mean(results.iter().filter_map(|r| r.metrics.cost)),
        drift_rate: average(results, |r| flag(r.metrics.drift_detected)),
        average_risk_events: average(results, |r| f64::from(r.metrics.risk_events)),
        average_human_interrupts: average(results, |r| f64::from(r.metrics.human_interrupts)),
    }
}

pub fn compare_results(
    baseline: &[EvaluationResult],
    candidate: &[EvaluationResult],
) -> StrategyComparison {
    let base = summarize(baseline);
    let cand = summarize(candidate);

    let divisor = if base.average_score == 0.0 {
        1.0
    } else {
        base.average_score
    };
    let improvement = (cand.average_score - base.average_score) / divisor;

    let delta = SummaryDelta {
        tasks: cand.tasks as i64 - base.tasks as i64,
        success_rate: cand.success_rate - base.success_rate,
        average_score: cand.average_score - base.average_score,
        average_duration_ms: cand.average_duration_ms - base.average_duration_ms,
        average_cost: match (cand.average_cost, base.average_cost) {
            (Some(c), Some(b)) => Some(c - b),
            _ => None,
        },
        drift_rate: cand.drift_rate - base.drift_rate,
        average_risk_events: cand.average_risk_events - base.average_risk_events,
        average_human_interrupts: cand.average_human_interrupts - base.average_human_interrupts,
    };

    StrategyComparison {
        baseline: base,
        candidate: cand,
        delta,
        improvement,
    }
}
