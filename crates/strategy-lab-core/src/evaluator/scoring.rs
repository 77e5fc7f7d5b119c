//! Per-task scoring.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::domain::Task;

/// `best`/`worst` bounds for one "lower is better" component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub best: f64,
    pub worst: f64,
}

impl Bounds {
    pub const fn new(best: f64, worst: f64) -> Self {
        Self { best, worst }
    }

    pub fn score(&self, value: f64) -> f64 {
        lower_is_better(value, self.best, self.worst)
    }
}

/// Thresholds for the component scores of a successful task.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringThresholds {
    pub duration_ms: Bounds,
    pub steps: Bounds,
    pub cost: Bounds,
    /// Used when a task reports no cost.
    pub unknown_cost_score: f64,
    pub risk_events: Bounds,
    pub human_interrupts: Bounds,
}

impl Default for ScoringThresholds {
    fn default() -> Self {
        Self {
            duration_ms: Bounds::new(2_000.0, 60_000.0),
            steps: Bounds::new(3.0, 20.0),
            cost: Bounds::new(1_000.0, 50_000.0),
            unknown_cost_score: 0.5,
            risk_events: Bounds::new(0.0, 5.0),
            human_interrupts: Bounds::new(0.0, 5.0),
        }
    }
}

/// Observed execution metrics for one task.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub duration_ms: u64,
    pub steps: u32,
    pub cost: Option<f64>,
    pub drift_detected: bool,
    pub risk_events: u32,
    pub human_interrupts: u32,
}

/// Component scores behind an `EvaluationResult::score`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EvaluationDetails {
    pub similarity: f64,
    /// Component scores; absent for failed tasks, which only use similarity.
    pub duration_score: Option<f64>,
    pub steps_score: Option<f64>,
    pub cost_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub human_score: Option<f64>,
    pub drift_penalty: f64,
    pub failure_reason: Option<String>,
}

/// Score and context for one evaluated task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub task_id: String,
    pub success: bool,
    /// Always within `[0, 1]`.
    pub score: f64,
    pub metrics: EvaluationMetrics,
    pub details: EvaluationDetails,
}

pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// 1.0 at or below `best`, 0.0 at or above `worst`, linear between.
pub fn lower_is_better(value: f64, best: f64, worst: f64) -> f64 {
    if value <= best {
        return 1.0;
    }
    if value >= worst {
        return 0.0;
    }
    clamp01((worst - value) / (worst - best))
}

fn word_set(text: &str) -> BTreeSet<String> {
    static PUNCTUATION: OnceLock<Option<regex::Regex>> = OnceLock::new();
    let lowered = text.to_lowercase();
    let stripped = match PUNCTUATION.get_or_init(|| regex::Regex::new(r"[^\p{L}\p{N}\s]").ok()) {
        Some(re) => re.replace_all(&lowered, "").into_owned(),
        None => lowered
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect(),
    };
    stripped.split_whitespace().map(str::to_string).collect()
}

/// Jaccard index over normalized word sets.
pub fn similarity(actual: &str, reference: &str) -> f64 {
    let a = word_set(actual);
    let b = word_set(reference);
    match (a.is_empty(), b.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.5,
        _ => {
            let intersection = a.intersection(&b).count() as f64;
            let union = a.union(&b).count() as f64;
            intersection / union
        }
    }
}

/// Score one task against its reference result.
pub fn evaluate_task(
    outcome: &Task,
    reference: &str,
    metrics: &EvaluationMetrics,
    thresholds: &ScoringThresholds,
) -> EvaluationResult {
    let sim = similarity(&outcome.result, reference);
    let drift = if metrics.drift_detected { 1.0 } else { 0.0 };

    let (score, details) = if outcome.succeeded() {
        let duration = thresholds.duration_ms.score(metrics.duration_ms as f64);
        let steps = thresholds.steps.score(f64::from(metrics.steps));
        let cost = metrics
            .cost
            .map(|c| thresholds.cost.score(c))
            .unwrap_or(thresholds.unknown_cost_score);
        let risk = thresholds.risk_events.score(f64::from(metrics.risk_events));
        let human = thresholds
            .human_interrupts
            .score(f64::from(metrics.human_interrupts));
        let raw = 0.45
            + 0.15 * sim
            + 0.15 * duration
            + 0.10 * steps
            + 0.05 * cost
            + 0.05 * risk
            + 0.05 * human
            - 0.15 * drift;
        let details = EvaluationDetails {
            similarity: sim,
            duration_score: Some(duration),
            steps_score: Some(steps),
            cost_score: Some(cost),
            risk_score: Some(risk),
            human_score: Some(human),
            drift_penalty: 0.15 * drift,
            failure_reason: None,
        };
        (clamp01(raw), details)
    } else {
        let details = EvaluationDetails {
            similarity: sim,
            drift_penalty: 0.05 * drift,
            failure_reason: Some(outcome.result.clone()),
            ..EvaluationDetails::default()
        };
        (clamp01(0.1 * sim - 0.05 * drift), details)
    };

    EvaluationResult {
        task_id: outcome.id.clone(),
        success: outcome.succeeded(),
        score,
        metrics: *metrics,
        details,
    }
}
