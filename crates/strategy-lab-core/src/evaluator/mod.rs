//! Evaluator: pure scoring and aggregation over task outcomes.
//!
//! - [`scoring`] : `evaluate_task()`, `similarity()`, `ScoringThresholds`
//! - [`summary`] : `summarize()`, `compare_results()`

pub mod scoring;
pub mod summary;

pub use scoring::{
    clamp01, evaluate_task, lower_is_better, similarity, Bounds, EvaluationDetails,
    EvaluationMetrics, EvaluationResult, ScoringThresholds,
};
pub use summary::{compare_results, summarize, EvaluationSummary, StrategyComparison, SummaryDelta};
