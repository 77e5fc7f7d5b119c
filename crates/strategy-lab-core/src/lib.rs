//! Strategy Lab Core Library
//!
//! Offline and online evaluation of agent strategies:
//!
//! - `sandbox`: deterministic replay of recorded tool calls
//! - `evaluator`: task scoring and baseline/candidate comparison
//! - `orchestrator`: sandboxed agent runs over recorded episodes
//! - `router`: shadow traffic split and gated auto-promotion
//! - `gate`: ordered validator pipeline for strategy updates

pub mod config;
pub mod domain;
pub mod evaluator;
pub mod gate;
pub mod metrics;
pub mod obs;
pub mod orchestrator;
pub mod router;
pub mod sandbox;
pub mod telemetry;

pub use config::{ConfigError, ShadowConfig};

pub use domain::{
    canonical_json, LabError, Plan, PlanStep, Result, Strategy, StrategyMetadata, Task, TaskStatus,
};

pub use evaluator::{
    compare_results, evaluate_task, similarity, summarize, EvaluationDetails, EvaluationMetrics,
    EvaluationResult, EvaluationSummary, ScoringThresholds, StrategyComparison, SummaryDelta,
};

pub use gate::{
    BranchInfo, GateDecision, GateEvidence, StrategyUpdateGate, StrategyValidator,
    ValidationStatus, ValidatorVerdict,
};

pub use orchestrator::{
    AgentContext, AgentRuntime, PlanExecutor, Planner, RecordedPlanner, ReplayOrchestrator,
    ToolExecutor,
};

pub use router::{
    load_candidates, EntropySampler, RouteRole, RoutedStrategy, SeededSampler,
    ShadowPromotionDecision, ShadowRouter, UniformSampler,
};

pub use sandbox::{
    DriftEvent, DriftKind, ReplaySandbox, SandboxError, SandboxMetrics, SandboxOptions,
    ToolResult, VirtualWorld,
};

pub use strategy_state::{
    Episode, EpisodeId, EpisodeStatus, EpisodeStore, EpisodeSummary, PromotionRegistry,
    StrategyRef, Trace, TraceStatus,
};

/// Crate version, as recorded in Cargo metadata.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
