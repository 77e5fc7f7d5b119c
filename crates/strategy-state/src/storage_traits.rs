//! Storage trait definitions for the strategy lab
//!
//! These traits define the persistence seams the core depends on:
//! - `EpisodeStore`: recorded episodes, their tool traces, and per-strategy
//!   outcome summaries over a trailing window
//! - `PromotionRegistry`: baseline promotion history (promote/rollback)
//!
//! All traits are async and backend-agnostic. In-memory fakes are provided
//! for testing via the `fakes` module.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Strategy identity
// ---------------------------------------------------------------------------

/// Grouping key for a strategy: its `metadata.id` plus `metadata.version`.
///
/// Everything else about a strategy is opaque to storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StrategyRef {
    pub id: String,
    pub version: String,
}

impl StrategyRef {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for StrategyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

// ---------------------------------------------------------------------------
// EpisodeStore: recorded executions
// ---------------------------------------------------------------------------

/// Unique identifier for a recorded episode
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpisodeId(pub String);

impl EpisodeId {
    /// Generate a new random EpisodeId
    pub fn new() -> Self {
        EpisodeId(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for EpisodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for EpisodeId {
    fn from(value: &str) -> Self {
        EpisodeId(value.to_string())
    }
}

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Terminal status of a recorded episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Success,
    Failed,
}

/// One recorded historical task execution. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub id: EpisodeId,
    /// The task input given to the agent.
    pub input: String,
    /// The plan the agent's model produced for this input, as recorded.
    pub plan: serde_json::Value,
    /// The final answer the agent reported.
    pub result: serde_json::Value,
    pub strategy_id: String,
    pub strategy_version: String,
    pub status: EpisodeStatus,
    /// Wall-clock duration of the live run in milliseconds.
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

impl Episode {
    /// The strategy this episode ran under.
    pub fn strategy(&self) -> StrategyRef {
        StrategyRef::new(self.strategy_id.clone(), self.strategy_version.clone())
    }

    /// The recorded result rendered as plain text (strings verbatim, other
    /// JSON values in compact form, `null` as empty).
    pub fn result_text(&self) -> String {
        match &self.result {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Outcome of a recorded tool invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceStatus {
    Success,
    Failed,
}

/// One recorded tool invocation within an episode. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub episode_id: EpisodeId,
    /// 0-based, strictly increasing within an episode.
    pub step_index: u32,
    pub tool_name: String,
    pub tool_args: serde_json::Value,
    /// Raw tool output as recorded (JSON document or opaque text).
    pub tool_output: String,
    pub duration_ms: u64,
    pub status: TraceStatus,
}

/// Trailing window for summary queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryWindow {
    /// Only episodes created at or after this unix epoch (milliseconds) count.
    pub since_ms: i64,
    /// At most this many of the newest matching episodes count.
    pub limit: usize,
}

/// Aggregated outcome counts for one strategy over a window
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub total: u64,
    pub success: u64,
    pub failure: u64,
    pub avg_duration_ms: f64,
}

/// Read side of the episode store.
///
/// Guarantees:
/// - `get_traces` returns traces ordered by ascending `step_index`.
/// - Episodes and traces never change once recorded.
#[async_trait]
pub trait EpisodeStore: Send + Sync {
    /// Retrieve an episode. Returns `StorageError::EpisodeNotFound` if absent.
    async fn get_episode(&self, id: &EpisodeId) -> StorageResult<Episode>;

    /// Retrieve all traces for an episode, ordered by `step_index`.
    async fn get_traces(&self, episode_id: &EpisodeId) -> StorageResult<Vec<Trace>>;

    /// Summarize the newest episodes recorded under `strategy` inside `window`.
    async fn summarize_episodes_by_strategy(
        &self,
        strategy_id: &str,
        strategy_version: &str,
        window: SummaryWindow,
    ) -> StorageResult<EpisodeSummary>;
}

// ---------------------------------------------------------------------------
// PromotionRegistry: baseline management
// ---------------------------------------------------------------------------

/// Metadata attached to a promotion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionMetadata {
    /// Who or what promoted this strategy (e.g. "auto-promotion", a username)
    pub promoted_by: String,
    /// Observed success-rate improvement over the previous baseline
    pub improvement: Option<f64>,
    /// Significance of the improvement
    pub p_value: Option<f64>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// A single promotion record (pointer from slot → strategy)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionRecord {
    /// Baseline slot this promotion belongs to
    pub slot: String,
    pub strategy: StrategyRef,
    pub metadata: PromotionMetadata,
    pub created_at: DateTime<Utc>,
}

/// Baseline promotion registry.
///
/// Semantics:
/// - `promote` appends a new record that becomes the current baseline.
/// - `rollback` re-appends the previous record, preserving the audit trail.
/// - `history` returns the chain newest first.
#[async_trait]
pub trait PromotionRegistry: Send + Sync {
    async fn promote(
        &self,
        slot: &str,
        strategy: &StrategyRef,
        metadata: PromotionMetadata,
    ) -> StorageResult<PromotionRecord>;

    /// Roll back to the previous baseline. Fails if none exists.
    async fn rollback(&self, slot: &str) -> StorageResult<PromotionRecord>;

    async fn current(&self, slot: &str) -> StorageResult<Option<PromotionRecord>>;

    async fn history(&self, slot: &str) -> StorageResult<Vec<PromotionRecord>>;
}
