//! `ReplayOrchestrator`: one sandboxed agent run per recorded episode.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use strategy_state::{EpisodeId, EpisodeStore};
use tracing::Instrument;

use super::runtime::{AgentContext, AgentRuntime, RecordedPlanner};
use crate::domain::{Result, Strategy, Task};
use crate::evaluator::{
    compare_results, evaluate_task, EvaluationMetrics, EvaluationResult, ScoringThresholds,
    StrategyComparison,
};
use crate::metrics::METRICS;
use crate::obs;
use crate::sandbox::{ReplaySandbox, SandboxMetrics, SandboxOptions};

/// Replays recorded episodes under a strategy and scores the outcome.
pub struct ReplayOrchestrator {
    store: Arc<dyn EpisodeStore>,
    runtime: Arc<dyn AgentRuntime>,
    default_strategy: Strategy,
    thresholds: ScoringThresholds,
    sandbox_options: SandboxOptions,
}

impl ReplayOrchestrator {
    pub fn new(
        store: Arc<dyn EpisodeStore>,
        runtime: Arc<dyn AgentRuntime>,
        default_strategy: Strategy,
    ) -> Self {
        Self {
            store,
            runtime,
            default_strategy,
            thresholds: ScoringThresholds::default(),
            sandbox_options: SandboxOptions::default(),
        }
    }

    pub fn with_thresholds(mut self, thresholds: ScoringThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_sandbox_options(mut self, options: SandboxOptions) -> Self {
        self.sandbox_options = options;
        self
    }

    pub fn default_strategy(&self) -> &Strategy {
        &self.default_strategy
    }

    /// Replay one episode under `strategy` (or the default strategy).
    ///
    /// Store failures are returned as errors. A runtime error, or traces the
    /// sandbox refuses, produce a failed task that is scored like any other.
    /// The result's `task_id` is the episode id.
    pub async fn replay(
        &self,
        episode_id: &EpisodeId,
        strategy: Option<&Strategy>,
    ) -> Result<EvaluationResult> {
        let strategy = strategy.unwrap_or(&self.default_strategy);
        let span = obs::replay_span(&episode_id.0, &strategy.reference().to_string());
        self.replay_inner(episode_id, strategy).instrument(span).await
    }

    async fn replay_inner(
        &self,
        episode_id: &EpisodeId,
        strategy: &Strategy,
    ) -> Result<EvaluationResult> {
        let episode = self.store.get_episode(episode_id).await?;
        let traces = self.store.get_traces(episode_id).await?;
        obs::emit_replay_started(
            &episode_id.0,
            &strategy.reference().to_string(),
            traces.len(),
        );

        let started = Instant::now();
        let (mut task, sandbox_metrics) =
            match ReplaySandbox::new(traces, self.sandbox_options.clone()) {
                Ok(mut sandbox) => {
                    let mut planner = RecordedPlanner::from_episode(&episode);
                    let ctx = AgentContext {
                        strategy,
                        planner: &mut planner,
                        tools: &mut sandbox,
                    };
                    let task = match self.runtime.run(ctx, &episode.input).await {
                        Ok(task) => task,
                        Err(e) => Task::failed(format!("{e:#}")),
                    };
                    (task, sandbox.into_metrics())
                }
                Err(e) => (Task::failed(e.to_string()), SandboxMetrics::default()),
            };
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        task.id = episode.id.to_string();

        let metrics = EvaluationMetrics {
            duration_ms,
            steps: sandbox_metrics.invocation_count,
            cost: task.cost,
            drift_detected: sandbox_metrics.drift_detected(),
            risk_events: sandbox_metrics.risk_event_count,
            human_interrupts: sandbox_metrics.human_interrupt_count,
        };
        let result = evaluate_task(&task, &episode.result_text(), &metrics, &self.thresholds);

        METRICS.inc_replays();
        obs::emit_replay_finished(
            &episode_id.0,
            duration_ms,
            result.success,
            result.score,
            metrics.drift_detected,
        );
        Ok(result)
    }

    /// Replay episodes one after another; episodes that fail to load are
    /// logged and left out.
    pub async fn replay_batch(
        &self,
        episode_ids: &[EpisodeId],
        strategy: Option<&Strategy>,
    ) -> Vec<EvaluationResult> {
        let mut results = Vec::with_capacity(episode_ids.len());
        for id in episode_ids {
            match self.replay(id, strategy).await {
                Ok(result) => results.push(result),
                Err(e) => obs::emit_replay_skipped(&id.0, &e),
            }
        }
        results
    }

    /// Like [`replay_batch`](Self::replay_batch) with up to
    /// `max_concurrency` episodes in flight. Results keep input order.
    pub async fn replay_batch_concurrent(
        &self,
        episode_ids: &[EpisodeId],
        strategy: Option<&Strategy>,
        max_concurrency: usize,
    ) -> Vec<EvaluationResult> {
        let outcomes: Vec<_> = stream::iter(episode_ids)
            .map(|id| async move { (id, self.replay(id, strategy).await) })
            .buffered(max_concurrency.max(1))
            .collect()
            .await;

        outcomes
            .into_iter()
            .filter_map(|(id, outcome)| match outcome {
                Ok(result) => Some(result),
                Err(e) => {
                    obs::emit_replay_skipped(&id.0, &e);
                    None
                }
            })
            .collect()
    }

    /// Replay the same episodes under both strategies and compare.
    pub async fn replay_compare(
        &self,
        episode_ids: &[EpisodeId],
        baseline: &Strategy,
        candidate: &Strategy,
    ) -> StrategyComparison {
        let base = self.replay_batch(episode_ids, Some(baseline)).await;
        let cand = self.replay_batch(episode_ids, Some(candidate)).await;
        compare_results(&base, &cand)
    }
}
