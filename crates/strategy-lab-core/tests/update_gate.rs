//! Strategy update gate fed with offline replay evidence.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use strategy_lab_core::gate::{
    BranchInfo, GateEvidence, StrategyUpdateGate, StrategyValidator, ValidationStatus,
    ValidatorVerdict,
};
use strategy_lab_core::orchestrator::{PlanExecutor, ReplayOrchestrator};
use strategy_lab_core::Strategy;
use strategy_state::{Episode, EpisodeId, EpisodeStatus, MemoryEpisodeStore};

/// Rejects any candidate whose replayed mean score regresses.
struct NoRegression;

#[async_trait]
impl StrategyValidator for NoRegression {
    fn name(&self) -> &str {
        "no-regression"
    }

    async fn validate(
        &self,
        _candidate: &Strategy,
        _branch: &BranchInfo,
        evidence: &GateEvidence,
        _baseline: &Strategy,
    ) -> ValidatorVerdict {
        match &evidence.comparison {
            Some(cmp) if cmp.improvement < 0.0 => {
                ValidatorVerdict::reject(format!("score regressed by {:.3}", -cmp.improvement))
            }
            Some(_) => ValidatorVerdict::pass(),
            None => ValidatorVerdict::needs_human("no replay comparison attached"),
        }
    }
}

/// Sends prompt changes to a reviewer.
struct PromptReview;

#[async_trait]
impl StrategyValidator for PromptReview {
    fn name(&self) -> &str {
        "prompt-review"
    }

    async fn validate(
        &self,
        candidate: &Strategy,
        _branch: &BranchInfo,
        _evidence: &GateEvidence,
        baseline: &Strategy,
    ) -> ValidatorVerdict {
        if candidate.prompt != baseline.prompt {
            ValidatorVerdict::needs_human("prompt changed")
        } else {
            ValidatorVerdict::pass()
        }
    }
}

fn gate() -> StrategyUpdateGate {
    StrategyUpdateGate::new()
        .with_validator(Box::new(NoRegression))
        .with_validator(Box::new(PromptReview))
}

async fn evidence() -> GateEvidence {
    let store = MemoryEpisodeStore::new();
    store
        .insert_episode(Episode {
            id: EpisodeId::from("ep-1"),
            input: "status please".into(),
            plan: json!([{"tool": "git_status"}]),
            result: json!("clean tree"),
            strategy_id: "base".into(),
            strategy_version: "1".into(),
            status: EpisodeStatus::Success,
            duration_ms: 100,
            created_at: Utc::now(),
        })
        .expect("insert episode");

    let baseline = Strategy::new("base", "1");
    let orch = ReplayOrchestrator::new(Arc::new(store), Arc::new(PlanExecutor), baseline.clone());
    let ids = vec![EpisodeId::from("ep-1")];
    let candidate = Strategy::new("cand", "2");
    GateEvidence {
        evaluations: orch.replay_batch(&ids, Some(&candidate)).await,
        comparison: Some(orch.replay_compare(&ids, &baseline, &candidate).await),
    }
}

#[tokio::test]
async fn test_unchanged_candidate_passes_every_validator() {
    let evidence = evidence().await;
    assert_eq!(evidence.evaluations.len(), 1);

    let decision = gate()
        .evaluate(
            &Strategy::new("cand", "2"),
            &BranchInfo {
                name: "strategy/cand".into(),
                ..BranchInfo::default()
            },
            &evidence,
            &Strategy::new("base", "1"),
        )
        .await;
    assert!(decision.passed());
}

#[tokio::test]
async fn test_prompt_change_needs_a_human() {
    let decision = gate()
        .evaluate(
            &Strategy::new("cand", "2").with_prompt("be terse"),
            &BranchInfo::default(),
            &evidence().await,
            &Strategy::new("base", "1"),
        )
        .await;
    assert_eq!(decision.status, ValidationStatus::NeedsHuman);
    assert_eq!(decision.validator.as_deref(), Some("prompt-review"));
}

#[tokio::test]
async fn test_missing_comparison_stops_at_first_validator() {
    let decision = gate()
        .evaluate(
            &Strategy::new("cand", "2").with_prompt("be terse"),
            &BranchInfo::default(),
            &GateEvidence::default(),
            &Strategy::new("base", "1"),
        )
        .await;
    assert_eq!(decision.status, ValidationStatus::NeedsHuman);
    assert_eq!(decision.validator.as_deref(), Some("no-regression"));
}
