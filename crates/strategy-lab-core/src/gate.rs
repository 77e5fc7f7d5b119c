//! Strategy update gate.
//!
//! An ordered pipeline of [`StrategyValidator`]s decides whether a candidate
//! strategy may replace the baseline. The pipeline stops at the first
//! validator that does not pass. Concrete validators live with the embedder.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Strategy;
use crate::evaluator::{EvaluationResult, StrategyComparison};
use crate::obs;

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pass,
    Reject,
    NeedsHuman,
}

impl std::fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationStatus::Pass => write!(f, "PASS"),
            ValidationStatus::Reject => write!(f, "REJECT"),
            ValidationStatus::NeedsHuman => write!(f, "NEEDS_HUMAN"),
        }
    }
}

/// One validator's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorVerdict {
    pub status: ValidationStatus,
    pub reason: Option<String>,
}

impl ValidatorVerdict {
    pub fn pass() -> Self {
        Self {
            status: ValidationStatus::Pass,
            reason: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::Reject,
            reason: Some(reason.into()),
        }
    }

    pub fn needs_human(reason: impl Into<String>) -> Self {
        Self {
            status: ValidationStatus::NeedsHuman,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Where the candidate came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BranchInfo {
    pub name: String,
    pub author: Option<String>,
    pub description: Option<String>,
}

/// Offline evidence gathered for a candidate.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GateEvidence {
    pub evaluations: Vec<EvaluationResult>,
    pub comparison: Option<StrategyComparison>,
}

#[async_trait]
pub trait StrategyValidator: Send + Sync {
    /// Short name used in logs and the gate decision.
    fn name(&self) -> &str;

    async fn validate(
        &self,
        candidate: &Strategy,
        branch: &BranchInfo,
        evidence: &GateEvidence,
        baseline: &Strategy,
    ) -> ValidatorVerdict;
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Final gate outcome: the deciding verdict and who produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    pub status: ValidationStatus,
    pub reason: Option<String>,
    /// Validator that stopped the pipeline; `None` when every validator passed.
    pub validator: Option<String>,
}

impl GateDecision {
    pub fn passed(&self) -> bool {
        self.status == ValidationStatus::Pass
    }
}

#[derive(Default)]
pub struct StrategyUpdateGate {
    validators: Vec<Box<dyn StrategyValidator>>,
}

impl StrategyUpdateGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_validator(mut self, validator: Box<dyn StrategyValidator>) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn len(&self) -> usize {
        self.validators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run validators in order, stopping at the first non-PASS verdict. An
    /// empty gate passes.
    pub async fn evaluate(
        &self,
        candidate: &Strategy,
        branch: &BranchInfo,
        evidence: &GateEvidence,
        baseline: &Strategy,
    ) -> GateDecision {
        let candidate_ref = candidate.reference().to_string();
        for validator in &self.validators {
            let verdict = validator
                .validate(candidate, branch, evidence, baseline)
                .await;
            if verdict.status != ValidationStatus::Pass {
                obs::emit_gate_evaluated(
                    &candidate_ref,
                    &verdict.status.to_string(),
                    Some(validator.name()),
                );
                return GateDecision {
                    status: verdict.status,
                    reason: verdict.reason,
                    validator: Some(validator.name().to_string()),
                };
            }
        }
        obs::emit_gate_evaluated(&candidate_ref, &ValidationStatus::Pass.to_string(), None);
        GateDecision {
            status: ValidationStatus::Pass,
            reason: None,
            validator: None,
        }
    }
}
