//! Agent task and plan models.

use serde::{Deserialize, Serialize};

use crate::domain::error::{LabError, Result};

/// Terminal status of an agent task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed,
}

/// What an agent runtime hands back after running one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub status: TaskStatus,
    /// Final answer on success, failure reason otherwise.
    pub result: String,
    /// Model cost (tokens or currency units) if the runtime tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

impl Task {
    pub fn completed(result: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Completed,
            result: result.into(),
            cost: None,
        }
    }

    /// A synthetic failed task, used when a run cannot complete.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            status: TaskStatus::Failed,
            result: reason.into(),
            cost: None,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }

    pub fn succeeded(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// One tool invocation the planner asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    #[serde(alias = "tool_name", alias = "name")]
    pub tool: String,
    #[serde(default, alias = "arguments", alias = "tool_args")]
    pub args: serde_json::Value,
}

/// A plan: ordered tool steps plus the answer the model settled on.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Plan {
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default, alias = "finalAnswer", skip_serializing_if = "Option::is_none")]
    pub final_answer: Option<String>,
}

impl Plan {
    /// Interpret a recorded plan document.
    ///
    /// Accepts `null` (empty plan), a bare array of steps, or an object with
    /// `steps` and an optional `final_answer`.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        match value {
            serde_json::Value::Null => Ok(Plan::default()),
            serde_json::Value::Array(_) => {
                let steps: Vec<PlanStep> = serde_json::from_value(value.clone())
                    .map_err(|e| LabError::InvalidPlan(e.to_string()))?;
                Ok(Plan {
                    steps,
                    final_answer: None,
                })
            }
            serde_json::Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| LabError::InvalidPlan(e.to_string())),
            other => Err(LabError::InvalidPlan(format!(
                "expected an array or object, got {other}"
            ))),
        }
    }
}
