//! The seams between the orchestrator and an agent runtime.
//!
//! An [`AgentRuntime`] receives a planner and a tool surface through
//! [`AgentContext`]. During replay the planner is a [`RecordedPlanner`] and
//! the tools are a `ReplaySandbox`, so a run never reaches a live model or a
//! live tool.

use async_trait::async_trait;
use serde_json::Value;
use strategy_state::Episode;

use crate::domain::{Plan, Result, Strategy, Task};
use crate::sandbox::{SandboxResult, ToolResult};

/// Synchronous tool surface exposed to a runtime.
pub trait ToolExecutor: Send {
    fn call_tool(&mut self, name: &str, args: &Value) -> SandboxResult<ToolResult>;
}

/// Produces the plan a runtime executes.
pub trait Planner: Send {
    fn plan(&mut self, input: &str, strategy: &Strategy) -> Result<Plan>;
}

/// Everything a runtime may use during one run.
pub struct AgentContext<'a> {
    pub strategy: &'a Strategy,
    pub planner: &'a mut dyn Planner,
    pub tools: &'a mut dyn ToolExecutor,
}

/// An agent loop. Implementations are external; errors are collapsed into a
/// failed task by the orchestrator.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(&self, ctx: AgentContext<'_>, input: &str) -> anyhow::Result<Task>;
}

/// Replays the plan an episode originally recorded.
///
/// When the recorded plan carries no final answer, the episode's recorded
/// result stands in for it.
#[derive(Debug, Clone)]
pub struct RecordedPlanner {
    plan: Value,
    result: String,
}

impl RecordedPlanner {
    pub fn new(plan: Value, result: impl Into<String>) -> Self {
        Self {
            plan,
            result: result.into(),
        }
    }

    pub fn from_episode(episode: &Episode) -> Self {
        Self::new(episode.plan.clone(), episode.result_text())
    }
}

impl Planner for RecordedPlanner {
    fn plan(&mut self, _input: &str, _strategy: &Strategy) -> Result<Plan> {
        let mut plan = Plan::from_value(&self.plan)?;
        if plan.final_answer.is_none() && !self.result.is_empty() {
            plan.final_answer = Some(self.result.clone());
        }
        Ok(plan)
    }
}

/// Reference runtime: runs each plan step through the tool surface in order.
///
/// The first `is_error` result or tool failure fails the task. On success the
/// task result is the plan's final answer, or the last tool output if the plan
/// has none.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanExecutor;

#[async_trait]
impl AgentRuntime for PlanExecutor {
    async fn run(&self, ctx: AgentContext<'_>, input: &str) -> anyhow::Result<Task> {
        let plan = ctx.planner.plan(input, ctx.strategy)?;
        let mut last_output = String::new();

        for (i, step) in plan.steps.iter().enumerate() {
            let result = match ctx.tools.call_tool(&step.tool, &step.args) {
                Ok(result) => result,
                Err(e) => {
                    return Ok(Task::failed(format!("step {i} ({}): {e}", step.tool)));
                }
            };
            if result.is_error {
                return Ok(Task::failed(format!(
                    "step {i} ({}) returned an error: {}",
                    step.tool,
                    result.text_content()
                )));
            }
            last_output = result.text_content();
        }

        Ok(Task::completed(plan.final_answer.unwrap_or(last_output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sandbox::{ReplaySandbox, SandboxOptions};
    use serde_json::json;

    fn strategy() -> Strategy {
        Strategy::new("s", "1")
    }

    #[test]
    fn test_recorded_planner_falls_back_to_result() {
        let mut planner = RecordedPlanner::new(json!([{"tool": "git_status"}]), "all clean");
        let plan = planner.plan("in", &strategy()).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.final_answer.as_deref(), Some("all clean"));

        let mut planner = RecordedPlanner::new(json!({"steps": [], "final_answer": "own"}), "other");
        let plan = planner.plan("in", &strategy()).unwrap();
        assert_eq!(plan.final_answer.as_deref(), Some("own"));
    }

    #[tokio::test]
    async fn test_plan_executor_reports_final_answer() {
        let s = strategy();
        let mut planner = RecordedPlanner::new(
            json!([
                {"tool": "fs_write_file", "args": {"path": "/a", "content": "1"}},
                {"tool": "fs_read_file", "args": {"path": "/a"}}
            ]),
            "",
        );
        let mut sandbox = ReplaySandbox::new(vec![], SandboxOptions::default()).unwrap();
        let ctx = AgentContext {
            strategy: &s,
            planner: &mut planner,
            tools: &mut sandbox,
        };
        let task = PlanExecutor.run(ctx, "write then read").await.unwrap();
        assert!(task.succeeded());
        assert_eq!(task.result, "1");
    }

    #[tokio::test]
    async fn test_plan_executor_fails_on_error_result() {
        let s = strategy();
        let mut planner =
            RecordedPlanner::new(json!([{"tool": "fs_read_file", "args": {"path": "/nope"}}]), "x");
        let mut sandbox = ReplaySandbox::new(vec![], SandboxOptions::default()).unwrap();
        let ctx = AgentContext {
            strategy: &s,
            planner: &mut planner,
            tools: &mut sandbox,
        };
        let task = PlanExecutor.run(ctx, "read").await.unwrap();
        assert!(!task.succeeded());
        assert!(task.result.contains("ENOENT"));
    }

    #[tokio::test]
    async fn test_invalid_plan_is_runtime_error() {
        let s = strategy();
        let mut planner = RecordedPlanner::new(json!("not a plan"), "x");
        let mut sandbox = ReplaySandbox::new(vec![], SandboxOptions::default()).unwrap();
        let ctx = AgentContext {
            strategy: &s,
            planner: &mut planner,
            tools: &mut sandbox,
        };
        assert!(PlanExecutor.run(ctx, "in").await.is_err());
    }
}
