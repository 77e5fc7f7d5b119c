//! Orchestrator: wires a sandbox, a recorded plan and an agent runtime into
//! one scored replay per episode.
//!
//! - [`runtime`] : `AgentRuntime`, `AgentContext`, `ToolExecutor`, `Planner`,
//!   `RecordedPlanner`, `PlanExecutor`
//! - [`replay`]  : `ReplayOrchestrator`

pub mod replay;
pub mod runtime;

pub use replay::ReplayOrchestrator;
pub use runtime::{AgentContext, AgentRuntime, PlanExecutor, Planner, RecordedPlanner, ToolExecutor};
