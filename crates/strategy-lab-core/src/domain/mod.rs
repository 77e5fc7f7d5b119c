//! Domain models for the strategy lab.
//!
//! Canonical definitions for the core entities:
//! - `Strategy`: the policy/prompt/constraint bundle an agent runs under
//! - `Task` / `Plan`: what an agent runtime consumes and produces
//! - `canonical_json`: order-insensitive argument stringification

pub mod canonical;
pub mod error;
pub mod strategy;
pub mod task;

pub use canonical::canonical_json;
pub use error::{LabError, Result};
pub use strategy::{Strategy, StrategyMetadata};
pub use task::{Plan, PlanStep, Task, TaskStatus};
