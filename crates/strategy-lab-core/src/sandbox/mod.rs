//! Sandbox: deterministic replay of an episode's tool calls.
//!
//! File-system, git and simple shell tools run against an in-memory world;
//! every other tool returns the output recorded in the episode's traces.
//! Divergence from the recorded call sequence is logged as drift, which is a
//! scoring signal and never blocks a call.
//!
//! # Modules
//!
//! - [`capability`] : `ToolCategory` + `SandboxOptions` (risk/interrupt sets)
//! - [`path`]       : normalization into one posix namespace
//! - [`world`]      : `VirtualWorld` file map and git model
//! - [`shell`]      : the simulated shell grammar
//! - [`alignment`]  : `TraceAligner`, `DriftEvent`
//! - [`engine`]     : `ReplaySandbox::call_tool()`, `SandboxMetrics`
//! - [`result`]     : `ToolResult` envelope
//! - [`error`]      : `SandboxError` / `SandboxResult`

pub mod alignment;
pub mod capability;
pub mod engine;
pub mod error;
pub mod path;
pub mod result;
pub mod shell;
pub mod world;

pub use alignment::{DriftEvent, DriftKind, TraceAligner};
pub use capability::{SandboxOptions, ToolCategory};
pub use engine::{ReplaySandbox, SandboxMetrics};
pub use error::{SandboxError, SandboxResult};
pub use result::{ToolContent, ToolResult};
pub use shell::ShellCommand;
pub use world::{Commit, GitCommand, GitStatus, VirtualWorld};
