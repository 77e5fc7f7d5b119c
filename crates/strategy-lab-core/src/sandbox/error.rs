//! Error types for the sandbox module.

/// Errors produced by the replay sandbox.
///
/// Simulated fs/git/shell failures are *not* errors: they come back as
/// `ToolResult`s with `is_error` set, the way a live tool reports them.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("replay exhausted: no recorded trace satisfies call #{call_index} to {tool}")]
    ReplayExhausted { tool: String, call_index: usize },

    #[error("trace step_index {step_index} does not follow {previous}; traces must be strictly increasing")]
    TraceOutOfOrder { step_index: u32, previous: u32 },
}

/// Result type for sandbox operations.
pub type SandboxResult<T> = std::result::Result<T, SandboxError>;
