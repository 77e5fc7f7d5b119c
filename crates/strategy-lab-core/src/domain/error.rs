//! Domain-level error taxonomy for the strategy lab.

use strategy_state::StorageError;

use crate::config::ConfigError;
use crate::sandbox::SandboxError;

/// Strategy lab domain errors.
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    #[error("invalid strategy: {0}")]
    InvalidStrategy(String),

    #[error("invalid plan: {0}")]
    InvalidPlan(String),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("sandbox error: {0}")]
    Sandbox(#[from] SandboxError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for strategy lab operations.
pub type Result<T> = std::result::Result<T, LabError>;
