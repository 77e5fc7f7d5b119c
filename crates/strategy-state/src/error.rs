//! Error types for strategy-state

use thiserror::Error;

/// Errors returned by the storage traits and their in-memory fakes.
#[derive(Error, Debug)]
pub enum StorageError {
    /// No episode with the given id exists.
    #[error("episode not found: {episode_id}")]
    EpisodeNotFound { episode_id: String },

    /// An episode with the given id was already recorded (episodes are append-only).
    #[error("episode already exists: {episode_id}")]
    DuplicateEpisode { episode_id: String },

    /// A trace was appended out of order.
    #[error(
        "trace step {step_index} for episode {episode_id} must be greater than {last_step_index}"
    )]
    TraceOutOfOrder {
        episode_id: String,
        step_index: u32,
        last_step_index: u32,
    },

    /// No promotion has ever been recorded for the slot.
    #[error("no promotion recorded for slot: {slot}")]
    PromotionNotFound { slot: String },

    /// Rollback requested with fewer than two promotions on record.
    #[error("no previous promotion to roll back to for slot: {slot}")]
    NoPreviousPromotion { slot: String },

    /// Backend failure (connection, lock poisoning, query error).
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Serialization failure.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
