//! Strategy-State: storage contracts for the strategy lab
//!
//! This crate defines the persistence seams the replay and routing core
//! reads from. Real deployments back them with their own episode database;
//! the in-memory fakes serve tests and embedders.
//!
//! ## Layer 0 - Data/Persistence
//!
//! ## Key Components
//!
//! - `EpisodeStore`: episodes, ordered traces, per-strategy summaries
//! - `PromotionRegistry`: append-only baseline promotion history
//! - `fakes`: `MemoryEpisodeStore`, `MemoryPromotionRegistry`

mod error;
pub mod fakes;
pub mod storage_traits;

pub use error::StorageError;
pub use fakes::{MemoryEpisodeStore, MemoryPromotionRegistry};
pub use storage_traits::{
    Episode, EpisodeId, EpisodeStatus, EpisodeStore, EpisodeSummary, PromotionMetadata,
    PromotionRecord, PromotionRegistry, StorageResult, StrategyRef, SummaryWindow, Trace,
    TraceStatus,
};
