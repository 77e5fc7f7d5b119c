//! In-memory fakes for storage traits (testing and embedding)
//!
//! Provides `MemoryEpisodeStore` and `MemoryPromotionRegistry` that satisfy
//! the trait contracts without any external dependencies.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

fn lock<T>(mutex: &Mutex<T>) -> StorageResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StorageError::Backend("in-memory store lock poisoned".to_string()))
}

// ---------------------------------------------------------------------------
// MemoryEpisodeStore
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct EpisodeState {
    episode: Episode,
    traces: Vec<Trace>,
}

/// In-memory episode store backed by a `HashMap<EpisodeId, EpisodeState>`.
#[derive(Debug, Default)]
pub struct MemoryEpisodeStore {
    episodes: Mutex<HashMap<String, EpisodeState>>,
}

impl MemoryEpisodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new episode. Episodes are append-only, so re-inserting an
    /// existing id fails.
    pub fn insert_episode(&self, episode: Episode) -> StorageResult<()> {
        let mut episodes = lock(&self.episodes)?;
        if episodes.contains_key(&episode.id.0) {
            return Err(StorageError::DuplicateEpisode {
                episode_id: episode.id.0.clone(),
            });
        }
        episodes.insert(
            episode.id.0.clone(),
            EpisodeState {
                episode,
                traces: Vec::new(),
            },
        );
        Ok(())
    }

    /// Append a trace to a recorded episode. `step_index` must be strictly
    /// greater than the last appended trace's.
    pub fn append_trace(&self, trace: Trace) -> StorageResult<()> {
        let mut episodes = lock(&self.episodes)?;
        let state =
            episodes
                .get_mut(&trace.episode_id.0)
                .ok_or_else(|| StorageError::EpisodeNotFound {
                    episode_id: trace.episode_id.0.clone(),
                })?;
        if let Some(last) = state.traces.last() {
            if trace.step_index <= last.step_index {
                return Err(StorageError::TraceOutOfOrder {
                    episode_id: trace.episode_id.0.clone(),
                    step_index: trace.step_index,
                    last_step_index: last.step_index,
                });
            }
        }
        state.traces.push(trace);
        Ok(())
    }

    /// Number of recorded episodes.
    pub fn len(&self) -> usize {
        self.episodes.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EpisodeStore for MemoryEpisodeStore {
    async fn get_episode(&self, id: &EpisodeId) -> StorageResult<Episode> {
        let episodes = lock(&self.episodes)?;
        episodes
            .get(&id.0)
            .map(|s| s.episode.clone())
            .ok_or_else(|| StorageError::EpisodeNotFound {
                episode_id: id.0.clone(),
            })
    }

    async fn get_traces(&self, episode_id: &EpisodeId) -> StorageResult<Vec<Trace>> {
        let episodes = lock(&self.episodes)?;
        let state = episodes
            .get(&episode_id.0)
            .ok_or_else(|| StorageError::EpisodeNotFound {
                episode_id: episode_id.0.clone(),
            })?;
        let mut traces = state.traces.clone();
        traces.sort_by_key(|t| t.step_index);
        Ok(traces)
    }

    async fn summarize_episodes_by_strategy(
        &self,
        strategy_id: &str,
        strategy_version: &str,
        window: SummaryWindow,
    ) -> StorageResult<EpisodeSummary> {
        let episodes = lock(&self.episodes)?;
        let mut matching: Vec<&Episode> = episodes
            .values()
            .map(|s| &s.episode)
            .filter(|e| {
                e.strategy_id == strategy_id
                    && e.strategy_version == strategy_version
                    && e.created_at.timestamp_millis() >= window.since_ms
            })
            .collect();

        // Newest first, id as tiebreak so the limit cut is deterministic.
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        matching.truncate(window.limit);

        let total = matching.len() as u64;
        let success = matching
            .iter()
            .filter(|e| e.status == EpisodeStatus::Success)
            .count() as u64;
        let avg_duration_ms = if total == 0 {
            0.0
        } else {
            matching.iter().map(|e| e.duration_ms as f64).sum::<f64>() / total as f64
        };

        Ok(EpisodeSummary {
            total,
            success,
            failure: total - success,
            avg_duration_ms,
        })
    }
}

// ---------------------------------------------------------------------------
// MemoryPromotionRegistry
// ---------------------------------------------------------------------------

/// In-memory promotion registry backed by a `HashMap<slot, Vec<PromotionRecord>>`.
///
/// Each slot maps to its full promotion history (newest last internally).
#[derive(Debug, Default)]
pub struct MemoryPromotionRegistry {
    promotions: Mutex<HashMap<String, Vec<PromotionRecord>>>,
}

impl MemoryPromotionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PromotionRegistry for MemoryPromotionRegistry {
    async fn promote(
        &self,
        slot: &str,
        strategy: &StrategyRef,
        metadata: PromotionMetadata,
    ) -> StorageResult<PromotionRecord> {
        let record = PromotionRecord {
            slot: slot.to_string(),
            strategy: strategy.clone(),
            metadata,
            created_at: Utc::now(),
        };
        let mut promotions = lock(&self.promotions)?;
        promotions
            .entry(slot.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn rollback(&self, slot: &str) -> StorageResult<PromotionRecord> {
        let mut promotions = lock(&self.promotions)?;
        let history =
            promotions
                .get_mut(slot)
                .ok_or_else(|| StorageError::PromotionNotFound {
                    slot: slot.to_string(),
                })?;
        if history.len() < 2 {
            return Err(StorageError::NoPreviousPromotion {
                slot: slot.to_string(),
            });
        }
        // Append-only: re-append the previous baseline as a new entry.
        let previous = history[history.len() - 2].clone();
        history.push(previous.clone());
        Ok(previous)
    }

    async fn current(&self, slot: &str) -> StorageResult<Option<PromotionRecord>> {
        let promotions = lock(&self.promotions)?;
        Ok(promotions.get(slot).and_then(|h| h.last().cloned()))
    }

    async fn history(&self, slot: &str) -> StorageResult<Vec<PromotionRecord>> {
        let promotions = lock(&self.promotions)?;
        let mut history = promotions.get(slot).cloned().unwrap_or_default();
        history.reverse();
        Ok(history)
    }
}
