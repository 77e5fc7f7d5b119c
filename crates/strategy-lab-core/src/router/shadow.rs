//! `ShadowRouter`: live traffic split and statistically gated promotion.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use strategy_state::{
    EpisodeStore, EpisodeSummary, PromotionMetadata, PromotionRecord, PromotionRegistry,
    StrategyRef, SummaryWindow,
};
use tokio::sync::RwLock;
use tracing::warn;

use super::sampler::{EntropySampler, UniformSampler};
use super::stats::{success_rate, two_proportion_p_value, ucb_score};
use crate::config::ShadowConfig;
use crate::domain::{Result, Strategy};
use crate::metrics::METRICS;
use crate::obs;

/// Which side of the split served a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteRole {
    Baseline,
    Candidate,
}

impl std::fmt::Display for RouteRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteRole::Baseline => write!(f, "baseline"),
            RouteRole::Candidate => write!(f, "candidate"),
        }
    }
}

/// Per-request routing decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedStrategy {
    pub strategy: Strategy,
    pub role: RouteRole,
    pub reason: String,
    /// The uniform draw, when one was taken.
    pub draw: Option<f64>,
    /// Winning UCB score, for candidate routes.
    pub ucb_score: Option<f64>,
}

/// An eligible candidate and the evidence behind promoting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowPromotionDecision {
    pub candidate: Strategy,
    pub baseline: StrategyRef,
    pub improvement: f64,
    pub p_value: f64,
    pub baseline_summary: EpisodeSummary,
    pub candidate_summary: EpisodeSummary,
}

struct RouterState {
    baseline: Strategy,
    candidates: Vec<Strategy>,
}

/// Read candidate strategies from `paths`; unreadable or invalid documents
/// are logged and skipped.
pub async fn load_candidates<P: AsRef<Path>>(paths: &[P]) -> Vec<Strategy> {
    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        match Strategy::load(path).await {
            Ok(strategy) => loaded.push(strategy),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping candidate strategy"),
        }
    }
    loaded
}

/// Splits live traffic between a baseline and shadow candidates and decides
/// when a candidate has earned promotion.
pub struct ShadowRouter {
    store: Arc<dyn EpisodeStore>,
    sampler: Box<dyn UniformSampler>,
    state: RwLock<RouterState>,
}

impl ShadowRouter {
    pub fn new(store: Arc<dyn EpisodeStore>, baseline: Strategy) -> Self {
        Self {
            store,
            sampler: Box::new(EntropySampler::new()),
            state: RwLock::new(RouterState {
                baseline,
                candidates: Vec::new(),
            }),
        }
    }

    pub fn with_sampler(mut self, sampler: Box<dyn UniformSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    pub async fn baseline(&self) -> Strategy {
        self.state.read().await.baseline.clone()
    }

    pub async fn candidates(&self) -> Vec<Strategy> {
        self.state.read().await.candidates.clone()
    }

    /// Replace the candidate set. Entries equal to the baseline are dropped.
    pub async fn set_candidates(&self, candidates: Vec<Strategy>) {
        let mut state = self.state.write().await;
        let baseline = state.baseline.reference();
        state.candidates = candidates
            .into_iter()
            .filter(|c| c.reference() != baseline)
            .collect();
    }

    /// Reload candidates from `config.shadow_candidate_paths`; returns how
    /// many loaded.
    pub async fn refresh_candidates(&self, config: &ShadowConfig) -> usize {
        let loaded = load_candidates(&config.shadow_candidate_paths).await;
        self.set_candidates(loaded).await;
        self.state.read().await.candidates.len()
    }

    fn window(config: &ShadowConfig) -> SummaryWindow {
        SummaryWindow {
            since_ms: config.window_start_ms(Utc::now().timestamp_millis()),
            limit: config.shadow_sample_limit,
        }
    }

    async fn summary(&self, strategy: &Strategy, window: SummaryWindow) -> Result<EpisodeSummary> {
        Ok(self
            .store
            .summarize_episodes_by_strategy(strategy.id(), strategy.version(), window)
            .await?)
    }

    fn routed(
        strategy: Strategy,
        role: RouteRole,
        reason: &str,
        draw: Option<f64>,
        ucb_score: Option<f64>,
    ) -> RoutedStrategy {
        obs::emit_router_selected(&strategy.reference().to_string(), &role.to_string(), reason);
        RoutedStrategy {
            strategy,
            role,
            reason: reason.to_string(),
            draw,
            ucb_score,
        }
    }

    /// Pick the strategy for one live request.
    ///
    /// A candidate whose summary cannot be read does not qualify.
    pub async fn select_strategy(&self, config: &ShadowConfig) -> RoutedStrategy {
        let state = self.state.read().await;
        let baseline = state.baseline.clone();

        if !config.shadow_mode_enabled {
            return Self::routed(baseline, RouteRole::Baseline, "shadow mode disabled", None, None);
        }
        if state.candidates.is_empty() {
            return Self::routed(baseline, RouteRole::Baseline, "no candidates", None, None);
        }

        let draw = self.sampler.sample();
        if draw > config.shadow_traffic_ratio || config.shadow_traffic_ratio <= 0.0 {
            return Self::routed(baseline, RouteRole::Baseline, "outside shadow slice", Some(draw), None);
        }

        let window = Self::window(config);
        let n_candidates = state.candidates.len();
        let mut best: Option<(&Strategy, f64)> = None;
        for candidate in &state.candidates {
            let summary = match self.summary(candidate, window).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!(candidate = %candidate.reference(), error = %e, "candidate summary unavailable");
                    continue;
                }
            };
            let score = ucb_score(success_rate(&summary), summary.total, n_candidates);
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }

        match best {
            Some((candidate, score)) => Self::routed(
                candidate.clone(),
                RouteRole::Candidate,
                "shadow slice, highest ucb",
                Some(draw),
                Some(score),
            ),
            None => Self::routed(
                baseline,
                RouteRole::Baseline,
                "no candidate qualified",
                Some(draw),
                None,
            ),
        }
    }

    /// Find the candidate that has earned promotion, if any.
    ///
    /// Both sides need `auto_promote_min_tasks` samples. A candidate is
    /// eligible when its success-rate gain reaches
    /// `auto_promote_min_improvement`, the two-proportion test is significant
    /// at `auto_promote_confidence`, and its mean duration is at most 10%
    /// above the baseline's. The largest gain wins.
    pub async fn evaluate_auto_promotion(
        &self,
        config: &ShadowConfig,
    ) -> Result<Option<ShadowPromotionDecision>> {
        if !config.auto_promote_enabled {
            return Ok(None);
        }
        let state = self.state.read().await;
        let window = Self::window(config);
        let base = self.summary(&state.baseline, window).await?;
        if base.total < config.auto_promote_min_tasks {
            return Ok(None);
        }
        let base_rate = success_rate(&base);
        let alpha = 1.0 - config.auto_promote_confidence;

        let mut best: Option<ShadowPromotionDecision> = None;
        for candidate in &state.candidates {
            let summary = self.summary(candidate, window).await?;
            if summary.total < config.auto_promote_min_tasks {
                continue;
            }
            let improvement = success_rate(&summary) - base_rate;
            let p_value =
                two_proportion_p_value(base.success, base.total, summary.success, summary.total);
            let eligible = improvement >= config.auto_promote_min_improvement
                && p_value <= alpha
                && summary.avg_duration_ms <= 1.1 * base.avg_duration_ms;
            obs::emit_promotion_evaluated(
                &candidate.reference().to_string(),
                improvement,
                p_value,
                eligible,
            );
            if eligible && best.as_ref().map_or(true, |b| improvement > b.improvement) {
                best = Some(ShadowPromotionDecision {
                    candidate: candidate.clone(),
                    baseline: state.baseline.reference(),
                    improvement,
                    p_value,
                    baseline_summary: base,
                    candidate_summary: summary,
                });
            }
        }

        if best.is_some() {
            METRICS.inc_promotions();
        }
        Ok(best)
    }

    /// Record `decision` in `registry` under `slot` and make the candidate
    /// this router's baseline.
    pub async fn apply_promotion(
        &self,
        decision: &ShadowPromotionDecision,
        registry: &dyn PromotionRegistry,
        slot: &str,
    ) -> Result<PromotionRecord> {
        let metadata = PromotionMetadata {
            promoted_by: "auto-promotion".to_string(),
            improvement: Some(decision.improvement),
            p_value: Some(decision.p_value),
            notes: Some(format!("replaces {}", decision.baseline)),
        };
        let record = registry
            .promote(slot, &decision.candidate.reference(), metadata)
            .await?;

        let mut state = self.state.write().await;
        let promoted = decision.candidate.reference();
        state.candidates.retain(|c| c.reference() != promoted);
        state.baseline = decision.candidate.clone();
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::SeededSampler;
    use strategy_state::MemoryEpisodeStore;

    struct Fixed(f64);

    impl UniformSampler for Fixed {
        fn sample(&self) -> f64 {
            self.0
        }
    }

    fn router(draw: f64) -> ShadowRouter {
        ShadowRouter::new(Arc::new(MemoryEpisodeStore::new()), Strategy::new("base", "1"))
            .with_sampler(Box::new(Fixed(draw)))
    }

    fn shadow_on(ratio: f64) -> ShadowConfig {
        ShadowConfig {
            shadow_mode_enabled: true,
            shadow_traffic_ratio: ratio,
            ..ShadowConfig::default()
        }
    }

    #[tokio::test]
    async fn test_disabled_routes_baseline() {
        let r = router(0.0);
        r.set_candidates(vec![Strategy::new("cand", "1")]).await;
        let routed = r.select_strategy(&ShadowConfig::default()).await;
        assert_eq!(routed.role, RouteRole::Baseline);
        assert_eq!(routed.draw, None);
    }

    #[tokio::test]
    async fn test_no_candidates_routes_baseline() {
        let routed = router(0.0).select_strategy(&shadow_on(1.0)).await;
        assert_eq!(routed.role, RouteRole::Baseline);
        assert_eq!(routed.reason, "no candidates");
    }

    #[tokio::test]
    async fn test_draw_above_ratio_routes_baseline() {
        let r = router(0.5);
        r.set_candidates(vec![Strategy::new("cand", "1")]).await;
        let routed = r.select_strategy(&shadow_on(0.2)).await;
        assert_eq!(routed.role, RouteRole::Baseline);
        assert_eq!(routed.draw, Some(0.5));
    }

    #[tokio::test]
    async fn test_shadow_slice_routes_candidate() {
        let r = router(0.1);
        r.set_candidates(vec![Strategy::new("cand", "1")]).await;
        let routed = r.select_strategy(&shadow_on(0.2)).await;
        assert_eq!(routed.role, RouteRole::Candidate);
        assert_eq!(routed.strategy.id(), "cand");
        assert_eq!(routed.ucb_score, Some(f64::INFINITY));
    }

    #[tokio::test]
    async fn test_baseline_is_not_its_own_candidate() {
        let r = router(0.0);
        r.set_candidates(vec![Strategy::new("base", "1")]).await;
        assert!(r.candidates().await.is_empty());
    }

    #[tokio::test]
    async fn test_disabled_auto_promotion_is_none() {
        let r = router(0.0).with_sampler(Box::new(SeededSampler::new(1)));
        assert!(r
            .evaluate_auto_promotion(&ShadowConfig::default())
            .await
            .unwrap()
            .is_none());
    }
}
