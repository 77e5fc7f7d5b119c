//! Router: shadow/canary traffic allocation and auto-promotion.
//!
//! Live requests go to the baseline unless shadow mode is on and a uniform
//! draw lands inside the configured traffic ratio; inside that slice the
//! candidate with the highest UCB bound over its trailing-window summary
//! wins. Promotion compares success rates with a pooled two-proportion
//! z-test.
//!
//! - [`shadow`]  : `ShadowRouter`, `RoutedStrategy`, `ShadowPromotionDecision`
//! - [`stats`]   : `ucb_score()`, `two_proportion_p_value()`, `normal_cdf()`
//! - [`sampler`] : `UniformSampler`, `SeededSampler`, `EntropySampler`

pub mod sampler;
pub mod shadow;
pub mod stats;

pub use sampler::{EntropySampler, SeededSampler, UniformSampler};
pub use shadow::{load_candidates, RouteRole, RoutedStrategy, ShadowPromotionDecision, ShadowRouter};
pub use stats::{normal_cdf, success_rate, two_proportion_p_value, two_proportion_z, ucb_score};
