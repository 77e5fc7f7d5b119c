//! Bandit and hypothesis-test arithmetic for the shadow router.

use strategy_state::EpisodeSummary;

/// `success / total`, 0 for an empty summary.
pub fn success_rate(summary: &EpisodeSummary) -> f64 {
    if summary.total == 0 {
        0.0
    } else {
        summary.success as f64 / summary.total as f64
    }
}

/// UCB1-style upper bound. Unsampled arms score `+inf` so they are explored
/// first.
pub fn ucb_score(success_rate: f64, samples: u64, n_candidates: usize) -> f64 {
    if samples == 0 {
        return f64::INFINITY;
    }
    let n = samples as f64;
    let total = n_candidates as f64 + n + 1.0;
    success_rate + (2.0 * total.ln() / n).sqrt()
}

/// Error function, Abramowitz & Stegun 7.1.26 (|error| < 1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254_829_592;
    const A2: f64 = -0.284_496_736;
    const A3: f64 = 1.421_413_741;
    const A4: f64 = -1.453_152_027;
    const A5: f64 = 1.061_405_429;
    const P: f64 = 0.327_591_1;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let poly = ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t;
    sign * (1.0 - poly * (-x * x).exp())
}

/// Standard normal CDF.
pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}

/// Pooled two-proportion z statistic for `b` vs. `a`.
///
/// `None` when either side is empty or the pooled variance is zero.
pub fn two_proportion_z(
    success_a: u64,
    total_a: u64,
    success_b: u64,
    total_b: u64,
) -> Option<f64> {
    if total_a == 0 || total_b == 0 {
        return None;
    }
    let (na, nb) = (total_a as f64, total_b as f64);
    let pa = success_a as f64 / na;
    let pb = success_b as f64 / nb;
    let pooled = (success_a + success_b) as f64 / (na + nb);
    let se = (pooled * (1.0 - pooled) * (1.0 / na + 1.0 / nb)).sqrt();
    if se == 0.0 || se.is_nan() {
        return None;
    }
    Some((pb - pa) / se)
}

/// Two-tailed p-value of the pooled two-proportion z-test; 1.0 when the
/// statistic is undefined.
pub fn two_proportion_p_value(success_a: u64, total_a: u64, success_b: u64, total_b: u64) -> f64 {
    match two_proportion_z(success_a, total_a, success_b, total_b) {
        Some(z) => (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0),
        None => 1.0,
    }
}
