//! Shadow routing and auto-promotion configuration.
//!
//! Configuration arrives either as a JSON document (camelCase keys, every
//! field optional) or from the process environment. Both paths end in
//! [`ShadowConfig::validate`].

use serde::{Deserialize, Serialize};

/// Errors produced while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("malformed configuration document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Shadow/canary routing and auto-promotion settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShadowConfig {
    /// Route a slice of live traffic to candidate strategies.
    pub shadow_mode_enabled: bool,
    /// Fraction of requests (0–1) eligible for candidates.
    pub shadow_traffic_ratio: f64,
    /// Trailing window, in days, for per-strategy episode summaries.
    pub shadow_window_days: u32,
    /// Maximum number of episodes a summary may count.
    pub shadow_sample_limit: usize,
    /// Where candidate strategy documents live.
    pub shadow_candidate_paths: Vec<String>,
    /// Allow statistically gated promotion of a candidate to baseline.
    pub auto_promote_enabled: bool,
    /// Minimum samples for both baseline and candidate.
    pub auto_promote_min_tasks: u64,
    /// Minimum success-rate gain (0–1).
    pub auto_promote_min_improvement: f64,
    /// Confidence level (0–1); the p-value must not exceed `1 - confidence`.
    pub auto_promote_confidence: f64,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            shadow_mode_enabled: false,
            shadow_traffic_ratio: 0.1,
            shadow_window_days: 7,
            shadow_sample_limit: 500,
            shadow_candidate_paths: Vec::new(),
            auto_promote_enabled: false,
            auto_promote_min_tasks: 30,
            auto_promote_min_improvement: 0.05,
            auto_promote_confidence: 0.95,
        }
    }
}

const MS_PER_DAY: i64 = 86_400_000;

impl ShadowConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: ShadowConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from the environment.
    ///
    /// Reads (all optional, defaults from [`ShadowConfig::default`]):
    /// - SHADOW_MODE_ENABLED
    /// - SHADOW_TRAFFIC_RATIO
    /// - SHADOW_WINDOW_DAYS
    /// - SHADOW_SAMPLE_LIMIT
    /// - SHADOW_CANDIDATE_PATHS (comma separated)
    /// - AUTO_PROMOTE_ENABLED
    /// - AUTO_PROMOTE_MIN_TASKS
    /// - AUTO_PROMOTE_MIN_IMPROVEMENT
    /// - AUTO_PROMOTE_CONFIDENCE
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ShadowConfig::from_env`] but with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SHADOW_MODE_ENABLED") {
            config.shadow_mode_enabled = parse_bool("SHADOW_MODE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("SHADOW_TRAFFIC_RATIO") {
            config.shadow_traffic_ratio = parse_value("SHADOW_TRAFFIC_RATIO", &v)?;
        }
        if let Some(v) = lookup("SHADOW_WINDOW_DAYS") {
            config.shadow_window_days = parse_value("SHADOW_WINDOW_DAYS", &v)?;
        }
        if let Some(v) = lookup("SHADOW_SAMPLE_LIMIT") {
            config.shadow_sample_limit = parse_value("SHADOW_SAMPLE_LIMIT", &v)?;
        }
        if let Some(v) = lookup("SHADOW_CANDIDATE_PATHS") {
            config.shadow_candidate_paths = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = lookup("AUTO_PROMOTE_ENABLED") {
            config.auto_promote_enabled = parse_bool("AUTO_PROMOTE_ENABLED", &v)?;
        }
        if let Some(v) = lookup("AUTO_PROMOTE_MIN_TASKS") {
            config.auto_promote_min_tasks = parse_value("AUTO_PROMOTE_MIN_TASKS", &v)?;
        }
        if let Some(v) = lookup("AUTO_PROMOTE_MIN_IMPROVEMENT") {
            config.auto_promote_min_improvement =
                parse_value("AUTO_PROMOTE_MIN_IMPROVEMENT", &v)?;
        }
        if let Some(v) = lookup("AUTO_PROMOTE_CONFIDENCE") {
            config.auto_promote_confidence = parse_value("AUTO_PROMOTE_CONFIDENCE", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check ranges: ratios in [0, 1], window and sample limit non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("shadowTrafficRatio", self.shadow_traffic_ratio)?;
        check_unit(
            "autoPromoteMinImprovement",
            self.auto_promote_min_improvement,
        )?;
        check_unit("autoPromoteConfidence", self.auto_promote_confidence)?;
        if self.shadow_window_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "shadowWindowDays".to_string(),
                value: "0".to_string(),
                reason: "window must cover at least one day".to_string(),
            });
        }
        if self.shadow_sample_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "shadowSampleLimit".to_string(),
                value: "0".to_string(),
                reason: "sample limit must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Start of the trailing summary window, as unix epoch milliseconds.
    pub fn window_start_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(i64::from(self.shadow_window_days) * MS_PER_DAY)
    }
}

fn check_unit(key: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "must be within [0, 1]".to_string(),
        })
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = ShadowConfig::default();
        cfg.validate().expect("defaults validate");
        assert!(!cfg.shadow_mode_enabled);
        assert!(!cfg.auto_promote_enabled);
        assert_eq!(cfg.auto_promote_confidence, 0.95);
    }

    #[test]
    fn test_json_uses_camel_case_and_partial_documents() {
        let cfg = ShadowConfig::from_json_str(
            r#"{"shadowModeEnabled":true,"shadowTrafficRatio":0.25,"shadowCandidatePaths":["a.json"]}"#,
        )
        .expect("parse");
        assert!(cfg.shadow_mode_enabled);
        assert_eq!(cfg.shadow_traffic_ratio, 0.25);
        assert_eq!(cfg.shadow_candidate_paths, vec!["a.json"]);
        assert_eq!(cfg.shadow_window_days, 7);
    }

    #[test]
    fn test_out_of_range_ratio_rejected() {
        let err = ShadowConfig::from_json_str(r#"{"shadowTrafficRatio":1.5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "shadowTrafficRatio"));
    }

    #[test]
    fn test_from_lookup_reads_all_keys() {
        let env: HashMap<&str, &str> = [
            ("SHADOW_MODE_ENABLED", "true"),
            ("SHADOW_TRAFFIC_RATIO", "0.2"),
            ("SHADOW_WINDOW_DAYS", "14"),
            ("SHADOW_SAMPLE_LIMIT", "200"),
            ("SHADOW_CANDIDATE_PATHS", "a.json, b.json,,"),
            ("AUTO_PROMOTE_ENABLED", "1"),
            ("AUTO_PROMOTE_MIN_TASKS", "50"),
            ("AUTO_PROMOTE_MIN_IMPROVEMENT", "0.03"),
            ("AUTO_PROMOTE_CONFIDENCE", "0.99"),
        ]
        .into_iter()
        .collect();

        let cfg = ShadowConfig::from_lookup(|k| env.get(k).map(|v| v.to_string())).unwrap();
        assert!(cfg.shadow_mode_enabled);
        assert_eq!(cfg.shadow_traffic_ratio, 0.2);
        assert_eq!(cfg.shadow_window_days, 14);
        assert_eq!(cfg.shadow_sample_limit, 200);
        assert_eq!(cfg.shadow_candidate_paths, vec!["a.json", "b.json"]);
        assert!(cfg.auto_promote_enabled);
        assert_eq!(cfg.auto_promote_min_tasks, 50);
        assert_eq!(cfg.auto_promote_min_improvement, 0.03);
        assert_eq!(cfg.auto_promote_confidence, 0.99);
    }

    #[test]
    fn test_from_lookup_rejects_garbage() {
        let err = ShadowConfig::from_lookup(|k| {
            (k == "AUTO_PROMOTE_MIN_TASKS").then(|| "many".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("AUTO_PROMOTE_MIN_TASKS"));

        let err =
            ShadowConfig::from_lookup(|k| (k == "SHADOW_MODE_ENABLED").then(|| "maybe".into()))
                .unwrap_err();
        assert!(err.to_string().contains("expected a boolean"));
    }

    #[test]
    fn test_window_start() {
        let cfg = ShadowConfig {
            shadow_window_days: 2,
            ..ShadowConfig::default()
        };
        assert_eq!(cfg.window_start_ms(3 * MS_PER_DAY), MS_PER_DAY);
    }
}
