//! Aligning live tool calls against the recorded trace sequence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strategy_state::Trace;

use crate::domain::canonical_json;

/// What diverged between a live call and its aligned trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftKind {
    Tool,
    Args,
}

impl std::fmt::Display for DriftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DriftKind::Tool => write!(f, "tool"),
            DriftKind::Args => write!(f, "args"),
        }
    }
}

/// A divergence between replayed behavior and history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftEvent {
    /// 0-based index of the live call.
    pub index: usize,
    /// Recorded tool name (for `tool`) or canonical args (for `args`).
    pub expected: Option<String>,
    pub actual: String,
    pub kind: DriftKind,
}

/// Outcome of aligning one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    /// Index into the trace list, if a trace was consumed.
    pub trace: Option<usize>,
    pub drift: Option<DriftEvent>,
}

/// Cursor-based matcher over an episode's ordered traces.
#[derive(Debug, Clone)]
pub struct TraceAligner {
    traces: Vec<Trace>,
    canonical_args: Vec<String>,
    cursor: usize,
}

impl TraceAligner {
    pub fn new(traces: Vec<Trace>) -> Self {
        let canonical_args = traces.iter().map(|t| canonical_json(&t.tool_args)).collect();
        Self {
            traces,
            canonical_args,
            cursor: 0,
        }
    }

    pub fn trace(&self, index: usize) -> Option<&Trace> {
        self.traces.get(index)
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn consume(&mut self, index: usize) -> Option<usize> {
        self.cursor = index + 1;
        Some(index)
    }

    /// Align call number `call_index` of `tool` with `args`.
    ///
    /// `sequential` enables the positional fallback used for replayed tools.
    /// Simulated tools pass `false`: an unmatched simulated call records a
    /// `tool` drift with no expected value and consumes nothing.
    pub fn align(&mut self, call_index: usize, tool: &str, args: &Value, sequential: bool) -> Alignment {
        let actual_args = canonical_json(args);
        let remaining = self.cursor..self.traces.len();

        if let Some(i) = remaining
            .clone()
            .find(|&i| self.traces[i].tool_name == tool && self.canonical_args[i] == actual_args)
        {
            return Alignment {
                trace: self.consume(i),
                drift: None,
            };
        }

        if let Some(i) = remaining.clone().find(|&i| self.traces[i].tool_name == tool) {
            let drift = DriftEvent {
                index: call_index,
                expected: Some(self.canonical_args[i].clone()),
                actual: actual_args,
                kind: DriftKind::Args,
            };
            return Alignment {
                trace: self.consume(i),
                drift: Some(drift),
            };
        }

        if !sequential {
            return Alignment {
                trace: None,
                drift: Some(DriftEvent {
                    index: call_index,
                    expected: None,
                    actual: tool.to_string(),
                    kind: DriftKind::Tool,
                }),
            };
        }

        let Some(i) = remaining.clone().next() else {
            return Alignment {
                trace: None,
                drift: None,
            };
        };
        // The same-tool pass failed, so the name at the cursor differs.
        let drift = DriftEvent {
            index: call_index,
            expected: Some(self.traces[i].tool_name.clone()),
            actual: tool.to_string(),
            kind: DriftKind::Tool,
        };
        Alignment {
            trace: self.consume(i),
            drift: Some(drift),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strategy_state::{EpisodeId, TraceStatus};

    fn trace(step: u32, tool: &str, args: Value) -> Trace {
        Trace {
            episode_id: EpisodeId::from("ep"),
            step_index: step,
            tool_name: tool.to_string(),
            tool_args: args,
            tool_output: String::new(),
            duration_ms: 1,
            status: TraceStatus::Success,
        }
    }

    #[test]
    fn test_exact_match_ignores_key_order() {
        let mut a = TraceAligner::new(vec![trace(0, "search", json!({"q": "x", "n": 1}))]);
        let got = a.align(0, "search", &json!({"n": 1, "q": "x"}), true);
        assert_eq!(got.trace, Some(0));
        assert!(got.drift.is_none());
        assert_eq!(a.cursor(), 1);
    }

    #[test]
    fn test_exact_match_skips_ahead() {
        let mut a = TraceAligner::new(vec![
            trace(0, "a", json!({})),
            trace(1, "b", json!({"k": 1})),
        ]);
        let got = a.align(0, "b", &json!({"k": 1}), true);
        assert_eq!(got.trace, Some(1));
        assert!(got.drift.is_none());
        // Skipped trace is never revisited.
        let got = a.align(1, "a", &json!({}), true);
        assert_eq!(got.trace, None);
    }

    #[test]
    fn test_same_tool_fallback_records_args_drift() {
        let mut a = TraceAligner::new(vec![trace(0, "search", json!({"q": "old"}))]);
        let got = a.align(0, "search", &json!({"q": "new"}), true);
        assert_eq!(got.trace, Some(0));
        let drift = got.drift.unwrap();
        assert_eq!(drift.kind, DriftKind::Args);
        assert_eq!(drift.expected.as_deref(), Some(r#"{"q":"old"}"#));
        assert_eq!(drift.actual, r#"{"q":"new"}"#);
    }

    #[test]
    fn test_sequential_fallback_records_tool_drift() {
        let mut a = TraceAligner::new(vec![trace(0, "search", json!({}))]);
        let got = a.align(0, "fetch", &json!({}), true);
        assert_eq!(got.trace, Some(0));
        let drift = got.drift.unwrap();
        assert_eq!(drift.kind, DriftKind::Tool);
        assert_eq!(drift.expected.as_deref(), Some("search"));
        assert_eq!(drift.actual, "fetch");
    }

    #[test]
    fn test_simulated_miss_is_advisory() {
        let mut a = TraceAligner::new(vec![trace(0, "search", json!({}))]);
        let got = a.align(0, "fs_read_file", &json!({"path": "/a"}), false);
        assert_eq!(got.trace, None);
        let drift = got.drift.unwrap();
        assert_eq!(drift.kind, DriftKind::Tool);
        assert_eq!(drift.expected, None);
        assert_eq!(a.cursor(), 0);
    }

    #[test]
    fn test_exhausted_returns_nothing() {
        let mut a = TraceAligner::new(vec![]);
        let got = a.align(0, "search", &json!({}), true);
        assert_eq!(got, Alignment { trace: None, drift: None });
    }
}
