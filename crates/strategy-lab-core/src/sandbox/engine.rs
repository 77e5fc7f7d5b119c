//! `ReplaySandbox`: the per-episode tool surface handed to an agent runtime.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strategy_state::{Trace, TraceStatus};

use super::alignment::{DriftEvent, TraceAligner};
use super::capability::{SandboxOptions, ToolCategory};
use super::error::{SandboxError, SandboxResult};
use super::result::ToolResult;
use super::shell::{self, ShellCommand};
use super::world::{GitCommand, VirtualWorld};
use crate::metrics::METRICS;
use crate::obs;
use crate::orchestrator::ToolExecutor;

/// Counters and drift log for one sandbox session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxMetrics {
    pub invocation_count: u32,
    pub risk_event_count: u32,
    pub human_interrupt_count: u32,
    pub drift: Vec<DriftEvent>,
}

impl SandboxMetrics {
    pub fn drift_detected(&self) -> bool {
        !self.drift.is_empty()
    }
}

/// Simulates fs/git/shell tools against a [`VirtualWorld`] and replays
/// everything else from the episode's recorded traces.
#[derive(Debug)]
pub struct ReplaySandbox {
    options: SandboxOptions,
    world: VirtualWorld,
    aligner: TraceAligner,
    metrics: SandboxMetrics,
}

fn str_arg<'a>(args: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| args.get(*k).and_then(Value::as_str))
}

fn usize_arg(args: &Value, keys: &[&str]) -> Option<usize> {
    keys.iter().find_map(|k| {
        let v = args.get(*k)?;
        v.as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
    })
}

fn bool_arg(args: &Value, keys: &[&str]) -> bool {
    keys.iter()
        .any(|k| args.get(*k).and_then(Value::as_bool).unwrap_or(false))
}

fn missing(tool: &str, arg: &str) -> ToolResult {
    ToolResult::error(format!("{tool}: missing required argument '{arg}'"))
}

impl ReplaySandbox {
    /// Seed a sandbox with an episode's traces, which must be ordered by
    /// strictly increasing `step_index`.
    pub fn new(traces: Vec<Trace>, options: SandboxOptions) -> SandboxResult<Self> {
        for pair in traces.windows(2) {
            if pair[1].step_index <= pair[0].step_index {
                return Err(SandboxError::TraceOutOfOrder {
                    step_index: pair[1].step_index,
                    previous: pair[0].step_index,
                });
            }
        }
        Ok(Self {
            world: VirtualWorld::new(&options.cwd),
            aligner: TraceAligner::new(traces),
            metrics: SandboxMetrics::default(),
            options,
        })
    }

    pub fn metrics(&self) -> &SandboxMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> SandboxMetrics {
        self.metrics
    }

    pub fn world(&self) -> &VirtualWorld {
        &self.world
    }

    /// Invoke a tool by name.
    ///
    /// Simulated categories always produce a `ToolResult` (failures are
    /// `is_error`). A replayed call with no trace left to align fails with
    /// [`SandboxError::ReplayExhausted`].
    pub fn call_tool(&mut self, name: &str, args: &Value) -> SandboxResult<ToolResult> {
        let call_index = self.metrics.invocation_count as usize;
        self.metrics.invocation_count += 1;
        METRICS.inc_tool_calls();
        if self.options.is_high_risk(name) {
            self.metrics.risk_event_count += 1;
        }
        if self.options.is_human_interrupt(name) {
            self.metrics.human_interrupt_count += 1;
        }

        let simulated = match self.options.category(name) {
            ToolCategory::FileSystem => Some(self.run_fs(name, args)),
            ToolCategory::Git => Some(self.run_git_tool(name, args)),
            ToolCategory::Shell => str_arg(args, &["command", "cmd"])
                .and_then(shell::parse)
                .map(|cmd| self.run_shell(&cmd)),
            ToolCategory::Replayed => None,
        };

        if let Some(result) = simulated {
            let alignment = self.aligner.align(call_index, name, args, false);
            self.record_drift(alignment.drift);
            return Ok(result);
        }

        let alignment = self.aligner.align(call_index, name, args, true);
        self.record_drift(alignment.drift);
        let trace = alignment
            .trace
            .and_then(|i| self.aligner.trace(i))
            .ok_or_else(|| SandboxError::ReplayExhausted {
                tool: name.to_string(),
                call_index,
            })?;

        let mut result = ToolResult::from_recorded(&trace.tool_output);
        if trace.status == TraceStatus::Failed {
            result.is_error = true;
        }
        Ok(result)
    }

    fn record_drift(&mut self, drift: Option<DriftEvent>) {
        if let Some(event) = drift {
            METRICS.inc_drift_events();
            obs::emit_drift(&event);
            self.metrics.drift.push(event);
        }
    }

    fn run_fs(&mut self, name: &str, args: &Value) -> ToolResult {
        let path = str_arg(args, &["path", "file_path", "filePath"]);
        match name {
            "fs_read_file" => match path {
                Some(p) => self.world.read_file(p),
                None => missing(name, "path"),
            },
            "fs_write_file" => match path {
                Some(p) => {
                    let content = str_arg(args, &["content", "text"]).unwrap_or("");
                    self.world.write_file(p, content)
                }
                None => missing(name, "path"),
            },
            "fs_list_directory" => {
                let target = path.unwrap_or(".").to_string();
                self.world.list_directory(&target)
            }
            "fs_create_directory" => match path {
                Some(p) => self.world.create_directory(p),
                None => missing(name, "path"),
            },
            "fs_delete_file" => match path {
                Some(p) => self.world.delete_file(p),
                None => missing(name, "path"),
            },
            "fs_move_file" => {
                let from = str_arg(args, &["source", "from", "source_path"]);
                let to = str_arg(args, &["destination", "to", "destination_path"]);
                match (from, to) {
                    (Some(from), Some(to)) => self.world.move_file(from, to),
                    (None, _) => missing(name, "source"),
                    (_, None) => missing(name, "destination"),
                }
            }
            other => ToolResult::error(format!("unknown filesystem tool: {other}")),
        }
    }

    fn run_git_tool(&mut self, name: &str, args: &Value) -> ToolResult {
        let command = match name {
            "git_status" => GitCommand::Status,
            "git_add" => {
                let specs = match args.get("paths").or_else(|| args.get("files")) {
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Some(Value::String(s)) => vec![s.clone()],
                    _ => str_arg(args, &["path"])
                        .map(|p| vec![p.to_string()])
                        .unwrap_or_default(),
                };
                GitCommand::Add(specs)
            }
            "git_commit" => GitCommand::Commit {
                message: str_arg(args, &["message", "msg"]).map(str::to_string),
            },
            "git_diff" => GitCommand::Diff {
                cached: bool_arg(args, &["cached", "staged"]),
            },
            "git_log" => GitCommand::Log {
                max_count: usize_arg(args, &["max_count", "maxCount", "n", "limit"]),
            },
            "git_push" => GitCommand::Push,
            other => return ToolResult::error(format!("unknown git tool: {other}")),
        };
        self.world.run_git(&command)
    }

    fn run_shell(&mut self, command: &ShellCommand) -> ToolResult {
        match command {
            ShellCommand::Pwd => ToolResult::text(self.world.cwd().to_string()),
            ShellCommand::List(target) => {
                let target = target.clone().unwrap_or_else(|| ".".to_string());
                self.world.list_directory(&target)
            }
            ShellCommand::Cat(target) => self.world.read_file(target),
            ShellCommand::Echo(text) => ToolResult::text(text.clone()),
            ShellCommand::Git(git) => self.world.run_git(git),
        }
    }
}

impl ToolExecutor for ReplaySandbox {
    fn call_tool(&mut self, name: &str, args: &Value) -> SandboxResult<ToolResult> {
        ReplaySandbox::call_tool(self, name, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use strategy_state::EpisodeId;

    fn trace(step: u32, tool: &str, args: Value, output: &str, status: TraceStatus) -> Trace {
        Trace {
            episode_id: EpisodeId::from("ep"),
            step_index: step,
            tool_name: tool.to_string(),
            tool_args: args,
            tool_output: output.to_string(),
            duration_ms: 5,
            status,
        }
    }

    fn empty() -> ReplaySandbox {
        ReplaySandbox::new(vec![], SandboxOptions::default()).unwrap()
    }

    #[test]
    fn test_rejects_out_of_order_traces() {
        let traces = vec![
            trace(1, "a", json!({}), "", TraceStatus::Success),
            trace(1, "b", json!({}), "", TraceStatus::Success),
        ];
        let err = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap_err();
        assert!(matches!(err, SandboxError::TraceOutOfOrder { step_index: 1, previous: 1 }));
    }

    #[test]
    fn test_replays_recorded_output() {
        let traces = vec![trace(
            0,
            "web_search",
            json!({"q": "rust"}),
            r#""top result""#,
            TraceStatus::Success,
        )];
        let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap();
        let r = sb.call_tool("web_search", &json!({"q": "rust"})).unwrap();
        assert_eq!(r.text_content(), "top result");
        assert!(!sb.metrics().drift_detected());
    }

    #[test]
    fn test_failed_trace_replays_as_error() {
        let traces = vec![trace(0, "fetch", json!({}), "timeout", TraceStatus::Failed)];
        let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap();
        let r = sb.call_tool("fetch", &json!({})).unwrap();
        assert!(r.is_error);
        assert_eq!(r.text_content(), "timeout");
    }

    #[test]
    fn test_exhausted_replay_errors() {
        let mut sb = empty();
        let err = sb.call_tool("web_search", &json!({})).unwrap_err();
        assert!(matches!(err, SandboxError::ReplayExhausted { call_index: 0, .. }));
    }

    #[test]
    fn test_fs_tools_simulated_without_traces() {
        let mut sb = empty();
        let w = sb
            .call_tool("fs_write_file", &json!({"path": "C:\\work\\a.txt", "content": "x"}))
            .unwrap();
        assert!(!w.is_error);
        let r = sb.call_tool("fs_read_file", &json!({"path": "/work/a.txt"})).unwrap();
        assert_eq!(r.text_content(), "x");
        // Advisory drift: no recorded fs traces at all.
        assert_eq!(sb.metrics().drift.len(), 2);
        assert_eq!(sb.metrics().invocation_count, 2);
    }

    #[test]
    fn test_simulated_call_matching_trace_has_no_drift() {
        let traces = vec![trace(
            0,
            "fs_write_file",
            json!({"path": "/a", "content": "1"}),
            "ok",
            TraceStatus::Success,
        )];
        let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap();
        sb.call_tool("fs_write_file", &json!({"content": "1", "path": "/a"}))
            .unwrap();
        assert!(!sb.metrics().drift_detected());
    }

    #[test]
    fn test_unknown_fs_tool_is_error_result() {
        let mut sb = empty();
        let r = sb.call_tool("fs_chmod", &json!({"path": "/a"})).unwrap();
        assert!(r.is_error);
    }

    #[test]
    fn test_git_tools_and_shell_share_world() {
        let mut sb = empty();
        sb.call_tool("fs_write_file", &json!({"path": "notes.md", "content": "hi"}))
            .unwrap();
        sb.call_tool("shell_execute", &json!({"command": "git add ."}))
            .unwrap();
        let c = sb
            .call_tool("git_commit", &json!({"message": "add notes"}))
            .unwrap();
        assert!(!c.is_error);
        let log = sb
            .call_tool("run_shell_command", &json!({"command": "git log -n 1"}))
            .unwrap();
        assert_eq!(log.text_content(), "0000001 add notes");
        let cat = sb
            .call_tool("execute_command", &json!({"command": "cat notes.md"}))
            .unwrap();
        assert_eq!(cat.text_content(), "hi");
    }

    #[test]
    fn test_unparsed_shell_falls_through_to_replay() {
        let traces = vec![trace(
            0,
            "shell_execute",
            json!({"command": "cargo test"}),
            "test result: ok",
            TraceStatus::Success,
        )];
        let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap();
        let r = sb
            .call_tool("shell_execute", &json!({"command": "cargo test"}))
            .unwrap();
        assert_eq!(r.text_content(), "test result: ok");
        assert!(sb.call_tool("shell_execute", &json!({"command": "make"})).is_err());
    }

    #[test]
    fn test_risk_and_human_interrupt_counts() {
        let traces = vec![trace(0, "ask_user", json!({}), "yes", TraceStatus::Success)];
        let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).unwrap();
        sb.call_tool("git_push", &json!({})).unwrap();
        sb.call_tool("fs_delete_file", &json!({"path": "/missing"}))
            .unwrap();
        sb.call_tool("ask_user", &json!({})).unwrap();
        let m = sb.metrics();
        assert_eq!(m.risk_event_count, 2);
        assert_eq!(m.human_interrupt_count, 1);
        assert_eq!(m.invocation_count, 3);
    }

    #[test]
    fn test_pwd_reports_cwd() {
        let mut sb = ReplaySandbox::new(vec![], SandboxOptions::default().with_cwd("/repo")).unwrap();
        let r = sb.call_tool("shell_execute", &json!({"command": "pwd"})).unwrap();
        assert_eq!(r.text_content(), "/repo");
    }
}
