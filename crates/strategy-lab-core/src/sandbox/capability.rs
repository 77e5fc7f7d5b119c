//! Tool categories and the per-session options that classify tool names.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// How the sandbox treats a tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// `fs_*`, simulated against the virtual file map.
    FileSystem,
    /// `git_*`, simulated against the virtual git model.
    Git,
    /// Shell execution; simulated when the command is in the known grammar.
    Shell,
    /// Everything else; replayed from traces.
    Replayed,
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolCategory::FileSystem => write!(f, "file_system"),
            ToolCategory::Git => write!(f, "git"),
            ToolCategory::Shell => write!(f, "shell"),
            ToolCategory::Replayed => write!(f, "replayed"),
        }
    }
}

/// Per-session sandbox options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxOptions {
    /// Working directory used for relative paths, `pwd` and bare `ls`.
    pub cwd: String,
    /// Tool names that execute shell commands.
    pub shell_tools: BTreeSet<String>,
    /// Tool names counted as risk events.
    pub high_risk_tools: BTreeSet<String>,
    /// Tool names counted as human interrupts.
    pub human_interrupt_tools: BTreeSet<String>,
}

fn names(list: &[&str]) -> BTreeSet<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for SandboxOptions {
    fn default() -> Self {
        Self {
            cwd: "/".to_string(),
            shell_tools: names(&["shell_execute", "run_shell_command", "execute_command"]),
            high_risk_tools: names(&[
                "shell_execute",
                "run_shell_command",
                "execute_command",
                "fs_delete_file",
                "fs_move_file",
                "git_push",
            ]),
            human_interrupt_tools: names(&["ask_user"]),
        }
    }
}

impl SandboxOptions {
    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = cwd.into();
        self
    }

    pub fn category(&self, tool_name: &str) -> ToolCategory {
        if tool_name.starts_with("fs_") {
            ToolCategory::FileSystem
        } else if tool_name.starts_with("git_") {
            ToolCategory::Git
        } else if self.shell_tools.contains(tool_name) {
            ToolCategory::Shell
        } else {
            ToolCategory::Replayed
        }
    }

    pub fn is_high_risk(&self, tool_name: &str) -> bool {
        self.high_risk_tools.contains(tool_name)
    }

    pub fn is_human_interrupt(&self, tool_name: &str) -> bool {
        self.human_interrupt_tools.contains(tool_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_by_prefix() {
        let opts = SandboxOptions::default();
        assert_eq!(opts.category("fs_read_file"), ToolCategory::FileSystem);
        assert_eq!(opts.category("git_commit"), ToolCategory::Git);
        assert_eq!(opts.category("shell_execute"), ToolCategory::Shell);
        assert_eq!(opts.category("web_search"), ToolCategory::Replayed);
        assert_eq!(opts.category("ask_user"), ToolCategory::Replayed);
    }

    #[test]
    fn test_default_risk_sets() {
        let opts = SandboxOptions::default();
        assert!(opts.is_high_risk("git_push"));
        assert!(opts.is_high_risk("fs_delete_file"));
        assert!(!opts.is_high_risk("fs_write_file"));
        assert!(opts.is_human_interrupt("ask_user"));
    }

    #[test]
    fn test_display() {
        assert_eq!(ToolCategory::FileSystem.to_string(), "file_system");
        assert_eq!(ToolCategory::Replayed.to_string(), "replayed");
    }
}
