//! End-to-end behavior of the replay sandbox's simulated world.

use serde_json::json;
use strategy_lab_core::sandbox::{DriftKind, GitStatus, ReplaySandbox, SandboxOptions};
use strategy_state::{EpisodeId, Trace, TraceStatus};

fn sandbox() -> ReplaySandbox {
    ReplaySandbox::new(vec![], SandboxOptions::default()).expect("empty traces are ordered")
}

fn text(sb: &mut ReplaySandbox, tool: &str, args: serde_json::Value) -> String {
    let result = sb.call_tool(tool, &args).expect("simulated tools never fail");
    assert!(!result.is_error, "{tool} failed: {}", result.text_content());
    result.text_content()
}

fn status(sb: &mut ReplaySandbox) -> GitStatus {
    serde_json::from_str(&text(sb, "git_status", json!({}))).expect("status is json")
}

#[test]
fn test_windows_and_posix_paths_share_one_namespace() {
    let mut sb = sandbox();
    text(&mut sb, "fs_write_file", json!({"path": "C:\\work\\a.txt", "content": "x"}));
    assert_eq!(text(&mut sb, "fs_read_file", json!({"path": "/work/a.txt"})), "x");
    assert_eq!(
        text(&mut sb, "shell_execute", json!({"command": "type C:\\work\\a.txt"})),
        "x"
    );
}

#[test]
fn test_single_letter_directory_keeps_its_own_files() {
    let mut sb = sandbox();
    text(&mut sb, "fs_write_file", json!({"path": "/a/notes.md", "content": "nested"}));
    text(&mut sb, "fs_write_file", json!({"path": "/notes.md", "content": "root"}));

    assert_eq!(text(&mut sb, "fs_read_file", json!({"path": "/a/notes.md"})), "nested");
    assert_eq!(
        text(&mut sb, "fs_list_directory", json!({"path": "/"})),
        "[DIR] a\n[FILE] notes.md"
    );
    assert_eq!(status(&mut sb).created, vec!["/a/notes.md", "/notes.md"]);
}

#[test]
fn test_write_add_commit_leaves_clean_status() {
    let mut sb = sandbox();
    text(&mut sb, "fs_write_file", json!({"path": "src/lib.rs", "content": "pub fn f() {}"}));

    let st = status(&mut sb);
    assert_eq!(st.created, vec!["/src/lib.rs"]);
    assert!(st.staged.is_empty());

    text(&mut sb, "git_add", json!({"paths": ["src/lib.rs"]}));
    let st = status(&mut sb);
    assert_eq!(st.staged, vec!["/src/lib.rs"]);
    assert!(st.created.is_empty() && st.modified.is_empty() && st.deleted.is_empty());

    text(&mut sb, "git_commit", json!({"message": "add lib"}));
    assert!(status(&mut sb).is_clean());
}

#[test]
fn test_path_lands_in_one_bucket_at_a_time() {
    let mut sb = sandbox();
    text(&mut sb, "fs_write_file", json!({"path": "/a", "content": "1"}));
    text(&mut sb, "git_add", json!({"paths": "."}));
    text(&mut sb, "git_commit", json!({"message": "init"}));

    text(&mut sb, "fs_write_file", json!({"path": "/a", "content": "2"}));
    let st = status(&mut sb);
    assert_eq!(st.modified, vec!["/a"]);
    assert!(st.created.is_empty() && st.deleted.is_empty());

    text(&mut sb, "fs_delete_file", json!({"path": "/a"}));
    let st = status(&mut sb);
    assert_eq!(st.deleted, vec!["/a"]);
    assert!(st.created.is_empty() && st.modified.is_empty());
}

#[test]
fn test_shell_git_matches_git_tools() {
    let mut sb = sandbox();
    text(&mut sb, "fs_write_file", json!({"path": "/readme.md", "content": "hi"}));
    text(&mut sb, "run_shell_command", json!({"command": "git add readme.md"}));
    assert_eq!(
        text(&mut sb, "execute_command", json!({"command": "git diff --cached"})),
        "diff --git a/readme.md b/readme.md"
    );
    text(&mut sb, "shell_execute", json!({"command": "git commit -m \"docs: readme\""}));
    assert_eq!(
        text(&mut sb, "git_log", json!({"max_count": 5})),
        "0000001 docs: readme"
    );
    assert!(text(&mut sb, "git_push", json!({})).contains("pushed"));
}

#[test]
fn test_listing_and_directories() {
    let mut sb = sandbox();
    text(&mut sb, "fs_create_directory", json!({"path": "/proj/empty"}));
    text(&mut sb, "fs_write_file", json!({"path": "/proj/src/main.rs", "content": ""}));
    text(&mut sb, "fs_write_file", json!({"path": "/proj/Cargo.toml", "content": ""}));
    assert_eq!(
        text(&mut sb, "fs_list_directory", json!({"path": "/proj"})),
        "[FILE] Cargo.toml\n[DIR] empty\n[DIR] src"
    );
    assert_eq!(
        text(&mut sb, "shell_execute", json!({"command": "ls /proj/src"})),
        "[FILE] main.rs"
    );
}

#[test]
fn test_fs_errors_are_in_band() {
    let mut sb = sandbox();
    for (tool, args) in [
        ("fs_read_file", json!({"path": "/missing"})),
        ("fs_delete_file", json!({"path": "/missing"})),
        ("fs_move_file", json!({"source": "/missing", "destination": "/b"})),
        ("fs_list_directory", json!({"path": "/missing"})),
        ("git_commit", json!({"message": "nothing staged"})),
        ("git_add", json!({"paths": ["nope"]})),
        ("git_rebase", json!({})),
    ] {
        let result = sb.call_tool(tool, &args).expect("in-band error");
        assert!(result.is_error, "{tool} should report an error");
    }
}

#[test]
fn test_replayed_tool_drift_sequence() {
    let traces = vec![
        Trace {
            episode_id: EpisodeId::from("ep"),
            step_index: 0,
            tool_name: "search".into(),
            tool_args: json!({"q": "a"}),
            tool_output: "first".into(),
            duration_ms: 1,
            status: TraceStatus::Success,
        },
        Trace {
            episode_id: EpisodeId::from("ep"),
            step_index: 3,
            tool_name: "fetch".into(),
            tool_args: json!({"url": "u"}),
            tool_output: "second".into(),
            duration_ms: 1,
            status: TraceStatus::Success,
        },
    ];
    let mut sb = ReplaySandbox::new(traces, SandboxOptions::default()).expect("ordered");

    // Same tool, different args: args drift, output still replayed.
    assert_eq!(text(&mut sb, "search", json!({"q": "b"})), "first");
    // Unknown tool consumes the next trace positionally.
    assert_eq!(text(&mut sb, "summarize", json!({})), "second");
    assert!(sb.call_tool("search", &json!({"q": "a"})).is_err());

    let kinds: Vec<DriftKind> = sb.metrics().drift.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DriftKind::Args, DriftKind::Tool]);
    assert_eq!(sb.metrics().invocation_count, 3);
}
