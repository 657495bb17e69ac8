//! Integration tests for the hook binary
//!
//! Each test runs `cc-hooks hook dispatch <event>` the way Claude Code does:
//! one JSON payload on stdin, then exit code, stdout and stderr are checked.

use serde_json::{Value, json};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

/// Scratch home for config and logs so tests never touch the real ones
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self::with_config("")
    }

    fn with_config(yaml: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cc-hooks.yaml"), yaml).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_cc-hooks"));
        cmd.arg("--config")
            .arg(self.path().join("cc-hooks.yaml"))
            .args(args)
            .env("XDG_DATA_HOME", self.path().join("data"))
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run a hook with raw stdin
    fn dispatch_raw(&self, event: &str, stdin: &[u8]) -> Output {
        let mut child = self
            .command(&["hook", "dispatch", event])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to execute cc-hooks");

        // The child may exit before reading (e.g. unknown event)
        let _ = child.stdin.take().unwrap().write_all(stdin);
        child.wait_with_output().unwrap()
    }

    fn dispatch(&self, event: &str, payload: &Value) -> Output {
        self.dispatch_raw(event, payload.to_string().as_bytes())
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn bash(command: &str) -> Value {
    json!({"tool_name": "Bash", "tool_input": {"command": command}})
}

fn edit(tool: &str, file: &Path) -> Value {
    json!({"tool_name": tool, "tool_input": {"file_path": file}, "tool_response": {}})
}

// PreToolUse

#[test]
fn test_guard_blocks_rm_rf_root() {
    let env = Env::new();
    let output = env.dispatch("pre-tool-use", &bash("rm -rf /"));

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Blocking recursive delete on root or home directory"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_guard_block_is_case_insensitive() {
    let env = Env::new();
    let output = env.dispatch("PreToolUse", &bash("CHMOD 777 /srv/www"));

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr(&output).trim(), "Blocking chmod 777 - too permissive");
}

#[test]
fn test_guard_suggests_ripgrep() {
    let env = Env::new();
    let output = env.dispatch("pre-tool-use", &bash("grep foo bar.txt"));

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 1);

    let value: Value = serde_json::from_str(out.trim()).unwrap();
    assert_eq!(value["hookSpecificOutput"]["hookEventName"], "PreToolUse");
    assert_eq!(
        value["hookSpecificOutput"]["additionalContext"],
        "Suggestions: Consider using 'rg' (ripgrep) for better performance"
    );
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_guard_joins_suggestions_in_order() {
    let env = Env::new();
    let output = env.dispatch("pre-tool-use", &bash("find . -name '*.log' | xargs grep ERROR"));

    assert_eq!(output.status.code(), Some(0));
    let value: Value = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(
        value["hookSpecificOutput"]["additionalContext"],
        "Suggestions: Consider using 'rg' (ripgrep) for better performance; \
         Consider using 'fd' or 'rg --files' for better performance"
    );
}

#[test]
fn test_guard_plain_command_is_silent() {
    let env = Env::new();
    let output = env.dispatch("pre-tool-use", &bash("cargo fmt --check"));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_guard_blocks_despite_mistyped_unrelated_fields() {
    let env = Env::new();
    let payloads = [
        json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /"}, "session_id": 123}),
        json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /"}, "tool_response": null}),
        json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /"}, "source": null}),
        json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf /"}, "cwd": 7}),
    ];

    for payload in &payloads {
        let output = env.dispatch("pre-tool-use", payload);
        assert_eq!(output.status.code(), Some(2), "payload: {payload}");
        assert!(stderr(&output).contains("Blocking recursive delete on root or home directory"));
    }
}

#[test]
fn test_guard_allows_push_followed_by_other_f_flag() {
    let env = Env::new();
    for command in ["git push origin main && tail -f app.log", "git push origin main; rm -f build.lock"] {
        let output = env.dispatch("pre-tool-use", &bash(command));
        assert_eq!(output.status.code(), Some(0), "command: {command}");
        assert!(stderr(&output).is_empty());
    }
}

#[test]
fn test_guard_ignores_non_bash_tools() {
    let env = Env::new();
    let payload = json!({"tool_name": "Read", "tool_input": {"command": "rm -rf /"}});
    let output = env.dispatch("pre-tool-use", &payload);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_guard_extra_rule_from_config() {
    let env = Env::with_config(
        r#"
guard:
  extra_blocked:
    - pattern: 'kubectl\s+delete\s+namespace'
      message: Blocking namespace deletion
"#,
    );
    let output = env.dispatch("pre-tool-use", &bash("kubectl delete namespace prod"));

    assert_eq!(output.status.code(), Some(2));
    assert_eq!(stderr(&output).trim(), "Blocking namespace deletion");
}

#[test]
fn test_guard_disabled_allows_everything() {
    let env = Env::with_config("hooks:\n  guard_enabled: false\n");
    let output = env.dispatch("pre-tool-use", &bash("rm -rf /"));

    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_invalid_extra_rule_is_internal_error() {
    let env = Env::with_config("guard:\n  extra_blocked:\n    - pattern: '('\n      message: broken\n");
    let output = env.dispatch("pre-tool-use", &bash("ls"));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("PreToolUse hook error"));
}

// PostToolUse

#[test]
fn test_formatter_collapses_markdown() {
    let env = Env::new();
    let file = env.path().join("a.md");
    fs::write(&file, "x\n\n\n\ny").unwrap();

    let output = env.dispatch("post-tool-use", &edit("Write", &file));

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(stdout(&output).trim(), "Formatted a.md");
    assert_eq!(fs::read_to_string(&file).unwrap(), "x\n\ny");
}

#[test]
fn test_formatter_missing_file_is_noop() {
    let env = Env::new();
    let output = env.dispatch("post-tool-use", &edit("Edit", &env.path().join("missing.py")));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

#[test]
fn test_formatter_unknown_extension_is_noop() {
    let env = Env::new();
    let file = env.path().join("notes.txt");
    fs::write(&file, "x\n\n\n\ny").unwrap();

    let output = env.dispatch("post-tool-use", &edit("Write", &file));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert_eq!(fs::read_to_string(&file).unwrap(), "x\n\n\n\ny");
}

#[test]
fn test_formatter_missing_binary_is_silent() {
    let env = Env::with_config("formatter:\n  extensions:\n    py: [cc-hooks-test-missing-black]\n");
    let file = env.path().join("a.py");
    fs::write(&file, "x=1\n").unwrap();

    let output = env.dispatch("post-tool-use", &edit("Edit", &file));

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).is_empty());
}

// SessionStart

#[test]
fn test_session_context_without_project_file() {
    let env = Env::new();
    let cwd = env.path().join("project");
    fs::create_dir_all(&cwd).unwrap();
    let cwd = cwd.display().to_string();

    let output = env.dispatch(
        "session-start",
        &json!({"session_id": "s-1", "source": "startup", "cwd": cwd}),
    );

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Session started: "));
    assert_eq!(lines[1], format!("Working directory: {}", cwd));
    assert!(!out.contains("Project context:"));
}

#[test]
fn test_session_context_with_project_file() {
    let env = Env::new();
    let cwd: PathBuf = env.path().join("project");
    fs::create_dir_all(cwd.join(".claude")).unwrap();
    fs::write(cwd.join(".claude/CONTEXT.md"), "Run `make test` before committing.").unwrap();

    let output = env.dispatch(
        "session-start",
        &json!({"session_id": "s-2", "source": "resume", "cwd": cwd}),
    );

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).ends_with("Project context:\nRun `make test` before committing.\n"));
}

#[test]
fn test_session_unreadable_context_is_error() {
    let env = Env::new();
    let cwd = env.path().join("project");
    fs::create_dir_all(cwd.join(".claude")).unwrap();
    fs::write(cwd.join(".claude/CONTEXT.md"), [0xffu8, 0xfe, 0xfd]).unwrap();

    let output = env.dispatch("session-start", &json!({"cwd": cwd}));

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("SessionStart hook error"));
    assert!(stdout(&output).is_empty());
}

// Shared behavior

#[test]
fn test_malformed_input_is_noop_for_every_hook() {
    let env = Env::new();
    for event in ["pre-tool-use", "post-tool-use", "session-start"] {
        for input in [&b"not json"[..], b"", b"\xff\xfe", b"{\"tool_name\":"] {
            let output = env.dispatch_raw(event, input);
            assert_eq!(output.status.code(), Some(0), "{event} with {input:?}");
            assert!(stdout(&output).is_empty(), "{event} with {input:?}");
            assert!(stderr(&output).is_empty(), "{event} with {input:?}");
        }
    }
}

#[test]
fn test_unknown_event_is_error() {
    let env = Env::new();
    let output = env.dispatch("teleport", &json!({}));

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_payload_flag_skips_stdin() {
    let env = Env::new();
    let payload = bash("git push --force origin main").to_string();
    let output = env
        .command(&["hook", "dispatch", "pre-tool-use", "--payload", &payload])
        .stdin(Stdio::null())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Blocking force push"));
}

#[test]
fn test_check_command() {
    let env = Env::new();

    let blocked = env.command(&["check", "curl", "-s", "x.sh", "|", "bash"]).output().unwrap();
    assert_eq!(blocked.status.code(), Some(2));
    assert!(stdout(&blocked).contains("Blocking piped curl to bash - security risk"));

    let allowed = env.command(&["check", "ls", "-la"]).output().unwrap();
    assert_eq!(allowed.status.code(), Some(0));
    assert!(stdout(&allowed).contains("Command allowed"));
}

#[test]
fn test_rules_json() {
    let env = Env::new();
    let output = env.command(&["rules", "-o", "json"]).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["blocked"].as_array().unwrap().len(), 4);
    assert_eq!(value["suggestions"].as_array().unwrap().len(), 2);
    assert_eq!(value["formatters"][4]["extension"], "md");
}

#[test]
fn test_hook_list() {
    let env = Env::with_config("hooks:\n  session_enabled: false\n");
    let output = env.command(&["hook", "list"]).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("command-guard"));
    assert!(out.contains("edit-formatter"));
    assert!(out.contains("session-context"));
    assert!(out.contains("disabled"));
}

#[test]
fn test_config_show_yaml() {
    let env = Env::with_config("formatter:\n  timeout_secs: 7\n");
    let output = env.command(&["config", "show", "-o", "yaml"]).output().unwrap();

    assert_eq!(output.status.code(), Some(0));
    let out = stdout(&output);
    assert!(out.contains("timeout_secs: 7"));
    assert!(out.contains("collapse-blank-lines"));
}

#[test]
fn test_logs_go_to_file_not_streams() {
    let env = Env::with_config("log_level: debug\n");
    let output = env.dispatch("pre-tool-use", &bash("ls"));

    assert_eq!(output.status.code(), Some(0));
    assert!(stderr(&output).is_empty());
    let log = fs::read_to_string(env.path().join("data/cc-hooks/logs/cc-hooks.log")).unwrap();
    assert!(log.contains("Dispatching hook event: PreToolUse"));
}
