//! The `dcg` binary as a hook and as a one-shot checker

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use serde_json::{json, Value};
use tempfile::TempDir;

/// Runs the binary with an isolated home so no real config or audit log is
/// touched.
struct Cli {
    home: TempDir,
}

impl Cli {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dcg"));
        cmd.env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.home.path().join(".config"))
            .env_remove("DCG_DISABLED")
            .env_remove("DCG_WARN_ONLY")
            .env_remove("DCG_LOG")
            .env_remove("CLAUDE_PROJECT_DIR");
        cmd
    }

    fn run_hook(&self, stdin: &str, envs: &[(&str, &str)]) -> String {
        let mut child = self
            .command()
            .envs(envs.iter().copied())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
        let output = child.wait_with_output().unwrap();
        assert!(output.status.success());
        String::from_utf8(output.stdout).unwrap()
    }

    fn hook(&self, command: &str, envs: &[(&str, &str)]) -> Value {
        let input = json!({
            "tool_name": "Bash",
            "tool_input": { "command": command },
            "session_id": "cli-test",
            "hook_event_name": "PreToolUse",
        });
        let stdout = self.run_hook(&input.to_string(), envs);
        serde_json::from_str(stdout.trim()).unwrap()
    }

    fn audit_lines(&self) -> Vec<Value> {
        let path = self.home.path().join(".config/dcg/audit.jsonl");
        fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

// ============================================================================
// Hook mode
// ============================================================================

#[test]
fn test_hook_denies_destructive_command() {
    let cli = Cli::new();
    let output = cli.hook("rm -rf /", &[]);

    let specific = &output["hookSpecificOutput"];
    assert_eq!(specific["permissionDecision"], "deny");
    assert_eq!(specific["hookEventName"], "PreToolUse");
    let reason = specific["permissionDecisionReason"].as_str().unwrap();
    assert!(reason.starts_with("[dcg:fs_rm_root]"));
}

#[test]
fn test_hook_allows_safe_command() {
    let cli = Cli::new();
    assert_eq!(cli.hook("ls -la", &[]), json!({}));
    assert_eq!(cli.hook(r#"grep "rm -rf /" notes.txt"#, &[]), json!({}));
}

#[test]
fn test_hook_warns_without_denying() {
    let cli = Cli::new();
    let output = cli.hook("git push -f origin feature", &[]);
    assert!(output.get("hookSpecificOutput").is_none());
    let message = output["systemMessage"].as_str().unwrap();
    assert!(message.contains("[dcg:git_push_force] Warning"));
}

#[test]
fn test_hook_ignores_other_tools() {
    let cli = Cli::new();
    let input = json!({
        "tool_name": "Read",
        "tool_input": { "file_path": "/etc/passwd" },
    });
    assert_eq!(cli.run_hook(&input.to_string(), &[]).trim(), "{}");
}

#[test]
fn test_hook_empty_input_allowed() {
    let cli = Cli::new();
    assert_eq!(cli.run_hook("", &[]).trim(), "{}");
}

#[test]
fn test_hook_malformed_input_denied() {
    let cli = Cli::new();
    let stdout = cli.run_hook("{not json", &[]);
    let output: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(output["hookSpecificOutput"]["permissionDecision"], "deny");
    assert!(output["systemMessage"]
        .as_str()
        .unwrap()
        .starts_with("[dcg:parse-error]"));
}

#[test]
fn test_hook_warn_only_downgrades_block() {
    let cli = Cli::new();
    let output = cli.hook("rm -rf /", &[("DCG_WARN_ONLY", "1")]);
    assert!(output.get("hookSpecificOutput").is_none());
    assert!(output["systemMessage"]
        .as_str()
        .unwrap()
        .starts_with("[dcg:fs_rm_root] Warning"));
}

#[test]
fn test_hook_disabled_allows_and_audits() {
    let cli = Cli::new();
    assert_eq!(cli.hook("rm -rf /", &[("DCG_DISABLED", "1")]), json!({}));

    let lines = cli.audit_lines();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["level"], "DISABLED");
    assert_eq!(lines[0]["session_id"], "cli-test");
}

#[test]
fn test_hook_writes_audit_entry() {
    let cli = Cli::new();
    cli.hook("git reset --hard", &[]);
    cli.hook("ls", &[]);

    let lines = cli.audit_lines();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["level"], "BLOCKED");
    assert_eq!(lines[0]["pattern_id"], "git_reset_hard");
    assert_eq!(lines[0]["severity"], "HIGH");
    assert_eq!(lines[1]["level"], "ALLOWED");
}

#[test]
fn test_hook_project_root_from_environment() {
    let cli = Cli::new();
    let project = TempDir::new().unwrap();
    fs::create_dir_all(project.path().join("node_modules")).unwrap();
    let root = project.path().to_string_lossy().into_owned();

    // Temp directories are safe by default and the project lives in one
    let config = cli.home.path().join("dcg.toml");
    fs::write(&config, "[paths]\nsafe_paths = [\"node_modules\"]\n").unwrap();
    let config = config.to_string_lossy().into_owned();

    let hook = |command: &str| {
        let input = json!({
            "tool_name": "Bash",
            "tool_input": { "command": command },
        });
        let mut child = cli
            .command()
            .args(["--config", config.as_str()])
            .env("CLAUDE_PROJECT_DIR", root.as_str())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();
        child
            .stdin
            .take()
            .unwrap()
            .write_all(input.to_string().as_bytes())
            .unwrap();
        let output = child.wait_with_output().unwrap();
        serde_json::from_slice::<Value>(&output.stdout).unwrap()
    };

    assert_eq!(hook("rm -rf node_modules"), json!({}));
    assert_eq!(
        hook("rm -rf src")["hookSpecificOutput"]["permissionDecision"],
        "deny"
    );
}

// ============================================================================
// One-shot mode
// ============================================================================

fn one_shot(cli: &Cli, args: &[&str]) -> Value {
    let output = cli.command().args(args).output().unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_command_flag_prints_verdict() {
    let cli = Cli::new();
    let verdict = one_shot(&cli, &["--command", "rm -rf ~"]);
    assert_eq!(verdict["action"], "BLOCK");
    assert_eq!(verdict["pattern_id"], "fs_rm_home");
    assert_eq!(verdict["severity"], "CRITICAL");

    let verdict = one_shot(&cli, &["--command=ls"]);
    assert_eq!(verdict["action"], "ALLOW");
    assert_eq!(verdict["pattern_id"], Value::Null);
}

#[test]
fn test_config_file_enables_packs() {
    let cli = Cli::new();
    let config = cli.home.path().join("dcg.toml");
    fs::write(
        &config,
        "[general]\naudit_log = false\n\n[packs]\nenabled = [\"database\"]\n",
    )
    .unwrap();
    let config = config.to_string_lossy().into_owned();

    let verdict = one_shot(
        &cli,
        &["-f", config.as_str(), "-c", "mysql -e 'DROP DATABASE prod'"],
    );
    assert_eq!(verdict["pattern_id"], "db_drop_database");
    assert!(cli.audit_lines().is_empty());
}

#[test]
fn test_unreadable_config_warns_and_uses_defaults() {
    let cli = Cli::new();
    let bad = cli.home.path().join("bad.toml");
    fs::write(&bad, "[general\naudit_log = ").unwrap();
    let bad = bad.to_string_lossy().into_owned();

    for config in [bad.as_str(), "/nonexistent/dcg.toml"] {
        let output = cli
            .command()
            .args(["--config", config, "--command", "rm -rf /"])
            .output()
            .unwrap();
        assert!(output.status.success());

        let verdict: Value = serde_json::from_slice(&output.stdout).unwrap();
        assert_eq!(verdict["pattern_id"], "fs_rm_root");

        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("using default configuration"), "stderr: {}", stderr);
        assert!(stderr.contains(config), "stderr: {}", stderr);
    }
}

#[test]
fn test_version_flag() {
    let cli = Cli::new();
    let output = cli.command().arg("--version").output().unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("dcg "));
}
