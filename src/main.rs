//! dcg - Destructive Command Guard
//!
//! A PreToolUse hook that evaluates shell commands before they run.
//!
//! # Usage
//!
//! ```bash
//! # As a hook (reads JSON from stdin, writes JSON to stdout)
//! echo '{"tool_name":"Bash","tool_input":{"command":"rm -rf /"}}' | dcg
//!
//! # Evaluate one command and print the verdict
//! dcg --command 'git reset --hard'
//! ```

use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use dcg::{
    audit::{AuditEntry, AuditLogger},
    config::{Config, ConfigError},
    engine::Guard,
    input::HookInput,
    output::{HookOutput, Verdict},
    rules::PatternRegistry,
};

/// Context label used when none is given
const DEFAULT_CONTEXT: &str = "default";

/// Print version information
fn print_version() {
    println!("dcg {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"dcg - Destructive Command Guard

USAGE:
    dcg [OPTIONS]

OPTIONS:
    -h, --help                Print this help message
    -v, --version             Print version information
    -c, --command CMD         Evaluate CMD and print the verdict as JSON
    -x, --context LABEL       Context label recorded with the decision
    -f, --config PATH         Path to config file
    -p, --project-root PATH   Anchor for relative safe paths

ENVIRONMENT:
    DCG_DISABLED=1            Allow everything (still logs)
    DCG_WARN_ONLY=1           Warn instead of blocking
    DCG_LOG=<filter>          Diagnostics filter, e.g. dcg=debug

USAGE AS HOOK:
    Configure in ~/.claude/settings.json:
    {{
      "hooks": {{
        "PreToolUse": [{{
          "matcher": "Bash",
          "hooks": [{{ "type": "command", "command": "dcg", "timeout": 5000 }}]
        }}]
      }}
    }}
"#
    );
}

/// Parse command line arguments
#[derive(Default)]
struct Args {
    help: bool,
    version: bool,
    command: Option<String>,
    context: Option<String>,
    config_path: Option<String>,
    project_root: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args::default();

        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();
            let mut value = || {
                i += 1;
                args.get(i).cloned()
            };
            match arg {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "-c" | "--command" => result.command = value(),
                "-x" | "--context" => result.context = value(),
                "-f" | "--config" => result.config_path = value(),
                "-p" | "--project-root" => result.project_root = value(),
                arg if arg.starts_with("--command=") => {
                    result.command = Some(arg.trim_start_matches("--command=").to_string());
                }
                arg if arg.starts_with("--context=") => {
                    result.context = Some(arg.trim_start_matches("--context=").to_string());
                }
                arg if arg.starts_with("--config=") => {
                    result.config_path = Some(arg.trim_start_matches("--config=").to_string());
                }
                arg if arg.starts_with("--project-root=") => {
                    result.project_root =
                        Some(arg.trim_start_matches("--project-root=").to_string());
                }
                other => tracing::debug!(arg = other, "ignoring unknown argument"),
            }
            i += 1;
        }

        result
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| !v.is_empty() && v != "0").unwrap_or(false)
}

/// Diagnostics go to stderr; stdout carries the hook response.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("DCG_LOG")
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(Path::new(path)),
        None => Config::load(),
    }
}

fn build_guard(config: &Config, project_root: Option<&Path>) -> Guard {
    let registry = config.build_registry().unwrap_or_else(|e| {
        tracing::error!(error = %e, "pack loading failed, using the core set only");
        PatternRegistry::core()
    });
    let safe_paths = config.safe_paths(project_root);
    tracing::debug!(
        patterns = registry.len(),
        safe_paths = safe_paths.entries().len(),
        "guard ready"
    );
    Guard::new(Arc::new(registry), Arc::new(safe_paths))
}

fn write_stdout(json: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let _ = writeln!(handle, "{}", json);
    let _ = handle.flush();
}

fn main() {
    let args = Args::parse();

    if args.help {
        print_help();
        return;
    }

    if args.version {
        print_version();
        return;
    }

    // Load errors are logged once tracing is up
    let (config, load_error) = match load_config(args.config_path.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(&config.general.log_level);
    if let Some(e) = load_error {
        tracing::warn!(error = %e, "using default configuration");
    }

    let disabled = env_flag("DCG_DISABLED");
    let warn_only = env_flag("DCG_WARN_ONLY");
    let context = args.context.as_deref().unwrap_or(DEFAULT_CONTEXT);
    let mut logger = AuditLogger::new(config.audit_path().as_deref());

    // One-shot mode: print the verdict itself
    if let Some(ref command) = args.command {
        let root = args
            .project_root
            .as_deref()
            .map(PathBuf::from)
            .or_else(|| env::current_dir().ok());
        let guard = build_guard(&config, root.as_deref());
        let mut verdict = guard.evaluate(command, context);
        if warn_only {
            verdict = verdict.downgraded();
        }
        if let Err(e) = logger.log(&AuditEntry::new(command, &verdict, context, None)) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
        write_stdout(&verdict.to_json());
        return;
    }

    let mut input_json = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut input_json) {
        tracing::error!(error = %e, "failed to read stdin");
    }

    // No input = nothing to check, allow
    if input_json.trim().is_empty() {
        write_stdout(&HookOutput::allow().to_json());
        return;
    }

    // Fail closed on parse errors
    let input = match HookInput::from_json(&input_json) {
        Ok(input) => input,
        Err(e) => {
            tracing::error!(error = %e, "failed to parse hook input, denying");
            let output =
                HookOutput::deny("parse-error", &format!("Failed to parse hook input: {}", e));
            write_stdout(&output.to_json());
            return;
        }
    };

    tracing::debug!(tool = %input.tool_name, input = %input.summary(), "hook input");

    let Some(command) = input.command() else {
        write_stdout(&HookOutput::allow().to_json());
        return;
    };
    let session_id = input.session_id.as_deref();

    if disabled {
        if let Err(e) = logger.log(&AuditEntry::disabled(command, context, session_id)) {
            tracing::warn!(error = %e, "failed to write audit log");
        }
        write_stdout(&HookOutput::allow().to_json());
        return;
    }

    let root = args
        .project_root
        .clone()
        .or_else(|| env::var("CLAUDE_PROJECT_DIR").ok())
        .or_else(|| input.cwd.clone())
        .map(PathBuf::from);
    let guard = build_guard(&config, root.as_deref());

    let mut verdict: Verdict = guard.evaluate(command, context);
    if warn_only {
        verdict = verdict.downgraded();
    }

    if let Err(e) = logger.log(&AuditEntry::new(command, &verdict, context, session_id)) {
        tracing::warn!(error = %e, "failed to write audit log");
    }

    write_stdout(&HookOutput::from_verdict(&verdict).to_json());
}
