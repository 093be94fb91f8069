//! Safe-context classification
//!
//! Segments that only search or print, or that carry a dry-run style flag,
//! are exempt from pattern matching even when their text looks destructive.
//! Callers must check [`crate::engine::embedded`] first; nothing here looks
//! for embedded execution.

use crate::parser::shell::{
    basename, has_output_redirection, is_env_assignment, leading_command,
    strip_quotes_and_comments,
};
use crate::parser::Segment;

/// Commands that only read or print their arguments.
pub const READ_ONLY_COMMANDS: &[&str] = &[
    "grep", "egrep", "fgrep", "rg", "echo", "printf", "cat", "head", "tail", "less", "more",
];

/// Flags that turn a command into a no-op or a preview.
pub const SAFE_FLAGS: &[&str] = &["--help", "--dry-run", "--version", "--what-if"];

/// git subcommands where `-n` means dry run.
const GIT_DRY_RUN_SUBCOMMANDS: &[&str] = &["clean", "rm", "mv", "add", "push", "prune"];

/// Directories a read-only command may be invoked from by absolute path.
const SYSTEM_BIN_DIRS: &[&str] = &["/bin/", "/usr/bin/", "/usr/local/bin/"];

/// Whether the segment is exempt from pattern matching.
///
/// Ambiguous segments (open quote, unbalanced substitution) never are.
pub fn is_safe_context(segment: &Segment<'_>) -> bool {
    !segment.ambiguous && is_safe_text(segment.text)
}

/// Classification on bare segment text.
pub fn is_safe_text(text: &str) -> bool {
    has_read_only_prefix(text) || has_safe_flag(text)
}

/// Leading command is a read-only tool and nothing is written to a file.
pub fn has_read_only_prefix(text: &str) -> bool {
    let Some(command) = leading_command(text) else {
        return false;
    };

    let name = basename(&command);
    let plain = command == name
        || SYSTEM_BIN_DIRS
            .iter()
            .any(|dir| command == format!("{dir}{name}"));

    plain && READ_ONLY_COMMANDS.contains(&name) && !has_output_redirection(text)
}

/// A recognized no-op flag appears as a real word, outside quotes and
/// comments, before any `--` end-of-options marker.
pub fn has_safe_flag(text: &str) -> bool {
    let stripped = strip_quotes_and_comments(text);
    let words: Vec<&str> = stripped.split_whitespace().collect();

    let options = words.iter().take_while(|w| **w != "--");
    for word in options {
        if SAFE_FLAGS.contains(word) {
            return true;
        }
    }

    is_git_dry_run(&words)
}

fn is_git_dry_run(words: &[&str]) -> bool {
    let Some(pos) = words.iter().position(|w| !is_env_assignment(w)) else {
        return false;
    };
    if basename(words[pos]) != "git" {
        return false;
    }

    // git [-C dir] [-c key=val] [--flags] <subcommand>
    let mut idx = pos + 1;
    while idx < words.len() && words[idx].starts_with('-') {
        idx += if matches!(words[idx], "-C" | "-c") { 2 } else { 1 };
    }
    let Some(subcommand) = words.get(idx) else {
        return false;
    };
    if !GIT_DRY_RUN_SUBCOMMANDS.contains(subcommand) {
        return false;
    }

    words[idx + 1..]
        .iter()
        .take_while(|w| **w != "--")
        .any(|w| is_dry_run_short_flag(w))
}

/// `-n` alone or inside a short-option cluster such as `-nfd`.
fn is_dry_run_short_flag(word: &str) -> bool {
    match word.strip_prefix('-') {
        Some(cluster) if !cluster.starts_with('-') && !cluster.is_empty() => {
            cluster.chars().all(|c| c.is_ascii_alphabetic()) && cluster.contains('n')
        }
        _ => false,
    }
}
