//! Embedded-execution detection
//!
//! A segment that looks read-only can still run code: `echo $(rm -rf /)`,
//! `cat <(curl x)`, `find . -exec rm {} +`, or any stage whose output is
//! piped into a shell. Such segments never receive a safe-context exemption.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::parser::shell::{basename, strip_quotes_and_comments};
use crate::parser::wrapper::effective_command;
use crate::parser::Segmentation;

/// Programs that execute the text they are fed.
pub const INTERPRETERS: &[&str] = &[
    "sh", "bash", "zsh", "dash", "ksh", "csh", "tcsh", "fish", "python", "perl", "ruby", "node",
    "nodejs", "php", "lua", "eval", "source", ".",
];

/// Programs that turn their input into command arguments.
pub const EXECUTORS: &[&str] = &["xargs", "parallel"];

static EXEC_FLAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)-(?:exec|execdir|ok|okdir)(?:\s|$)").unwrap());

static PIPE_TO_INTERPRETER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\|&?\s*(?:(?:sudo|doas|env|nohup|nice|time|timeout\s+\S+)\s+)*(?:\S*/)?(?:sh|bash|zsh|dash|ksh|csh|tcsh|fish|python[0-9.]*|perl|ruby|node|nodejs|php|lua|eval|source|xargs|parallel)(?:\s|$)",
    )
    .unwrap()
});

/// Whether `name` (a bare command name) runs the code it is given.
pub fn is_interpreter(name: &str) -> bool {
    let name = basename(name);
    if INTERPRETERS.contains(&name) {
        return true;
    }
    // python3, python3.12, perl5
    let stem = name.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
    stem != name && matches!(stem, "python" | "perl" | "ruby" | "node" | "php" | "lua")
}

/// Whether a pipeline stage running `name` executes what it reads.
pub fn is_executing_sink(name: &str) -> bool {
    is_interpreter(name) || EXECUTORS.contains(&basename(name))
}

/// Constructs inside the segment text itself that run code.
///
/// Single-quoted text is inert and skipped; substitutions inside double
/// quotes still count.
pub fn has_embedded_execution(text: &str) -> bool {
    if has_substitution(text) {
        return true;
    }

    let stripped = strip_quotes_and_comments(text);
    EXEC_FLAG.is_match(&stripped) || PIPE_TO_INTERPRETER.is_match(&stripped)
}

/// `$(`, backticks, `<(` or `>(` outside single quotes and `$'...'`.
fn has_substitution(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut single = false;
    let mut ansi = false;
    let mut double = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if single {
            if b == b'\'' {
                single = false;
            }
            i += 1;
            continue;
        }
        if ansi {
            match b {
                b'\\' => i += 1,
                b'\'' => ansi = false,
                _ => {}
            }
            i += 1;
            continue;
        }

        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'$' if !double && bytes.get(i + 1) == Some(&b'\'') => {
                ansi = true;
                i += 2;
                continue;
            }
            b'\'' if !double => single = true,
            b'"' => double = !double,
            b'`' => return true,
            b'$' | b'<' | b'>' if bytes.get(i + 1) == Some(&b'(') => {
                if b == b'$' || !double {
                    return true;
                }
            }
            _ => {}
        }
        i += 1;
    }

    false
}

/// Embedded-execution flag for every segment of `segmentation`, in order.
///
/// A segment is flagged for constructs in its own text or because a later
/// stage of its pipeline is an interpreter or `xargs`. One backward pass;
/// each stage is tokenized once.
pub fn detect(segmentation: &Segmentation<'_>) -> Vec<bool> {
    let segments = &segmentation.segments;
    let mut flags = vec![false; segments.len()];
    let mut pipeline = None;
    let mut sink_downstream = false;

    for (idx, segment) in segments.iter().enumerate().rev() {
        if pipeline != Some(segment.pipeline) {
            pipeline = Some(segment.pipeline);
            sink_downstream = false;
        }

        flags[idx] = sink_downstream || has_embedded_execution(segment.text);

        sink_downstream |= match effective_command(segment.text) {
            Some(name) => is_executing_sink(&name),
            // Untokenizable stages cannot be shown harmless.
            None => true,
        };
    }

    flags
}
