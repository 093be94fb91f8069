//! Wrapper command unwrapping
//!
//! Commands like `sudo`, `timeout` and `env` run another command. The
//! embedded-execution detector looks through them to find the program that
//! actually receives a pipeline's input.

use crate::parser::shell::{basename, command_words, tokenize};

/// Wrapper commands that run their trailing arguments as a command.
pub const DEFAULT_WRAPPERS: &[&str] = &[
    "sudo",
    "doas",
    "env",
    "timeout",
    "nice",
    "nohup",
    "ionice",
    "time",
    "command",
    "builtin",
    "exec",
    "stdbuf",
    "unbuffer",
];

/// Options of `wrapper` that consume the following word.
fn takes_argument(wrapper: &str, option: &str) -> bool {
    match wrapper {
        "sudo" => matches!(
            option,
            "-u" | "--user" | "-g" | "--group" | "-C" | "--close-from" | "-h" | "--host" | "-D"
        ),
        "doas" => matches!(option, "-u" | "-C"),
        "env" => matches!(option, "-u" | "--unset" | "-C" | "--chdir" | "-S"),
        "timeout" => matches!(option, "-s" | "--signal" | "-k" | "--kill-after"),
        "nice" => option == "-n",
        "ionice" => matches!(option, "-c" | "-n" | "-p" | "-t"),
        "stdbuf" => matches!(option, "-i" | "-o" | "-e"),
        _ => false,
    }
}

/// Strip any chain of wrappers off the front of `tokens`, returning the
/// wrapped command and its arguments. Empty when a wrapper has no command.
pub fn unwrap_tokens(tokens: &[String]) -> &[String] {
    let mut rest = command_words(tokens);

    while let Some(first) = rest.first() {
        let wrapper = basename(first);
        if !DEFAULT_WRAPPERS.contains(&wrapper) {
            break;
        }

        let mut idx = 1;
        let mut duration_pending = wrapper == "timeout";
        while idx < rest.len() {
            let word = rest[idx].as_str();
            if word == "--" {
                idx += 1;
                break;
            }
            if word.starts_with('-') && word.len() > 1 {
                idx += if takes_argument(wrapper, word) { 2 } else { 1 };
            } else if wrapper == "env" && word.contains('=') {
                idx += 1;
            } else if duration_pending {
                duration_pending = false;
                idx += 1;
            } else {
                break;
            }
        }

        rest = command_words(rest.get(idx..).unwrap_or(&[]));
    }

    rest
}

/// Name of the command a segment ultimately runs, with wrappers and any
/// directory prefix removed. `None` when the segment cannot be tokenized.
pub fn effective_command(text: &str) -> Option<String> {
    let tokens = tokenize(text)?;
    unwrap_tokens(&tokens)
        .first()
        .map(|word| basename(word).to_string())
}
