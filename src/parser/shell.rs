//! Shell word-level helpers
//!
//! Tokenization, quote and comment stripping, leading-command lookup and
//! output redirection detection for a single segment.

/// Tokenize a shell command into words
/// Uses shlex for proper shell quoting handling
pub fn tokenize(command: &str) -> Option<Vec<String>> {
    shlex::split(command)
}

/// Final path component of a command word: `/usr/bin/rm` -> `rm`.
pub fn basename(word: &str) -> &str {
    word.rsplit('/').next().unwrap_or(word)
}

/// `NAME=value` prefix assignment
pub fn is_env_assignment(word: &str) -> bool {
    match word.split_once('=') {
        Some((name, _)) => {
            !name.is_empty()
                && !name.starts_with(|c: char| c.is_ascii_digit())
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

/// Redirection operator word such as `>`, `2>>`, `<`, `&>`, `>|`.
fn is_redirect_operator(word: &str) -> bool {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.strip_prefix('&').unwrap_or(rest);
    matches!(rest, ">" | ">>" | "<" | "<<" | ">|" | "<>")
}

/// Word with the redirection attached: `2>/dev/null`, `>out`, `<in`.
fn is_attached_redirect(word: &str) -> bool {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.strip_prefix('&').unwrap_or(rest);
    rest.starts_with('>') || rest.starts_with('<')
}

/// Drop leading environment assignments and redirections, returning the
/// words from the command name onward.
pub fn command_words(tokens: &[String]) -> &[String] {
    let mut idx = 0;
    while idx < tokens.len() {
        let word = tokens[idx].as_str();
        if is_env_assignment(word) {
            idx += 1;
        } else if is_redirect_operator(word) {
            idx += 2;
        } else if is_attached_redirect(word) {
            idx += 1;
        } else {
            break;
        }
    }
    tokens.get(idx..).unwrap_or(&[])
}

/// The command name of a segment, after leading assignments and
/// redirections. `None` when the segment cannot be tokenized.
pub fn leading_command(text: &str) -> Option<String> {
    let tokens = tokenize(text)?;
    let word = command_words(&tokens).first()?;
    // `cat>out` tokenizes as a single word
    let name = word.split(['<', '>']).next().unwrap_or(word);
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Replace quoted regions with a space and drop a trailing `#` comment.
///
/// Used before scanning for flags so that `grep -- "--help"` or
/// `rm -rf / # --dry-run` are not mistaken for the flag itself.
pub fn strip_quotes_and_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        match c {
            '$' if chars.peek() == Some(&'\'') => {
                chars.next();
                while let Some(q) = chars.next() {
                    match q {
                        '\\' => {
                            chars.next();
                        }
                        '\'' => break,
                        _ => {}
                    }
                }
                out.push(' ');
            }
            '\'' => {
                for q in chars.by_ref() {
                    if q == '\'' {
                        break;
                    }
                }
                out.push(' ');
            }
            '"' => {
                while let Some(q) = chars.next() {
                    match q {
                        '\\' => {
                            chars.next();
                        }
                        '"' => break,
                        _ => {}
                    }
                }
                out.push(' ');
            }
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '#' if prev.map_or(true, |p| {
                p.is_whitespace() || matches!(p, ';' | '&' | '|' | '(')
            }) =>
            {
                break;
            }
            _ => out.push(c),
        }
        prev = Some(c);
    }

    out
}

/// Targets an output redirection may point at without writing a file.
const HARMLESS_TARGETS: &[&str] = &["/dev/null", "/dev/stdout", "/dev/stderr"];

/// Whether the segment writes to a file through `>`, `>>`, `>|` or `&>`.
///
/// File-descriptor duplication (`2>&1`, `>&-`) and the targets
/// `/dev/null`, `/dev/stdout`, `/dev/stderr` do not count. Process
/// substitution `>(...)` is left to the embedded-execution detector.
pub fn has_output_redirection(text: &str) -> bool {
    let bytes = text.as_bytes();
    let len = bytes.len();
    let mut quote: Option<u8> = None;
    let mut i = 0;

    while i < len {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == b'\\' && q != b'\'' {
                i += 2;
                continue;
            }
            // `$` marks an open $'...'
            if b == q || (q == b'$' && b == b'\'') {
                quote = None;
            }
            i += 1;
            continue;
        }

        match b {
            b'\\' => {
                i += 2;
                continue;
            }
            b'$' if bytes.get(i + 1) == Some(&b'\'') => {
                quote = Some(b'$');
                i += 2;
                continue;
            }
            b'\'' | b'"' => quote = Some(b),
            b'>' => {
                let mut j = i + 1;
                if j < len && matches!(bytes[j], b'>' | b'|') {
                    j += 1;
                }
                if j < len && bytes[j] == b'&' {
                    // >&2 and >&- duplicate descriptors; >&file writes
                    if j + 1 < len && (bytes[j + 1].is_ascii_digit() || bytes[j + 1] == b'-') {
                        i = j + 2;
                        continue;
                    }
                    j += 1;
                }
                if j < len && bytes[j] == b'(' {
                    i = j + 1;
                    continue;
                }
                let (target, end) = redirect_target(text, j);
                if !HARMLESS_TARGETS.contains(&target.as_str()) {
                    return true;
                }
                i = end;
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    false
}

/// Read the word after a redirection operator starting at `from`,
/// with quotes removed. Returns the word and the index after it.
fn redirect_target(text: &str, from: usize) -> (String, usize) {
    let bytes = text.as_bytes();
    let mut i = from;
    while i < bytes.len() && matches!(bytes[i], b' ' | b'\t') {
        i += 1;
    }

    let mut word = String::new();
    let mut quote: Option<char> = None;
    let mut end = i;
    for (offset, c) in text[i..].char_indices() {
        end = i + offset + c.len_utf8();
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => word.push(c),
            None => match c {
                '\'' | '"' => quote = Some(c),
                ' ' | '\t' | '\n' | ';' | '&' | '|' | '<' | '>' | ')' => {
                    end -= c.len_utf8();
                    break;
                }
                _ => word.push(c),
            },
        }
    }

    (word, end)
}
