//! Safe-path resolution
//!
//! Decides whether every operand of an `rm`/`rmdir`/`unlink` segment lies
//! inside a disposable directory. Variables are substituted from a fixed
//! table captured at construction; nothing is ever handed to a shell.
//!
//! Any doubt resolves to "not safe": unknown variables, `~user`, `..`
//! components, hidden-file globs, unanchored relative paths and anything
//! shlex cannot tokenize.

use std::collections::HashMap;
use std::env;
use std::path::{Component, Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::parser::shell::tokenize;

/// `[VAR=x ...] [sudo|doas [-flags]] rm|rmdir|unlink <args>`
static DELETE_INVOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?:[A-Za-z_][A-Za-z0-9_]*=\S*\s+)*(?:(?:sudo|doas)\s+(?:-[A-Za-z]+\s+)*)?(?:(?:/usr)?/bin/)?(?:rm|rmdir|unlink)\s+(.*)$",
    )
    .unwrap()
});

const GLOB_CHARS: &[char] = &['*', '?', '['];

/// Variables the resolver substitutes, captured once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionVars {
    vars: HashMap<String, String>,
    home: Option<String>,
}

impl ExpansionVars {
    /// Capture `HOME`, `TMPDIR`, `PWD`, `USER` from the process and
    /// `PROJECT_ROOT` from `project_root`.
    pub fn from_env(project_root: Option<&Path>) -> Self {
        let home = dirs::home_dir().map(|p| p.to_string_lossy().into_owned());
        let tmpdir = env::var("TMPDIR")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| env::temp_dir().to_string_lossy().into_owned());
        let pwd = env::current_dir()
            .ok()
            .map(|p| p.to_string_lossy().into_owned());
        let user = env::var("USER").ok().filter(|v| !v.is_empty());

        Self::default()
            .with_home(home)
            .with("TMPDIR", Some(tmpdir))
            .with("PWD", pwd)
            .with("USER", user)
            .with(
                "PROJECT_ROOT",
                project_root.map(|p| p.to_string_lossy().into_owned()),
            )
    }

    /// Set a variable; `None` leaves it unset.
    pub fn with(mut self, name: &str, value: Option<String>) -> Self {
        if let Some(value) = value {
            self.vars.insert(name.to_string(), value);
        }
        self
    }

    /// Set the home directory, used for `$HOME` and `~`.
    pub fn with_home(mut self, home: Option<String>) -> Self {
        if let Some(ref h) = home {
            self.vars.insert("HOME".to_string(), h.clone());
        }
        self.home = home;
        self
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Substitute `~`, `$VAR` and `${VAR}` from the table.
    /// `None` for any variable outside it.
    pub fn expand(&self, raw: &str) -> Option<String> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        if rest == "~" || rest.starts_with("~/") {
            out.push_str(self.home.as_deref()?);
            rest = &rest[1..];
        } else if rest.starts_with('~') {
            return None;
        }

        while let Some(pos) = rest.find('$') {
            out.push_str(&rest[..pos]);
            rest = &rest[pos + 1..];

            let (name, consumed) = if let Some(braced) = rest.strip_prefix('{') {
                let end = braced.find('}')?;
                (&braced[..end], end + 2)
            } else {
                let end = rest
                    .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .unwrap_or(rest.len());
                (&rest[..end], end)
            };

            out.push_str(self.get(name)?);
            rest = &rest[consumed..];
        }

        out.push_str(rest);
        Some(out)
    }
}

/// The canonicalized safe-path set plus the project root it was anchored to.
///
/// Built once per process and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct SafePaths {
    entries: Vec<PathBuf>,
    project_root: Option<PathBuf>,
    vars: ExpansionVars,
}

impl SafePaths {
    /// No safe paths: the exemption never applies.
    pub fn none() -> Self {
        Self::default()
    }

    /// Build from configured entries, reading expansion variables from the
    /// process environment.
    pub fn new<I, S>(entries: I, project_root: Option<&Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root = project_root.and_then(canonicalize_lenient);
        let vars = ExpansionVars::from_env(root.as_deref());
        Self::with_vars(entries, root.as_deref(), vars)
    }

    /// Build with an explicit variable table.
    pub fn with_vars<I, S>(entries: I, project_root: Option<&Path>, vars: ExpansionVars) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut paths = Self {
            entries: Vec::new(),
            project_root: project_root.and_then(canonicalize_lenient),
            vars,
        };

        let home = paths
            .vars
            .home
            .as_deref()
            .and_then(|h| canonicalize_lenient(Path::new(h)));

        for raw in entries {
            let raw = raw.as_ref();
            let Some(resolved) = paths.resolve(raw) else {
                warn!(entry = raw, "safe path entry cannot be resolved, ignoring");
                continue;
            };
            if resolved == Path::new("/") || Some(&resolved) == home.as_ref() {
                warn!(entry = raw, "safe path entry covers / or the home directory, ignoring");
                continue;
            }
            if !paths.entries.contains(&resolved) {
                paths.entries.push(resolved);
            }
        }

        paths
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `segment` is a deletion whose operands are all inside a safe
    /// entry.
    pub fn is_segment_safe(&self, segment: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        match deletion_operands(segment) {
            Some(operands) if !operands.is_empty() => {
                operands.iter().all(|op| self.is_path_safe(op))
            }
            _ => false,
        }
    }

    /// Whether a single path operand resolves inside a safe entry.
    pub fn is_path_safe(&self, operand: &str) -> bool {
        match self.resolve(operand) {
            Some(path) => self.entries.iter().any(|entry| path.starts_with(entry)),
            None => false,
        }
    }

    /// Expand, anchor and canonicalize `raw`.
    fn resolve(&self, raw: &str) -> Option<PathBuf> {
        if raw.is_empty() || raw.contains('`') {
            return None;
        }

        let expanded = self.vars.expand(raw)?;
        let path = Path::new(&expanded);

        for component in path.components() {
            match component {
                Component::ParentDir => return None,
                Component::Normal(part) => {
                    let part = part.to_string_lossy();
                    if part.contains('{') {
                        return None;
                    }
                    if part.starts_with('.') && part.contains(GLOB_CHARS) {
                        return None;
                    }
                }
                _ => {}
            }
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.as_ref()?.join(path)
        };

        canonicalize_lenient(&absolute)
    }
}

/// Operands of an `rm`/`rmdir`/`unlink` segment with options and
/// redirections removed. `None` when the segment is not such a deletion or
/// cannot be tokenized.
fn deletion_operands(segment: &str) -> Option<Vec<String>> {
    let caps = DELETE_INVOCATION.captures(segment)?;
    let args = caps.get(1)?.as_str();

    // '$HOME' stays literal in the shell; never guess which form was meant
    if args.contains('\'') && args.contains('$') {
        return None;
    }

    let tokens = tokenize(args)?;
    let mut operands = Vec::new();
    let mut options_done = false;
    let mut skip_next = false;

    for token in tokens {
        if skip_next {
            skip_next = false;
            continue;
        }
        if !options_done {
            if token == "--" {
                options_done = true;
                continue;
            }
            if token.starts_with('-') && token.len() > 1 {
                continue;
            }
        }
        let bare = token.trim_start_matches(|c: char| c.is_ascii_digit());
        if bare.starts_with('>') || bare.starts_with('<') {
            // `2>` followed by its target
            if bare.trim_start_matches(['>', '<', '&', '|']).is_empty() {
                skip_next = true;
            }
            continue;
        }
        operands.push(token);
    }

    Some(operands)
}

/// Canonicalize the deepest existing ancestor of `path` and append the
/// remaining components, so targets that do not exist yet still resolve.
pub fn canonicalize_lenient(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut tail = Vec::new();

    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for part in tail.iter().rev() {
                out.push(part);
            }
            return Some(out);
        }
        tail.push(existing.file_name()?);
        existing = existing.parent()?;
    }
}
