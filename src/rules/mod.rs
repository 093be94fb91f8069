//! Pattern model and the compiled pattern registry
//!
//! A [`PatternRegistry`] is assembled once per process from the core set plus
//! any extension packs, then shared read-only across evaluations.

pub mod base;
pub mod pack;
pub mod packs;

use std::cmp::Ordering;
use std::fmt;

use regex::RegexSet;
use serde::{Deserialize, Serialize};

pub use pack::{PackDefinition, PackError, PatternDef, RegistryBuilder};

/// What the caller should do when a pattern wins the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    #[serde(alias = "block")]
    Block,
    #[serde(alias = "warn")]
    Warn,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Block => "BLOCK",
            Action::Warn => "WARN",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a pattern. Ordered by [`Severity::score`], so
/// `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    #[serde(alias = "critical")]
    Critical,
    #[serde(alias = "high")]
    High,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "low")]
    Low,
}

impl Severity {
    /// Numeric score used for ranking matches.
    pub const fn score(&self) -> u8 {
        match self {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Low => 25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "CRITICAL",
            Severity::High => "HIGH",
            Severity::Medium => "MEDIUM",
            Severity::Low => "LOW",
        }
    }
}

impl Ord for Severity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score().cmp(&other.score())
    }
}

impl PartialOrd for Severity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A built-in rule definition, kept as a `const` table entry.
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique identifier for this rule
    pub id: &'static str,

    /// Regex pattern to match against a segment
    pub pattern: &'static str,

    pub action: Action,

    pub severity: Severity,

    /// Human-readable reason shown to the agent
    pub message: &'static str,
}

impl Rule {
    /// Create a new rule
    pub const fn new(
        id: &'static str,
        pattern: &'static str,
        action: Action,
        severity: Severity,
        message: &'static str,
    ) -> Self {
        Self {
            id,
            pattern,
            action,
            severity,
            message,
        }
    }
}

/// A validated pattern record held by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub id: String,
    pub regex: String,
    pub action: Action,
    pub severity: Severity,
    pub message: String,
    /// Name of the pack that registered this pattern
    pub pack: String,
}

impl Pattern {
    /// Whether this pattern belongs to the filesystem-deletion family,
    /// which is eligible for the safe-path exemption.
    pub fn is_filesystem_deletion(&self) -> bool {
        self.id.starts_with(FS_PATTERN_PREFIX)
    }
}

/// Id prefix of the filesystem-deletion family.
pub const FS_PATTERN_PREFIX: &str = "fs_";

/// Immutable, precompiled pattern collection.
///
/// All regexes live in a single [`RegexSet`] built with the linear-time
/// `regex` engine; a match reports every pattern index at once.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
    set: RegexSet,
}

impl PatternRegistry {
    pub(crate) fn from_parts(patterns: Vec<Pattern>, set: RegexSet) -> Self {
        Self { patterns, set }
    }

    /// A registry with no patterns; every command evaluates to ALLOW.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: RegexSet::empty(),
        }
    }

    /// The always-present core set only.
    pub fn core() -> Self {
        RegistryBuilder::new()
            .with_core()
            .build()
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "core pattern set failed to compile");
                Self::empty()
            })
    }

    /// Patterns whose regex matches `text`, in registration order.
    pub fn matching<'a>(&'a self, text: &str) -> impl Iterator<Item = &'a Pattern> + 'a {
        let hits: Vec<usize> = self.set.matches(text).into_iter().collect();
        hits.into_iter().map(move |idx| &self.patterns[idx])
    }

    pub fn get(&self, id: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self::core()
    }
}
