//! Match aggregation and verdict selection

use std::cmp::Reverse;

use crate::output::Verdict;
use crate::rules::{Action, Pattern, Severity};

/// One pattern hit inside one unit of the command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub pattern_id: String,
    pub action: Action,
    pub severity: Severity,
    pub message: String,
    /// Byte offset of the segment or heredoc line that matched
    pub segment_offset: usize,
}

impl Match {
    pub fn new(pattern: &Pattern, segment_offset: usize) -> Self {
        Self {
            pattern_id: pattern.id.clone(),
            action: pattern.action,
            severity: pattern.severity,
            message: pattern.message.clone(),
            segment_offset,
        }
    }
}

/// Highest severity wins; ties go to the earliest offset, then to the
/// first match collected.
pub fn select(matches: &[Match]) -> Option<&Match> {
    matches
        .iter()
        .min_by_key(|m| (Reverse(m.severity.score()), m.segment_offset))
}

/// Reduce all collected matches to a verdict. No matches is ALLOW.
pub fn decide(matches: &[Match]) -> Verdict {
    match select(matches) {
        Some(winner) => Verdict::from_match(winner),
        None => Verdict::allow(),
    }
}
