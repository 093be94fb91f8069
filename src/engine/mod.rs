//! Command evaluation
//!
//! [`evaluate`] runs a command through the segmenter, the embedded-execution
//! detector, the safe-context classifier and the pattern registry (with the
//! safe-path resolver consulted for `fs_*` patterns), then reduces every
//! match to one [`Verdict`].

pub mod decision;
pub mod embedded;
pub mod safe_context;
pub mod safe_path;

use std::sync::Arc;

use tracing::{debug, trace};

use crate::output::Verdict;
use crate::parser::{segment_command, Segment};
use crate::rules::PatternRegistry;

pub use decision::Match;
pub use safe_path::SafePaths;

/// Heredoc bodies are segmented again up to this depth.
pub const MAX_HEREDOC_DEPTH: usize = 4;

/// Registry and safe paths built once, shared across evaluations.
#[derive(Debug, Clone)]
pub struct Guard {
    registry: Arc<PatternRegistry>,
    safe_paths: Arc<SafePaths>,
}

impl Guard {
    pub fn new(registry: Arc<PatternRegistry>, safe_paths: Arc<SafePaths>) -> Self {
        Self {
            registry,
            safe_paths,
        }
    }

    /// Evaluate one command
    pub fn evaluate(&self, command: &str, context: &str) -> Verdict {
        evaluate(command, context, &self.registry, &self.safe_paths)
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new(Arc::new(PatternRegistry::core()), Arc::new(SafePaths::none()))
    }
}

/// Evaluate `command` and return the verdict.
///
/// Never fails: empty input, unbalanced quotes and unknown syntax all
/// produce a verdict. `context` is recorded in diagnostics only.
pub fn evaluate(
    command: &str,
    context: &str,
    registry: &PatternRegistry,
    safe_paths: &SafePaths,
) -> Verdict {
    let matches = collect_matches(command, registry, safe_paths);
    let verdict = decision::decide(&matches);

    debug!(
        action = %verdict.action,
        pattern_id = verdict.pattern_id.as_deref().unwrap_or("-"),
        severity = verdict.severity.map(|s| s.as_str()).unwrap_or("-"),
        matches = matches.len(),
        context,
        "evaluated command"
    );

    verdict
}

/// A segment or heredoc body to run through the registry, with its offset
/// made absolute.
#[derive(Debug)]
struct Unit<'a> {
    segment: Segment<'a>,
    embedded: bool,
}

/// Every match across every unit of `command`, ordered by unit offset and
/// then by pattern registration order.
pub fn collect_matches(
    command: &str,
    registry: &PatternRegistry,
    safe_paths: &SafePaths,
) -> Vec<Match> {
    if registry.is_empty() {
        return Vec::new();
    }

    let mut units = Vec::new();
    gather_units(command, 0, 0, Inherited::default(), &mut units);
    units.sort_by_key(|u| u.segment.offset);

    let mut matches = Vec::new();
    for unit in &units {
        match_unit(unit, registry, safe_paths, &mut matches);
    }
    matches
}

/// Flags a heredoc body takes over from the segment that opened it.
#[derive(Debug, Clone, Copy, Default)]
struct Inherited {
    embedded: bool,
    ambiguous: bool,
}

fn gather_units<'a>(
    text: &'a str,
    base: usize,
    depth: usize,
    inherited: Inherited,
    units: &mut Vec<Unit<'a>>,
) {
    let segmentation = segment_command(text);
    let flags = embedded::detect(&segmentation);
    let first = units.len();

    for (segment, flagged) in segmentation.segments.iter().zip(flags) {
        units.push(Unit {
            segment: Segment {
                offset: base + segment.offset,
                ambiguous: inherited.ambiguous || segment.ambiguous,
                ..*segment
            },
            embedded: inherited.embedded || flagged,
        });
    }

    for body in &segmentation.heredocs {
        // `cat <<EOF | sh` runs the body text
        let opener = units.get(first + body.segment);
        let flags = Inherited {
            embedded: inherited.embedded || opener.map_or(true, |u| u.embedded),
            ambiguous: inherited.ambiguous || !body.terminated,
        };
        if depth + 1 < MAX_HEREDOC_DEPTH {
            gather_units(body.text, base + body.offset, depth + 1, flags, units);
        } else if !body.text.trim().is_empty() {
            units.push(Unit {
                segment: Segment {
                    text: body.text,
                    offset: base + body.offset,
                    pipeline: 0,
                    ambiguous: true,
                },
                embedded: true,
            });
        }
    }
}

fn match_unit(
    unit: &Unit<'_>,
    registry: &PatternRegistry,
    safe_paths: &SafePaths,
    out: &mut Vec<Match>,
) {
    let segment = &unit.segment;
    if !unit.embedded && safe_context::is_safe_context(segment) {
        trace!(offset = segment.offset, segment = segment.text, "safe context, skipping");
        return;
    }

    let mut path_safe: Option<bool> = None;
    for pattern in registry.matching(segment.text) {
        if pattern.is_filesystem_deletion() {
            let safe = *path_safe.get_or_insert_with(|| safe_paths.is_segment_safe(segment.text));
            if safe {
                trace!(pattern_id = %pattern.id, segment = segment.text, "safe path, skipping");
                continue;
            }
        }
        out.push(Match::new(pattern, segment.offset));
    }
}
