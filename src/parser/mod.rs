//! Shell parsing for dcg
//!
//! Segmentation into sub-commands, word-level helpers and wrapper unwrapping.
//! Nothing here executes or expands the command.

pub mod segment;
pub mod shell;
pub mod wrapper;

pub use segment::{segment_command, HeredocBody, Segment, Segmentation};
