//! dcg - Destructive Command Guard
//!
//! Inspects a shell command an agent is about to run and returns an
//! ALLOW / WARN / BLOCK verdict with the reason, without executing or
//! expanding any part of the command.
//!
//! # Features
//!
//! - **Segmentation**: splits on `;`, `&&`, `||`, `|`, newlines and
//!   here-documents while respecting quotes and substitutions
//! - **Embedded-execution detection**: `$(...)`, backticks, process
//!   substitution, `-exec`, pipes into shells and `xargs`
//! - **Safe contexts**: read-only commands and dry-run flags are not flagged
//! - **Safe paths**: deleting inside build output, caches and temp
//!   directories is not flagged
//! - **Pattern packs**: a core set plus optional built-in and TOML packs,
//!   compiled once into a linear-time `RegexSet`
//! - **Audit logging**: JSONL log of all decisions
//!
//! # Example
//!
//! ```
//! use dcg::{evaluate, PatternRegistry, SafePaths, VerdictAction};
//!
//! let registry = PatternRegistry::core();
//! let safe_paths = SafePaths::none();
//!
//! let verdict = evaluate("rm -rf /", "default", &registry, &safe_paths);
//! assert_eq!(verdict.action, VerdictAction::Block);
//! assert_eq!(verdict.pattern_id.as_deref(), Some("fs_rm_root"));
//!
//! let verdict = evaluate(r#"grep "rm -rf /" notes.txt"#, "default", &registry, &safe_paths);
//! assert!(verdict.is_allow());
//! ```

pub mod audit;
pub mod config;
pub mod engine;
pub mod input;
pub mod output;
pub mod parser;
pub mod rules;

// Re-exports for convenience
pub use config::{Config, ConfigError};
pub use engine::{evaluate, Guard, Match, SafePaths};
pub use input::{HookInput, ToolInput};
pub use output::{HookOutput, Verdict, VerdictAction};
pub use rules::{
    Action, PackDefinition, PackError, Pattern, PatternRegistry, RegistryBuilder, Severity,
};
