//! Core pattern set, always registered first
//!
//! Patterns are matched against one segment at a time, so they never need to
//! look across `;`, `&&`, `||` or `|`. Ids starting with `fs_` form the
//! filesystem-deletion family and are subject to the safe-path exemption.

use crate::rules::pack::{PackDefinition, PackMeta};
use crate::rules::{Action, Rule, Severity};

/// Name under which the core set is registered.
pub const CORE_PACK: &str = "core";

/// `rm` in command position: start of segment, after a separator or quote,
/// after a path prefix (`/bin/rm`), behind a wrapper, or after an assignment.
/// Keeps `git rm` out of the filesystem family.
macro_rules! rm_cmd {
    () => {
        r#"(?:^|[;&|(`"'/]\s*|(?:^|\s)(?:sudo|doas|xargs|exec|command|builtin|nohup|nice|ionice|time|env|timeout|-exec|-execdir|-ok)(?:\s+\S+)*?\s+|(?:^|\s)\w+=\S*\s+)rm\s+"#
    };
}

/// Tail of a path operand: closing quote, then end of word.
macro_rules! word_end {
    () => {
        r#"["']?(?:\s|$|[;&|)`])"#
    };
}

pub const CORE_RULES: &[Rule] = &[
    // Filesystem destruction
    Rule::new(
        "fs_rm_root",
        concat!(rm_cmd!(), r#"(?:\S+\s+)*?["']?/+\*?"#, word_end!()),
        Action::Block,
        Severity::Critical,
        "rm on the filesystem root is catastrophic and will not be executed",
    ),
    Rule::new(
        "fs_rm_home",
        concat!(
            rm_cmd!(),
            r#"(?:\S+\s+)*?["']?(?:~|\$HOME|\$\{HOME\})/*\*?"#,
            word_end!()
        ),
        Action::Block,
        Severity::Critical,
        "rm on the home directory is catastrophic and will not be executed",
    ),
    Rule::new(
        "fs_rm_system_dirs",
        concat!(
            rm_cmd!(),
            r#"(?:\S+\s+)*?["']?/(?:etc|usr|var|bin|sbin|lib|lib32|lib64|boot|opt|root|sys|proc|dev|srv|home)(?:/[^\s"';&|)`]*)?"#,
            word_end!()
        ),
        Action::Block,
        Severity::Critical,
        "rm inside a system directory can leave the machine unusable",
    ),
    Rule::new(
        "fs_rm_recursive_force",
        concat!(
            rm_cmd!(),
            r#"(?:\S+\s+)*?(?:-[a-zA-Z]*(?:[rR][a-zA-Z]*f|f[a-zA-Z]*[rR])[a-zA-Z]*|(?:-[a-zA-Z]*[rR][a-zA-Z]*|--recursive)\s+(?:\S+\s+)*?(?:-[a-zA-Z]*f[a-zA-Z]*|--force)|(?:-[a-zA-Z]*f[a-zA-Z]*|--force)\s+(?:\S+\s+)*?(?:-[a-zA-Z]*[rR][a-zA-Z]*|--recursive))"#,
            word_end!()
        ),
        Action::Block,
        Severity::High,
        "rm -rf is destructive and requires human approval; explain what should be deleted and why",
    ),
    Rule::new(
        "fs_rm_recursive",
        concat!(
            rm_cmd!(),
            r#"(?:\S+\s+)*?(?:-[a-zA-Z]*[rR][a-zA-Z]*|--recursive)"#,
            word_end!()
        ),
        Action::Warn,
        Severity::Medium,
        "Recursive delete outside a disposable directory",
    ),
    Rule::new(
        "fs_find_delete",
        r"\bfind\s(?:.*\s)?-delete\b",
        Action::Warn,
        Severity::Medium,
        "find -delete removes every matching file",
    ),
    // Disk destruction
    Rule::new(
        "disk_dd_device",
        r"\bdd\b.*\bof=/dev/(?:sd|nvme|hd|vd|xvd|mmcblk|disk)\w*",
        Action::Block,
        Severity::Critical,
        "Writing directly to a disk device",
    ),
    Rule::new(
        "disk_mkfs",
        r"\bmkfs(?:\.\w+)?\s+(?:\S+\s+)*?/dev/",
        Action::Block,
        Severity::Critical,
        "Formatting a disk device",
    ),
    Rule::new(
        "disk_partition",
        r"\b(?:fdisk|sfdisk|parted|wipefs)\s+(?:\S+\s+)*?/dev/",
        Action::Warn,
        Severity::High,
        "Modifying a disk partition table",
    ),
    Rule::new(
        "fork_bomb",
        r":\(\)\s*\{.*:\s*\|\s*:.*&",
        Action::Block,
        Severity::Critical,
        "Fork bomb detected",
    ),
    Rule::new(
        "chown_chmod_recursive_root",
        r#"\bch(?:mod|own)\s+(?:\S+\s+)*?-[a-zA-Z]*R[a-zA-Z]*\s+(?:\S+\s+)*?["']?/["']?(?:\s|$)"#,
        Action::Block,
        Severity::Critical,
        "Recursive permission change on the filesystem root",
    ),
    Rule::new(
        "system_power",
        r#"(?:^|[;&|(`"']\s*|\bsudo\s+|\bsystemctl\s+)(?:shutdown|reboot|halt|poweroff)\b"#,
        Action::Block,
        Severity::High,
        "Shutting down or rebooting the host",
    ),
    // Guard tampering
    Rule::new(
        "guard_disable_env",
        r"\bDCG_(?:DISABLED|WARN_ONLY)\s*=",
        Action::Block,
        Severity::Critical,
        "Attempt to disable the command guard from inside a command",
    ),
    // Git history loss
    Rule::new(
        "git_reset_hard",
        r"\bgit\s+(?:\S+\s+)*?reset\s+(?:\S+\s+)*?--hard\b",
        Action::Block,
        Severity::High,
        "git reset --hard discards uncommitted changes",
    ),
    Rule::new(
        "git_clean_force",
        r"\bgit\s+(?:\S+\s+)*?clean\s+(?:\S+\s+)*?(?:-[a-zA-Z]*f[a-zA-Z]*|--force)\b",
        Action::Block,
        Severity::High,
        "git clean -f deletes untracked files; run with -n first",
    ),
    Rule::new(
        "git_push_force_main",
        r"\bgit\s+(?:\S+\s+)*?push\b(?:.*\s(?:-f|--force)(?:\s|$).*\b(?:main|master)\b|.*\b(?:main|master)\b.*\s(?:-f|--force)(?:\s|$))",
        Action::Block,
        Severity::High,
        "Force pushing to main/master rewrites shared history",
    ),
    Rule::new(
        "git_push_force",
        r"\bgit\s+(?:\S+\s+)*?push\b.*\s(?:-f|--force)(?:\s|$)",
        Action::Warn,
        Severity::Medium,
        "Force push; prefer --force-with-lease",
    ),
    Rule::new(
        "git_branch_force_delete",
        r"\bgit\s+(?:\S+\s+)*?branch\s+(?:\S+\s+)*?-D\b",
        Action::Warn,
        Severity::Medium,
        "git branch -D deletes unmerged work",
    ),
    // Permissions
    Rule::new(
        "chmod_world_writable",
        r"\bchmod\s+(?:\S+\s+)*?(?:0?777|a\+rwx|o\+w)\b",
        Action::Warn,
        Severity::Medium,
        "Setting world-writable permissions",
    ),
];

/// The core set as a pack definition, ready for the registry builder.
pub fn core_pack() -> PackDefinition {
    PackDefinition::from_rules(
        PackMeta {
            name: CORE_PACK.to_string(),
            description: Some("Always-loaded base patterns".to_string()),
        },
        CORE_RULES,
    )
}
