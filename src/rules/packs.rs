//! Built-in extension packs
//!
//! Optional named pattern sets that can be enabled in config on top of the
//! core set.

use crate::rules::pack::{PackDefinition, PackMeta};
use crate::rules::{Action, Rule, Severity};

/// Database DDL and data loss
pub const DATABASE_RULES: &[Rule] = &[
    Rule::new(
        "db_drop_database",
        r"(?i)\bDROP\s+(?:DATABASE|SCHEMA)\b",
        Action::Block,
        Severity::Critical,
        "Dropping a database",
    ),
    Rule::new(
        "db_drop_table",
        r"(?i)\bDROP\s+TABLE\b",
        Action::Block,
        Severity::High,
        "Dropping a table",
    ),
    Rule::new(
        "db_truncate",
        r"(?i)\bTRUNCATE\s+(?:TABLE\s+)?\w",
        Action::Warn,
        Severity::Medium,
        "Truncating a table",
    ),
    Rule::new(
        "db_delete_without_where",
        r#"(?i)\bDELETE\s+FROM\s+[\w."`]+\s*(?:;|$|["'])"#,
        Action::Warn,
        Severity::Medium,
        "DELETE without a WHERE clause removes every row",
    ),
    Rule::new(
        "db_redis_flush",
        r"(?i)\bredis-cli\b.*\bflush(?:all|db)\b",
        Action::Block,
        Severity::High,
        "Flushing Redis data",
    ),
];

/// Container and orchestration cleanup
pub const CONTAINER_RULES: &[Rule] = &[
    Rule::new(
        "docker_system_prune",
        r"\bdocker\s+system\s+prune\b",
        Action::Warn,
        Severity::Medium,
        "docker system prune removes containers, networks and images",
    ),
    Rule::new(
        "docker_volume_delete",
        r"\bdocker\s+volume\s+(?:prune|rm)\b",
        Action::Block,
        Severity::High,
        "Deleting docker volumes destroys their data",
    ),
    Rule::new(
        "docker_privileged",
        r"\bdocker\s+run\b.*--privileged",
        Action::Warn,
        Severity::High,
        "Running a privileged container",
    ),
    Rule::new(
        "docker_host_root_mount",
        r"\bdocker\s+run\b.*\s-v\s+/:/",
        Action::Block,
        Severity::High,
        "Mounting the host root into a container",
    ),
    Rule::new(
        "kubectl_delete_namespace",
        r"\bkubectl\s+(?:\S+\s+)*?delete\s+(?:ns|namespaces?)\b",
        Action::Block,
        Severity::Critical,
        "Deleting a Kubernetes namespace deletes everything in it",
    ),
    Rule::new(
        "kubectl_delete_all",
        r"\bkubectl\s+(?:\S+\s+)*?delete\b.*\s--all\b",
        Action::Block,
        Severity::High,
        "kubectl delete --all",
    ),
];

/// Cautionary rules for stricter environments
pub const STRICT_RULES: &[Rule] = &[
    Rule::new(
        "strict_sudo_rm",
        r"\bsudo\s+(?:-\S+\s+)*rm\b",
        Action::Warn,
        Severity::Medium,
        "Using sudo with rm",
    ),
    Rule::new(
        "fs_rm_wildcard",
        r#"(?:^|[;&|(`"'/]\s*)rm\s+(?:-\S+\s+)*\*"#,
        Action::Warn,
        Severity::Low,
        "Deleting with a bare wildcard",
    ),
    Rule::new(
        "strict_kill_all",
        r"\b(?:killall|pkill)\s+-9\b",
        Action::Warn,
        Severity::Low,
        "Force killing processes by name",
    ),
    Rule::new(
        "strict_history_clear",
        r"\bhistory\s+-c\b",
        Action::Warn,
        Severity::Low,
        "Clearing shell history",
    ),
    Rule::new(
        "strict_npm_cache_clean",
        r"\bnpm\s+cache\s+clean\s+--force\b",
        Action::Warn,
        Severity::Low,
        "Clearing the npm cache",
    ),
];

/// Names of all built-in extension packs
pub const BUILTIN_PACKS: &[&str] = &["database", "containers", "strict"];

/// Look up a built-in pack by name
pub fn builtin(name: &str) -> Option<PackDefinition> {
    let (description, rules) = match name {
        "database" => ("SQL DDL and data-store flushes", DATABASE_RULES),
        "containers" => ("Docker and Kubernetes cleanup", CONTAINER_RULES),
        "strict" => ("Cautionary rules", STRICT_RULES),
        _ => return None,
    };

    Some(PackDefinition::from_rules(
        PackMeta {
            name: name.to_string(),
            description: Some(description.to_string()),
        },
        rules,
    ))
}
