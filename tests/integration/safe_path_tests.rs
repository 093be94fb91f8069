//! Deletions inside disposable directories

use std::fs;
use std::path::Path;
use std::sync::Arc;

use dcg::{Guard, PatternRegistry, SafePaths, Verdict};
use tempfile::TempDir;

struct Project {
    root: TempDir,
    guard: Guard,
}

impl Project {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join("node_modules/.cache")).unwrap();
        fs::create_dir_all(root.path().join("target/debug")).unwrap();
        fs::create_dir_all(root.path().join("src")).unwrap();

        let guard = guard_for(&["node_modules", "target"], Some(root.path()));
        Self { root, guard }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    fn check(&self, command: &str) -> Verdict {
        self.guard.evaluate(command, "integration")
    }
}

fn guard_for(entries: &[&str], root: Option<&Path>) -> Guard {
    Guard::new(
        Arc::new(PatternRegistry::core()),
        Arc::new(SafePaths::new(entries, root)),
    )
}

#[test]
fn test_rm_in_safe_path_allowed() {
    let project = Project::new();
    assert!(project.check("rm -rf ./node_modules").is_allow());
    assert!(project.check("rm -rf node_modules/.cache").is_allow());
    assert!(project.check("rm -rf target/debug node_modules").is_allow());
    assert!(project.check("rm -r 'target'").is_allow());
}

#[test]
fn test_rm_missing_target_inside_safe_path_allowed() {
    let project = Project::new();
    assert!(project.check("rm -rf target/release").is_allow());
}

#[test]
fn test_absolute_operand_inside_safe_path_allowed() {
    let project = Project::new();
    let command = format!("rm -rf {}/target/debug", project.path().display());
    assert!(project.check(&command).is_allow());
}

#[test]
fn test_project_root_variable_expanded() {
    let project = Project::new();
    assert!(project.check("rm -rf $PROJECT_ROOT/node_modules").is_allow());
    assert!(project.check("rm -rf ${PROJECT_ROOT}/target").is_allow());
}

#[test]
fn test_one_unsafe_operand_blocks() {
    let project = Project::new();
    let verdict = project.check("rm -rf node_modules src");
    assert!(verdict.is_block());
    assert_eq!(verdict.pattern_id.as_deref(), Some("fs_rm_recursive_force"));
}

#[test]
fn test_parent_traversal_never_allowed() {
    let project = Project::new();
    assert!(!project.check("rm -rf ../../etc").is_allow());
    assert!(!project.check("rm -rf node_modules/../src").is_allow());
    assert!(!project.check("rm -rf target/../../").is_allow());
}

#[test]
fn test_unknown_variable_not_safe() {
    let project = Project::new();
    assert!(project.check("rm -rf $DCG_TEST_UNSET_VAR/node_modules").is_block());
}

#[test]
fn test_hidden_glob_not_safe() {
    let project = Project::new();
    assert!(project.check("rm -rf node_modules/.*").is_block());
}

#[cfg(unix)]
#[test]
fn test_symlink_escape_not_safe() {
    let project = Project::new();
    std::os::unix::fs::symlink(
        project.path().join("src"),
        project.path().join("node_modules/escape"),
    )
    .unwrap();

    assert!(project.check("rm -rf node_modules/escape/").is_block());
}

#[test]
fn test_each_segment_judged_separately() {
    let project = Project::new();
    let verdict = project.check("rm -rf node_modules && rm -rf src");
    assert!(verdict.is_block());
    assert_eq!(verdict.segment_offset, Some(23));
}

#[test]
fn test_safe_path_does_not_exempt_other_patterns() {
    let project = Project::new();
    let verdict = project.check("rm -rf node_modules && git reset --hard");
    assert!(verdict.is_block());
    assert_eq!(verdict.pattern_id.as_deref(), Some("git_reset_hard"));
}

#[test]
fn test_root_and_home_entries_rejected() {
    let dir = TempDir::new().unwrap();
    let paths = SafePaths::new(["/", "~"], Some(dir.path()));
    assert!(paths.is_empty());

    let guard = guard_for(&["/", "~"], Some(dir.path()));
    assert!(guard.evaluate("rm -rf /", "integration").is_block());
    assert!(guard.evaluate("rm -rf ~", "integration").is_block());
}

#[test]
fn test_relative_operand_without_root_not_safe() {
    let scratch = TempDir::new().unwrap();
    let entry = scratch.path().to_string_lossy().into_owned();
    let guard = guard_for(&[entry.as_str()], None);

    assert!(guard.evaluate("rm -rf build", "integration").is_block());

    let absolute = format!("rm -rf {}/build", scratch.path().display());
    assert!(guard.evaluate(&absolute, "integration").is_allow());
}

#[test]
fn test_no_safe_paths_blocks_everything() {
    let guard = Guard::default();
    assert!(guard.evaluate("rm -rf ./node_modules", "integration").is_block());
}
