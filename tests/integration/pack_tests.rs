//! Registries built from packs

use std::io::Write;

use dcg::rules::pack::{PackMeta, PatternDef};
use dcg::{
    evaluate, Action, Config, PackDefinition, PackError, PatternRegistry, RegistryBuilder,
    SafePaths, Severity, VerdictAction,
};
use tempfile::NamedTempFile;

fn pattern(id: &str, regex: &str, action: Action, severity: Severity) -> PatternDef {
    PatternDef {
        id: id.to_string(),
        regex: regex.to_string(),
        action,
        severity,
        message: format!("{} matched", id),
    }
}

fn pack(name: &str, patterns: Vec<PatternDef>) -> PackDefinition {
    PackDefinition {
        pack: PackMeta {
            name: name.to_string(),
            description: None,
        },
        patterns,
    }
}

fn registry(packs: Vec<PackDefinition>) -> PatternRegistry {
    packs
        .into_iter()
        .try_fold(RegistryBuilder::new(), RegistryBuilder::add_pack)
        .and_then(RegistryBuilder::build)
        .unwrap()
}

fn check(registry: &PatternRegistry, command: &str) -> dcg::Verdict {
    evaluate(command, "integration", registry, &SafePaths::none())
}

// ============================================================================
// Decision properties
// ============================================================================

#[test]
fn test_highest_severity_wins_regardless_of_order() {
    let low = pack(
        "low",
        vec![pattern("frob_any", r"\bfrobnicate\b", Action::Warn, Severity::Low)],
    );
    let critical = pack(
        "critical",
        vec![pattern(
            "frob_all",
            r"\bfrobnicate\s+--all\b",
            Action::Block,
            Severity::Critical,
        )],
    );

    for packs in [
        vec![low.clone(), critical.clone()],
        vec![critical.clone(), low.clone()],
    ] {
        let registry = registry(packs);
        let verdict = check(&registry, "frobnicate --all");
        assert_eq!(verdict.pattern_id.as_deref(), Some("frob_all"));
        assert_eq!(verdict.severity, Some(Severity::Critical));
        assert_eq!(verdict.action, VerdictAction::Block);

        let verdict = check(&registry, "frobnicate one; frobnicate --all");
        assert_eq!(verdict.pattern_id.as_deref(), Some("frob_all"));
    }
}

#[test]
fn test_only_matching_pattern_reported() {
    let patterns = (0..12)
        .map(|i| {
            pattern(
                &format!("tool_{}", i),
                &format!(r"\btool{}\b", i),
                Action::Block,
                Severity::High,
            )
        })
        .collect();
    let registry = registry(vec![pack("numbered", patterns)]);
    assert_eq!(registry.len(), 12);

    for k in [0, 1, 7, 11] {
        let verdict = check(&registry, &format!("deploy tool{} --now", k));
        let expected = format!("tool_{}", k);
        assert_eq!(verdict.pattern_id.as_deref(), Some(expected.as_str()));
    }
    assert!(check(&registry, "deploy tool12").is_allow());
}

#[test]
fn test_warn_action_reported() {
    let registry = registry(vec![pack(
        "team",
        vec![pattern(
            "team_deploy_prod",
            r"\bdeploy\s+--prod\b",
            Action::Warn,
            Severity::Medium,
        )],
    )]);

    let verdict = check(&registry, "make build && deploy --prod");
    assert!(verdict.is_warn());
    assert_eq!(verdict.message.as_deref(), Some("team_deploy_prod matched"));
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_duplicate_id_last_registration_wins() {
    let registry = RegistryBuilder::new()
        .with_core()
        .add_pack(pack(
            "relaxed",
            vec![pattern(
                "git_reset_hard",
                r"\bgit\s+reset\s+--hard\b",
                Action::Warn,
                Severity::Low,
            )],
        ))
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(registry.len(), PatternRegistry::core().len());
    let verdict = check(&registry, "git reset --hard");
    assert!(verdict.is_warn());
    assert_eq!(verdict.severity, Some(Severity::Low));
}

#[test]
fn test_invalid_pack_rejected_whole() {
    let bad = pack(
        "broken",
        vec![
            pattern("fine", r"\bfine\b", Action::Warn, Severity::Low),
            pattern("broken", r"(unclosed", Action::Block, Severity::High),
        ],
    );
    let result = RegistryBuilder::new().with_core().add_pack(bad);
    assert!(matches!(result, Err(PackError::InvalidRegex { ref id, .. }) if id == "broken"));

    let empty_id = pack("nameless", vec![pattern(" ", r"x", Action::Warn, Severity::Low)]);
    assert!(matches!(
        RegistryBuilder::new().add_pack(empty_id),
        Err(PackError::EmptyId { .. })
    ));
}

#[test]
fn test_builtin_packs() {
    let registry = RegistryBuilder::new()
        .with_core()
        .add_builtin("database")
        .and_then(|b| b.add_builtin("containers"))
        .and_then(RegistryBuilder::build)
        .unwrap();

    let verdict = check(&registry, r#"psql -c "DROP TABLE users""#);
    assert!(verdict.is_block());
    assert_eq!(verdict.pattern_id.as_deref(), Some("db_drop_table"));

    let verdict = check(&registry, "kubectl delete namespace staging");
    assert_eq!(verdict.pattern_id.as_deref(), Some("kubectl_delete_namespace"));
    assert_eq!(verdict.severity, Some(Severity::Critical));

    // Core-only registry does not know about SQL
    assert!(check(&PatternRegistry::core(), r#"psql -c "DROP TABLE users""#).is_allow());
}

#[test]
fn test_unknown_builtin_pack() {
    assert!(matches!(
        RegistryBuilder::new().add_builtin("nope"),
        Err(PackError::UnknownPack(ref name)) if name == "nope"
    ));
}

#[test]
fn test_pack_file_through_config() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
        [pack]
        name = "infra"

        [[patterns]]
        id = "terraform_destroy"
        regex = '\bterraform\s+destroy\b'
        action = "BLOCK"
        severity = "HIGH"
        message = "terraform destroy tears down infrastructure"
        "#
    )
    .unwrap();

    let mut config = Config::default();
    config.packs.files = vec![file.path().to_string_lossy().into_owned()];
    let registry = config.build_registry().unwrap();

    let verdict = check(&registry, "cd infra && terraform destroy -auto-approve");
    assert!(verdict.is_block());
    assert_eq!(verdict.pattern_id.as_deref(), Some("terraform_destroy"));
    assert_eq!(
        verdict.message.as_deref(),
        Some("terraform destroy tears down infrastructure")
    );
}

#[test]
fn test_malformed_pack_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "[pack\nname = ").unwrap();
    assert!(matches!(
        RegistryBuilder::new().add_pack_file(file.path()),
        Err(PackError::Parse(_))
    ));

    assert!(matches!(
        RegistryBuilder::new().add_pack_file(std::path::Path::new("/nonexistent/pack.toml")),
        Err(PackError::Io { .. })
    ));
}
