//! Integration tests for the assert-migrate crate.

use assert_migrate::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn copy_tree(from: &Path, to: &Path) {
    for entry in walkdir::WalkDir::new(from) {
        let entry = entry.unwrap();
        let target = to.join(entry.path().strip_prefix(from).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).unwrap();
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// Copies `<name>/before` into a temp dir.
fn checkout(name: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    copy_tree(&fixture(name).join("before"), dir.path());
    dir
}

fn assert_matches_after(name: &str, dir: &Path, file: &str) {
    let expected = fs::read_to_string(fixture(name).join("after").join(file)).unwrap();
    let actual = fs::read_to_string(dir.join(file)).unwrap();
    assert_eq!(actual, expected, "{file} differs from the expected rewrite");
}

#[test]
fn test_assertions_fixture() {
    let dir = checkout("assertions");

    let log = Migration::preset(dir.path(), &fluent_to_xunit())
        .unwrap()
        .apply()
        .unwrap();

    assert_eq!(log.files_changed(), 1);
    assert_eq!(log.files_scanned, 2);
    assert_eq!(log.files_skipped, 1);
    assert!(log.failures.is_empty());
    assert_eq!(log.unresolved_count(), 0);
    assert_matches_after("assertions", dir.path(), "Tests/StateMachineTests.cs");
    assert_matches_after("assertions", dir.path(), "Tests/Helpers.cs");
}

#[test]
fn test_assertions_second_run_is_noop() {
    let dir = checkout("assertions");
    let preset = fluent_to_xunit();

    Migration::preset(dir.path(), &preset).unwrap().apply().unwrap();
    let second = Migration::preset(dir.path(), &preset).unwrap().apply().unwrap();

    assert_eq!(second.files_changed(), 0);
    assert_matches_after("assertions", dir.path(), "Tests/StateMachineTests.cs");
}

#[test]
fn test_hits_name_the_rules_that_fired() {
    let dir = checkout("assertions");

    let log = Migration::preset(dir.path(), &fluent_to_xunit())
        .unwrap()
        .dry_run()
        .apply()
        .unwrap();

    let change = &log.changes[0];
    let rules: Vec<_> = change.hits.iter().map(|h| h.rule.as_str()).collect();
    assert!(rules.contains(&"contains-be-true"));
    assert!(rules.contains(&"contains-be-false"));
    assert!(rules.contains(&"fluent-have-count"));
    assert!(rules.contains(&"repair-receiver-prefixed-pair"));
    assert!(!rules.contains(&"fluent-be-true"));
    assert_eq!(change.replacements(), 11);
}

#[test]
fn test_quotes_fixture() {
    let dir = checkout("quotes");

    let log = Migration::preset(dir.path(), &json_quotes())
        .unwrap()
        .backup(".bak")
        .apply()
        .unwrap();

    assert_eq!(log.files_changed(), 1);
    assert_matches_after("quotes", dir.path(), "Tests/ScriptTests.cs");

    let backup = fs::read_to_string(dir.path().join("Tests/ScriptTests.cs.bak")).unwrap();
    let before = fs::read_to_string(fixture("quotes").join("before/Tests/ScriptTests.cs")).unwrap();
    assert_eq!(backup, before);
}

#[test]
fn test_quote_pipeline_ignores_assertions() {
    let dir = checkout("assertions");

    let log = Migration::preset(dir.path(), &json_quotes())
        .unwrap()
        .apply()
        .unwrap();

    assert_eq!(log.files_changed(), 0);
    assert_eq!(log.files_skipped, 2);
}

#[test]
fn test_dry_run_diff() {
    let dir = checkout("assertions");

    let log = Migration::preset(dir.path(), &fluent_to_xunit())
        .unwrap()
        .dry_run()
        .apply()
        .unwrap();

    let diff = log.diff();
    assert!(diff.contains("-        machine.Should().NotBeNull();"));
    assert!(diff.contains("+        Assert.NotNull(machine);"));
    assert!(log.summary.insertions > 0);
    assert!(log.to_string().starts_with("Total files would change: 1"));

    // Nothing written.
    let content = fs::read_to_string(dir.path().join("Tests/StateMachineTests.cs")).unwrap();
    assert!(content.contains(".Should()"));
}

#[test]
fn test_build_output_excluded() {
    let dir = checkout("assertions");
    fs::create_dir_all(dir.path().join("obj/Debug")).unwrap();
    fs::write(dir.path().join("obj/Debug/Generated.cs"), "x.Should().BeTrue();\n").unwrap();

    let log = Migration::preset(dir.path(), &fluent_to_xunit())
        .unwrap()
        .apply()
        .unwrap();

    assert_eq!(log.files_scanned, 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("obj/Debug/Generated.cs")).unwrap(),
        "x.Should().BeTrue();\n"
    );
}

#[test]
fn test_config_extra_rule_runs_last() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Flags.cs"),
        "ok.Should().BeTrue();\nchecker.Assert.True(flag);\n",
    )
    .unwrap();
    let config_path = dir.path().join("migrate.yaml");
    fs::write(
        &config_path,
        r#"
extra_rules:
  - name: repair-receiver-prefixed-true
    pattern: '\b[a-z_]\w*\.Assert\.True\((\w+)\)'
    replacement: 'Assert.True($1)'
    repairs: fluent-be-true
"#,
    )
    .unwrap();

    let config = MigrateConfig::load(&config_path).unwrap();
    let pipeline = config.extend(fluent_to_xunit().pipeline().unwrap()).unwrap();
    let log = Migration::new(dir.path(), pipeline)
        .selecting(config.selector())
        .apply()
        .unwrap();

    assert_eq!(log.files_changed(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("Flags.cs")).unwrap(),
        "Assert.True(ok);\nAssert.True(flag);\n"
    );
}

#[test]
fn test_misordered_config_rule_rejected() {
    let dir = TempDir::new().unwrap();
    let config = MigrateConfig {
        extra_rules: vec![RuleSpec::new("needs-later-rule", "a", "b")],
        ..Default::default()
    };
    let pipeline = config
        .extend(Pipeline::new("p").pass(Pass::new("first").rule(
            PatternRule::new("early", "x", "y").unwrap().repairs("needs-later-rule"),
        )))
        .unwrap();

    let result = Migration::new(dir.path(), pipeline).apply();
    assert!(matches!(result, Err(MigrateError::RuleOrder { rule, .. }) if rule == "early"));
}

#[test]
fn test_unresolved_chains_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("Chains.cs"),
        "result\n    .Should()\n    .Be(3);\nother.Should().BeOfType<int>();\n",
    )
    .unwrap();

    let log = Migration::preset(dir.path(), &fluent_to_xunit())
        .unwrap()
        .apply()
        .unwrap();

    assert_eq!(log.files_changed(), 0);
    let lines: Vec<_> = log.unresolved[0].cases.iter().map(|c| c.line).collect();
    assert_eq!(lines, [2, 4]);
}
