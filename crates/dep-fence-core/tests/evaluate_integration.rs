//! Integration test: configuration and graph fixtures end-to-end.
//!
//! Uses fixture files under `tests/fixtures/` to verify that the full
//! TOML → DTO → rule set and JSON → graph → evaluator pipeline reports
//! the expected violations in the expected order.

use dep_fence_core::{graph_from_json, Config, DependencyGraph, Severity};
use std::num::NonZeroUsize;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn load() -> (Config, DependencyGraph) {
    let config = Config::from_file(&fixture("dep-fence.toml")).expect("fixture config should load");
    let json = std::fs::read_to_string(fixture("graph.json")).expect("fixture graph should exist");
    let graph = graph_from_json(&json).expect("fixture graph should parse");
    (config, graph)
}

// ── Happy path ──

#[test]
fn reports_expected_violations_in_rule_order() {
    let (config, graph) = load();
    let rules = config.resolve(&[]).expect("rules should resolve");
    let report = config.engine.evaluator().evaluate(&graph, &rules);

    let rendered = report
        .violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n");

    insta::assert_snapshot!(rendered, @r"
    error [no-services-to-routes] src/services/user-service.ts -> src/routes/users.ts
    error [no-utils-to-business-logic] src/utils/format.ts -> src/services/user-service.ts
    warn [no-usecases-to-repositories] src/usecases/create-user.ts -> src/repositories/user-repo.ts
    error [no-circular] src/routes/users.ts -> src/services/user-service.ts (cycle: src/routes/users.ts -> src/services/user-service.ts -> src/routes/users.ts)
    ");
}

#[test]
fn report_counts_graph_and_rules() {
    let (config, graph) = load();
    let rules = config.resolve(&[]).expect("rules should resolve");
    let report = config.engine.evaluator().evaluate(&graph, &rules);

    assert_eq!(report.modules_checked, 9);
    assert_eq!(report.edges_checked, 11);
    assert_eq!(report.rules_evaluated, 5);
    assert_eq!(report.count_by_severity(), (3, 1, 0));
    assert!(report.has_violations_at(config.fail_on));
}

#[test]
fn config_fields_survive_loading() {
    let (config, graph) = load();
    assert_eq!(config.fail_on, Severity::Error);
    assert_eq!(config.engine.max_cycles_per_rule, NonZeroUsize::new(50));
    assert_eq!(
        config.options.get("tsConfig").and_then(|v| v.as_str()),
        Some("tsconfig.json")
    );
    assert!(config.warnings().is_empty());

    let pg = graph
        .module_by_path("node_modules/pg/lib/index.js")
        .expect("external module should be present");
    assert!(pg.is_external());
    assert_eq!(pg.package(), Some("pg"));
}

// ── Overrides ──

#[test]
fn downgraded_rules_no_longer_fail_the_run() {
    let (config, graph) = load();
    let mut content =
        std::fs::read_to_string(fixture("dep-fence.toml")).expect("fixture TOML should exist");
    content.push_str(
        r#"
[rules.no-services-to-routes]
severity = "warn"

[rules.no-utils-to-business-logic]
severity = "warn"

[rules.no-circular]
enabled = false
"#,
    );
    let relaxed = Config::parse(&content).expect("relaxed config should parse");
    let rules = relaxed.resolve(&[]).expect("rules should resolve");
    let report = relaxed.engine.evaluator().evaluate(&graph, &rules);

    assert_eq!(report.violations.len(), 3);
    assert!(!report.has_violations_at(config.fail_on));
    assert!(report.has_violations_at(Severity::Warn));
}

// ── Determinism ──

#[test]
fn parallel_and_sequential_runs_agree() {
    let (config, graph) = load();
    let rules = config.resolve(&[]).expect("rules should resolve");

    let parallel = dep_fence_core::Evaluator::builder()
        .parallel(true)
        .build()
        .evaluate(&graph, &rules);
    let sequential = dep_fence_core::Evaluator::builder()
        .parallel(false)
        .build()
        .evaluate(&graph, &rules);

    let a = serde_json::to_string(&parallel.violations).expect("serialize");
    let b = serde_json::to_string(&sequential.violations).expect("serialize");
    assert_eq!(a, b);
}
