//! Integration test: exit codes of the `dep-fence` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const CYCLIC_GRAPH: &str = r#"{"modules": [
    {"source": "src/services/a.ts", "dependencies": [{"resolved": "src/routes/b.ts"}]},
    {"source": "src/routes/b.ts", "dependencies": [{"resolved": "src/services/a.ts"}]}
]}"#;

const CLEAN_GRAPH: &str = r#"{"modules": [
    {"source": "src/routes/b.ts", "dependencies": [{"resolved": "src/services/a.ts"}]},
    {"source": "src/services/a.ts", "dependencies": []}
]}"#;

fn dep_fence(project: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dep-fence"))
        .arg("--project")
        .arg(project)
        .args(args)
        .env("DEP_FENCE_CONFIG_DIR", project.join("no-global"))
        .output()
        .expect("binary should run")
}

fn project_with(graph: &str) -> TempDir {
    let tmp = TempDir::new().expect("tempdir");
    fs::write(tmp.path().join("graph.json"), graph).expect("write graph");
    tmp
}

#[test]
fn violations_exit_with_one() {
    let tmp = project_with(CYCLIC_GRAPH);
    let graph = tmp.path().join("graph.json");
    let out = dep_fence(tmp.path(), &["check", graph.to_str().unwrap(), "-f", "compact"]);

    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("error [no-services-to-routes] src/services/a.ts -> src/routes/b.ts"));
    assert!(stdout.contains("[no-circular]"));
}

#[test]
fn clean_graph_exits_with_zero() {
    let tmp = project_with(CLEAN_GRAPH);
    let graph = tmp.path().join("graph.json");
    let out = dep_fence(tmp.path(), &["check", graph.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("Found 0 error(s)"));
}

#[test]
fn bad_config_exits_with_two() {
    let tmp = project_with(CLEAN_GRAPH);
    fs::write(tmp.path().join("dep-fence.toml"), "extends = [\"hexagonal\"]\n").expect("write");
    let graph = tmp.path().join("graph.json");
    let out = dep_fence(tmp.path(), &["check", graph.to_str().unwrap()]);

    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown preset `hexagonal`"));
}

#[test]
fn cycles_command_reports_cycle() {
    let tmp = project_with(CYCLIC_GRAPH);
    let graph = tmp.path().join("graph.json");
    let out = dep_fence(tmp.path(), &["cycles", graph.to_str().unwrap(), "-f", "compact"]);

    assert_eq!(out.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&out.stdout),
        "src/services/a.ts -> src/routes/b.ts -> src/services/a.ts\n"
    );
}

#[test]
fn init_then_check_uses_written_config() {
    let tmp = project_with(CYCLIC_GRAPH);
    let init = dep_fence(tmp.path(), &["init", "--preset", "frontend"]);
    assert_eq!(init.status.code(), Some(0));

    let graph = tmp.path().join("graph.json");
    let out = dep_fence(tmp.path(), &["check", graph.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
}

#[test]
fn zero_cycle_cap_is_a_usage_error() {
    let tmp = project_with(CYCLIC_GRAPH);
    let graph = tmp.path().join("graph.json");
    let out = dep_fence(
        tmp.path(),
        &["check", graph.to_str().unwrap(), "--max-cycles", "0"],
    );

    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
}

#[test]
fn config_next_to_graph_found_without_project_flag() {
    let tmp = TempDir::new().expect("tempdir");
    let package = tmp.path().join("packages/web");
    fs::create_dir_all(package.join(".git")).expect("mkdir");
    fs::write(package.join("graph.json"), CYCLIC_GRAPH).expect("write graph");
    fs::write(package.join("dep-fence.toml"), "extends = [\"frontend\"]\n").expect("write config");

    let graph = package.join("graph.json");
    let out = Command::new(env!("CARGO_BIN_EXE_dep-fence"))
        .args(["check", graph.to_str().unwrap()])
        .env("DEP_FENCE_CONFIG_DIR", tmp.path().join("no-global"))
        .output()
        .expect("binary should run");

    // the built-in base preset would fail this graph
    assert_eq!(out.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&out.stdout).contains("0 error(s)"));
}
