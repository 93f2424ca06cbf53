//! Check command implementation.

use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dep_fence_core::{EvaluationReport, Evaluator, Severity};

use super::Status;
use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Arguments for `dep-fence check`.
#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// JSON module graph (`-` for stdin)
    pub graph: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Use these presets instead of the configured `extends` (comma-separated)
    #[arg(long)]
    pub preset: Option<String>,

    /// Lowest severity that fails the run (error, warn, info)
    #[arg(long, value_parser = parse_severity)]
    pub fail_on: Option<Severity>,

    /// Evaluate rules on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Maximum violations reported per circular rule (at least 1)
    #[arg(long)]
    pub max_cycles: Option<NonZeroUsize>,
}

fn parse_severity(value: &str) -> Result<Severity, String> {
    Severity::parse(value).ok_or_else(|| format!("unknown severity `{value}`"))
}

/// Runs the check command.
pub fn run(args: &CheckArgs, source: &ConfigSource) -> Result<Status> {
    let (report, fail_on) = evaluate(args, source)?;

    super::output::print(&report, args.format)?;

    if report.has_violations_at(fail_on) {
        Ok(Status::Failed)
    } else {
        Ok(Status::Clean)
    }
}

/// Loads configuration, rules and graph, then evaluates.
///
/// Every input is loaded before evaluation starts, so configuration
/// problems never produce a partial report.
fn evaluate(args: &CheckArgs, source: &ConfigSource) -> Result<(EvaluationReport, Severity)> {
    let config = source.load()?;
    let rules = super::resolve_rules(&config, args.preset.as_deref())?;
    let graph = super::read_graph(&args.graph)?;

    let evaluator = Evaluator::builder()
        .parallel(config.engine.parallel && !args.sequential)
        .max_cycles_per_rule(args.max_cycles.or(config.engine.max_cycles_per_rule))
        .build();

    tracing::info!(
        "Checking {} module(s) with {} rule(s)",
        graph.module_count(),
        rules.len()
    );

    let report = evaluator.evaluate(&graph, &rules);
    Ok((report, args.fail_on.unwrap_or(config.fail_on)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const GRAPH: &str = r#"{"modules": [
        {"source": "src/routes/user.ts", "dependencies": [{"resolved": "src/services/user.ts"}]},
        {"source": "src/services/user.ts", "dependencies": [{"resolved": "src/repositories/user.ts"}]},
        {"source": "src/repositories/user.ts", "dependencies": [{"resolved": "src/routes/user.ts"}]}
    ]}"#;

    fn args(graph: PathBuf) -> CheckArgs {
        CheckArgs {
            graph,
            format: OutputFormat::Compact,
            preset: None,
            fail_on: None,
            sequential: false,
            max_cycles: None,
        }
    }

    fn project(config: Option<&str>) -> (TempDir, ConfigSource) {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("graph.json"), GRAPH).unwrap();
        let source = match config {
            Some(content) => {
                let path = tmp.path().join("dep-fence.toml");
                fs::write(&path, content).unwrap();
                ConfigSource::Project(path)
            }
            None => ConfigSource::Builtin,
        };
        (tmp, source)
    }

    #[test]
    fn base_preset_flags_repository_cycle() {
        let (tmp, source) = project(None);
        let (report, fail_on) = evaluate(&args(tmp.path().join("graph.json")), &source).unwrap();

        let rules: Vec<&str> = report.violations.iter().map(|v| v.rule.as_str()).collect();
        assert_eq!(rules, vec!["no-repositories-to-routes", "no-circular"]);
        assert_eq!(fail_on, Severity::Error);
        assert!(report.has_violations_at(fail_on));
    }

    #[test]
    fn ddd_only_preset_reports_warning() {
        let (tmp, source) = project(Some("extends = [\"ddd\"]\n"));
        let (report, fail_on) = evaluate(&args(tmp.path().join("graph.json")), &source).unwrap();

        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].rule, "no-routes-to-services-directly");
        assert!(!report.has_violations_at(fail_on));
    }

    #[test]
    fn fail_on_flag_overrides_config() {
        let (tmp, source) = project(Some("extends = [\"ddd\"]\n"));
        let mut check = args(tmp.path().join("graph.json"));
        check.fail_on = Some(Severity::Warn);

        assert_eq!(run(&check, &source).unwrap(), Status::Failed);
    }

    #[test]
    fn clean_graph_passes() {
        let (tmp, source) = project(Some("extends = [\"frontend\"]\n"));
        assert_eq!(
            run(&args(tmp.path().join("graph.json")), &source).unwrap(),
            Status::Clean
        );
    }

    #[test]
    fn invalid_config_fails_before_evaluation() {
        let (tmp, source) = project(Some("[[forbidden]]\nname = \"bad\"\nseverity = \"fatal\"\n"));
        let err = evaluate(&args(tmp.path().join("graph.json")), &source).unwrap_err();
        assert!(format!("{err:#}").contains("unknown severity `fatal`"));
    }

    #[test]
    fn missing_graph_is_an_error() {
        let (tmp, source) = project(None);
        let err = evaluate(&args(tmp.path().join("missing.json")), &source).unwrap_err();
        assert!(err.to_string().starts_with("Failed to read graph"));
    }

    #[test]
    fn max_cycles_flag_overrides_config_cap() {
        let (tmp, source) = project(Some(
            "extends = [\"base\"]\n[engine]\nmax_cycles_per_rule = 5\n",
        ));
        let mut check = args(tmp.path().join("graph.json"));
        check.max_cycles = NonZeroUsize::new(1);

        let (report, _) = evaluate(&check, &source).unwrap();
        let cycles = report.violations.iter().filter(|v| v.is_circular()).count();
        assert_eq!(cycles, 1);
    }

    #[test]
    fn zero_max_cycles_flag_rejected() {
        #[derive(clap::Parser)]
        struct Harness {
            #[command(flatten)]
            check: CheckArgs,
        }

        let err = <Harness as clap::Parser>::try_parse_from(["check", "graph.json", "--max-cycles", "0"]);
        assert!(err.is_err());

        let ok = <Harness as clap::Parser>::try_parse_from(["check", "graph.json", "--max-cycles", "2"])
            .unwrap();
        assert_eq!(ok.check.max_cycles, NonZeroUsize::new(2));
    }

    #[test]
    fn parse_severity_accepts_aliases() {
        assert_eq!(parse_severity("warning"), Ok(Severity::Warn));
        assert!(parse_severity("fatal").is_err());
    }
}
