//! Shared output formatting for check results.

use std::fmt::Write;

use anyhow::Result;
use dep_fence_core::{EvaluationReport, Severity};

use crate::OutputFormat;

/// Print check results in the specified format.
pub fn print(report: &EvaluationReport, format: OutputFormat) -> Result<()> {
    let color = std::io::IsTerminal::is_terminal(&std::io::stdout());
    print!("{}", render(report, format, color)?);
    Ok(())
}

/// Renders check results in the specified format.
pub fn render(report: &EvaluationReport, format: OutputFormat, color: bool) -> Result<String> {
    Ok(match format {
        OutputFormat::Text => render_text(report, color),
        OutputFormat::Json => render_json(report)?,
        OutputFormat::Compact => render_compact(report),
    })
}

fn paint(text: &str, code: &str, color: bool) -> String {
    if color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn severity_code(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "31",
        Severity::Warn => "33",
        Severity::Info => "34",
    }
}

fn render_text(report: &EvaluationReport, color: bool) -> String {
    let (errors, warnings, infos) = report.count_by_severity();
    let mut out = String::new();

    for violation in &report.violations {
        let severity = violation.severity.to_string();
        let _ = writeln!(
            out,
            "{} {} -> {}",
            violation.rule, violation.from, violation.to
        );
        let _ = writeln!(
            out,
            "  {}: {}",
            paint(&severity, severity_code(violation.severity), color),
            violation.headline()
        );
        if let Some(cycle) = &violation.cycle {
            let _ = writeln!(out, "  = cycle: {}", cycle.join(" -> "));
        }
        out.push('\n');
    }

    let summary_code = if errors > 0 {
        "31"
    } else if warnings > 0 {
        "33"
    } else {
        "32"
    };
    let summary = format!(
        "Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} module(s), {} rule(s)",
        report.modules_checked, report.rules_evaluated
    );
    let _ = writeln!(out, "{}", paint(&summary, summary_code, color));
    out
}

fn render_json(report: &EvaluationReport) -> Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

fn render_compact(report: &EvaluationReport) -> String {
    report
        .violations
        .iter()
        .map(|v| format!("{v}\n"))
        .collect()
}
