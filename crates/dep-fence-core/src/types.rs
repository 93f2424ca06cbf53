//! Core types for rule violations and evaluation results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level attached to a rule and its violations.
///
/// Severity never changes what the evaluator reports; it is metadata
/// for the host deciding whether a run passes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail a check.
    Info,
    /// Warning that should be addressed (e.g. during a migration period).
    #[serde(alias = "warning")]
    Warn,
    /// Error that must be fixed.
    #[default]
    Error,
}

impl Severity {
    /// Parses a severity name as written in rule configuration.
    ///
    /// Accepts `error`, `warn`, `warning` and `info`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        })
    }
}

/// A forbidden dependency found during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the rule that produced this violation.
    pub rule: String,
    /// Severity copied from the rule.
    pub severity: Severity,
    /// Human comment copied from the rule.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Depending module.
    pub from: String,
    /// Module depended upon.
    pub to: String,
    /// Closed module path for circular violations (first == last).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle: Option<Vec<String>>,
}

impl Violation {
    /// Creates a violation for a single forbidden edge.
    #[must_use]
    pub fn edge(
        rule: impl Into<String>,
        severity: Severity,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            rule: rule.into(),
            severity,
            comment: String::new(),
            from: from.into(),
            to: to.into(),
            cycle: None,
        }
    }

    /// Attaches the rule comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Attaches a closed cycle path.
    #[must_use]
    pub fn with_cycle(mut self, cycle: Vec<String>) -> Self {
        self.cycle = Some(cycle);
        self
    }

    /// Returns true if this violation reports a dependency cycle.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        self.cycle.is_some()
    }

    /// Formats the violation for multi-line terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        use std::fmt::Write;
        let mut output = format!("{} {} -> {}\n", self.rule, self.from, self.to);
        let _ = writeln!(output, "  {}: {}", self.severity, self.headline());
        if let Some(cycle) = &self.cycle {
            let _ = writeln!(output, "  = cycle: {}", cycle.join(" -> "));
        }
        output
    }

    /// The rule comment, or a generic description when the rule has none.
    #[must_use]
    pub fn headline(&self) -> &str {
        if self.comment.is_empty() {
            if self.is_circular() {
                "circular dependency"
            } else {
                "forbidden dependency"
            }
        } else {
            &self.comment
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {} -> {}",
            self.severity, self.rule, self.from, self.to
        )?;
        if let Some(cycle) = &self.cycle {
            write!(f, " (cycle: {})", cycle.join(" -> "))?;
        }
        Ok(())
    }
}

/// Result of evaluating a rule set against a dependency graph.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// All violations, in rule declaration order then discovery order.
    pub violations: Vec<Violation>,
    /// Number of modules in the evaluated graph.
    pub modules_checked: usize,
    /// Number of distinct edges in the evaluated graph.
    pub edges_checked: usize,
    /// Number of rules evaluated.
    pub rules_evaluated: usize,
}

impl EvaluationReport {
    /// Creates a new empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any error-level violations.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_violations_at(Severity::Error)
    }

    /// Checks if any violations meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.violations.iter().any(|v| v.severity >= severity)
    }

    /// Returns violations with exactly the given severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == severity)
            .collect()
    }

    /// Returns violations produced by the named rule.
    #[must_use]
    pub fn by_rule(&self, rule: &str) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.rule == rule).collect()
    }

    /// Counts violations by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.violations
            .iter()
            .fold((0, 0, 0), |(e, w, i), v| match v.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warn => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }
}
