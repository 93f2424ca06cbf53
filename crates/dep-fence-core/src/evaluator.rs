//! Rule evaluation against a dependency graph.

use std::num::NonZeroUsize;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cycles::{Cycle, CycleDetector};
use crate::graph::DependencyGraph;
use crate::rule::{Rule, RuleSet};
use crate::types::{EvaluationReport, Violation};

/// Builder for configuring an [`Evaluator`].
#[derive(Debug, Clone)]
pub struct EvaluatorBuilder {
    parallel: bool,
    max_cycles_per_rule: Option<NonZeroUsize>,
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self {
            parallel: true,
            max_cycles_per_rule: None,
        }
    }
}

impl EvaluatorBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether rules are evaluated on the rayon pool (default: true).
    #[must_use]
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Caps the violations a single circular rule may report.
    ///
    /// The cap is nonzero: a circular rule that matches at least one
    /// cycle always reports it.
    #[must_use]
    pub fn max_cycles_per_rule(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_cycles_per_rule = limit;
        self
    }

    /// Builds the evaluator.
    #[must_use]
    pub fn build(self) -> Evaluator {
        Evaluator {
            parallel: self.parallel,
            max_cycles_per_rule: self.max_cycles_per_rule,
        }
    }
}

/// Evaluates a [`RuleSet`] against a [`DependencyGraph`].
///
/// Output order is rule declaration order, then edge order (or cycle
/// discovery order for circular rules), whether or not rules run in
/// parallel.
#[derive(Debug, Clone)]
pub struct Evaluator {
    parallel: bool,
    max_cycles_per_rule: Option<NonZeroUsize>,
}

impl Default for Evaluator {
    fn default() -> Self {
        EvaluatorBuilder::default().build()
    }
}

impl Evaluator {
    /// Creates a new builder for configuring an evaluator.
    #[must_use]
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    /// Returns true if rules are evaluated in parallel.
    #[must_use]
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Returns the per-rule cycle cap, if any.
    #[must_use]
    pub fn max_cycles_per_rule(&self) -> Option<NonZeroUsize> {
        self.max_cycles_per_rule
    }

    /// Runs every rule and collects the violations into a report.
    #[must_use]
    pub fn evaluate(&self, graph: &DependencyGraph, rules: &RuleSet) -> EvaluationReport {
        let detector = rules.has_circular().then(|| CycleDetector::new(graph));
        let detector = detector.as_ref();

        let per_rule: Vec<Vec<Violation>> = if self.parallel {
            rules
                .rules()
                .par_iter()
                .map(|rule| self.evaluate_rule(graph, detector, rule))
                .collect()
        } else {
            rules
                .iter()
                .map(|rule| self.evaluate_rule(graph, detector, rule))
                .collect()
        };

        let report = EvaluationReport {
            violations: per_rule.into_iter().flatten().collect(),
            modules_checked: graph.module_count(),
            edges_checked: graph.edge_count(),
            rules_evaluated: rules.len(),
        };

        let (errors, warnings, infos) = report.count_by_severity();
        info!(
            rules = report.rules_evaluated,
            modules = report.modules_checked,
            edges = report.edges_checked,
            errors,
            warnings,
            infos,
            "evaluation complete"
        );
        report
    }

    fn evaluate_rule(
        &self,
        graph: &DependencyGraph,
        detector: Option<&CycleDetector<'_>>,
        rule: &Rule,
    ) -> Vec<Violation> {
        let violations = match (rule.is_circular(), detector) {
            (true, Some(detector)) => self.cycle_violations(detector, rule),
            (true, None) => Vec::new(),
            (false, _) => edge_violations(graph, rule),
        };
        debug!(
            rule = rule.name(),
            circular = rule.is_circular(),
            violations = violations.len(),
            "rule evaluated"
        );
        violations
    }

    fn cycle_violations(&self, detector: &CycleDetector<'_>, rule: &Rule) -> Vec<Violation> {
        let limit = self.max_cycles_per_rule.map_or(usize::MAX, NonZeroUsize::get);
        let mut violations = Vec::new();

        for cycle in detector.cycles() {
            let Some(violation) = cycle_violation(rule, cycle) else {
                continue;
            };
            if violations.len() == limit {
                warn!(
                    rule = rule.name(),
                    limit, "cycle limit reached, remaining cycles not reported"
                );
                break;
            }
            violations.push(violation);
        }
        violations
    }
}

fn edge_violations(graph: &DependencyGraph, rule: &Rule) -> Vec<Violation> {
    graph
        .edges()
        .filter(|(from, to)| rule.matches_edge(from.path(), to.path()))
        .map(|(from, to)| {
            Violation::edge(rule.name(), rule.severity(), from.path(), to.path())
                .with_comment(rule.comment())
        })
        .collect()
}

/// Builds the violation for `cycle`, or `None` when `rule.from` selects
/// no module on it.
///
/// The reported edge starts at the first selected module and ends at its
/// successor on the cycle.
fn cycle_violation(rule: &Rule, cycle: Cycle) -> Option<Violation> {
    let position = cycle
        .members()
        .iter()
        .position(|m| rule.from().matches(m))?;
    let modules = cycle.into_modules();
    let from = modules[position].clone();
    let to = modules[position + 1].clone();
    Some(
        Violation::edge(rule.name(), rule.severity(), from, to)
            .with_comment(rule.comment())
            .with_cycle(modules),
    )
}

/// Evaluates `rules` against `graph` with default settings.
#[must_use]
pub fn evaluate(graph: &DependencyGraph, rules: &RuleSet) -> Vec<Violation> {
    Evaluator::default().evaluate(graph, rules).violations
}
