//! # dep-fence-core
//!
//! Dependency-rule engine for module import graphs.
//!
//! Given a module graph produced by an external import resolver and a set
//! of declarative forbidden-dependency rules, this crate reports every
//! edge (or cycle) that breaks a rule. It includes:
//!
//! - [`PathMatcher`] for segment-aligned path patterns with `(a|b)` groups
//! - [`Rule`] and [`RuleSet`] with strict, ordered [`compose`]
//! - [`DependencyGraph`] built with [`GraphBuilder`] or from JSON
//! - [`CycleDetector`] (Tarjan SCC + Johnson) for `circular` rules
//! - [`Evaluator`] producing an [`EvaluationReport`]
//! - [`Config`] for `dep-fence.toml` files
//!
//! ## Example
//!
//! ```ignore
//! use dep_fence_core::{DependencyGraph, Evaluator, PathSelector, Rule, RuleSet};
//!
//! let graph = DependencyGraph::builder()
//!     .path("src/services/user.ts")
//!     .path("src/routes/user.ts")
//!     .edge("src/services/user.ts", "src/routes/user.ts")
//!     .build()?;
//!
//! let rules = RuleSet::new(vec![Rule::forbidden(
//!     "no-services-to-routes",
//!     PathSelector::parse("src/services")?,
//!     PathSelector::parse("src/routes")?,
//! )?])?;
//!
//! let report = Evaluator::default().evaluate(&graph, &rules);
//! assert_eq!(report.violations.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
mod cycles;
mod evaluator;
pub mod graph;
mod pattern;
mod rule;
mod types;

pub use config::{Config, EngineConfig, LoadError};
pub use cycles::{find_cycles, Cycle, CycleDetector, Cycles};
pub use evaluator::{evaluate, Evaluator, EvaluatorBuilder};
pub use graph::input::graph_from_json;
pub use graph::{DependencyGraph, GraphBuilder, GraphError, Module};
pub use pattern::{compile, PathMatcher, PatternCache, PatternError, MAX_EXPANSIONS};
pub use rule::{
    compose, PathSelector, Rule, RuleError, RuleName, RuleOverride, RuleSet, RuleSetError,
    RuleWarning,
};
pub use types::{EvaluationReport, Severity, Violation};
