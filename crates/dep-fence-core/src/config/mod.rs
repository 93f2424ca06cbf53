//! Rule configuration files.
//!
//! A `dep-fence.toml` lists presets to extend, local `[[forbidden]]`
//! rules, per-rule overrides and engine settings:
//!
//! ```toml
//! extends = ["base", "ddd"]
//! fail_on = "error"
//!
//! [engine]
//! parallel = true
//! max_cycles_per_rule = 50
//!
//! [[forbidden]]
//! name = "no-services-to-routes"
//! comment = "services must not depend on routes"
//! severity = "error"
//! from = { path = "src/services" }
//! to = { path = "src/routes" }
//!
//! [rules.no-routes-to-services-directly]
//! severity = "error"
//! ```
//!
//! Parsing goes through a serde DTO layer ([`dto`]) and a validating
//! [`loader`] into the pure [`Config`] model.

pub mod dto;
pub mod loader;

pub use loader::{load, load_rules, load_str, LoadError};

use std::num::NonZeroUsize;
use std::path::Path;

use crate::evaluator::Evaluator;
use crate::rule::{compose, RuleOverride, RuleSet, RuleSetError, RuleWarning};
use crate::types::Severity;

/// Evaluation engine settings from `[engine]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Evaluate rules in parallel.
    pub parallel: bool,
    /// Cap on violations per circular rule.
    pub max_cycles_per_rule: Option<NonZeroUsize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            max_cycles_per_rule: None,
        }
    }
}

impl EngineConfig {
    /// Builds an evaluator with these settings.
    #[must_use]
    pub fn evaluator(&self) -> Evaluator {
        Evaluator::builder()
            .parallel(self.parallel)
            .max_cycles_per_rule(self.max_cycles_per_rule)
            .build()
    }
}

/// A validated rule configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Preset names to compose before `rules`, in order.
    pub extends: Vec<String>,
    /// Lowest severity that fails a run.
    pub fail_on: Severity,
    /// Engine settings.
    pub engine: EngineConfig,
    /// Local rules.
    pub rules: RuleSet,
    /// Per-rule overrides, applied after composition.
    pub overrides: Vec<(String, RuleOverride)>,
    /// Opaque `[options]` table.
    pub options: toml::Table,
}

impl Config {
    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a rule fails validation.
    pub fn parse(content: &str) -> Result<Self, LoadError> {
        load_str(content)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::parse(&content)
    }

    /// Composes `presets` (already resolved from [`Config::extends`]) with
    /// the local rules, then applies the overrides.
    ///
    /// Warnings for the resulting rules, preset rules included, are logged.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError`] on a name collision or an override for a
    /// rule that does not exist.
    pub fn resolve(&self, presets: &[RuleSet]) -> Result<RuleSet, RuleSetError> {
        let composed = match presets.split_first() {
            Some((base, rest)) => {
                let mut extensions = rest.to_vec();
                extensions.push(self.rules.clone());
                compose(base, &extensions)?
            }
            None => self.rules.clone(),
        };
        let resolved =
            composed.with_overrides(self.overrides.iter().map(|(name, o)| (name.as_str(), *o)))?;
        for warning in resolved.warnings() {
            tracing::warn!("{warning}");
        }
        Ok(resolved)
    }

    /// Warnings from the local rules only. Preset rules are covered once
    /// composed; see [`RuleSet::warnings`] on the result of
    /// [`Config::resolve`].
    #[must_use]
    pub fn warnings(&self) -> Vec<RuleWarning> {
        self.rules.warnings()
    }
}
