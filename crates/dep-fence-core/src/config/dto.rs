//! TOML deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization.
//! They are converted to domain model types via the loader.

use std::collections::BTreeMap;

use serde::Deserialize;

/// Raw TOML representation of a `dep-fence.toml` file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigDto {
    /// Preset names composed before the local rules, in order.
    #[serde(default)]
    pub extends: Vec<String>,

    /// Host exit threshold (default: "error").
    #[serde(default)]
    pub fail_on: Option<String>,

    /// Evaluation engine settings.
    #[serde(default)]
    pub engine: EngineDto,

    /// Local forbidden-dependency rules.
    #[serde(default)]
    pub forbidden: Vec<RuleDto>,

    /// Per-rule adjustments applied after composition, keyed by rule name.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleOverrideDto>,

    /// Opaque options table, carried through unchanged.
    #[serde(default)]
    pub options: toml::Table,
}

/// TOML representation of `[engine]`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineDto {
    /// Evaluate rules on the rayon pool (default: true).
    #[serde(default)]
    pub parallel: Option<bool>,
    /// Maximum violations per circular rule.
    #[serde(default)]
    pub max_cycles_per_rule: Option<usize>,
}

/// TOML representation of a `[[forbidden]]` rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDto {
    /// Rule name (e.g., "no-services-to-routes").
    #[serde(default)]
    pub name: Option<String>,
    /// Human explanation shown with violations.
    #[serde(default)]
    pub comment: Option<String>,
    /// Severity (default: "warn").
    #[serde(default)]
    pub severity: Option<String>,
    /// Source selector.
    #[serde(default)]
    pub from: SelectorDto,
    /// Target selector.
    #[serde(default)]
    pub to: SelectorDto,
    /// Rule-level cycle flag (equivalent to `to.circular`).
    #[serde(default)]
    pub circular: Option<bool>,
}

/// TOML representation of a `from` / `to` selector.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SelectorDto {
    /// Pattern(s) a module must match.
    #[serde(default)]
    pub path: Option<PatternDto>,
    /// Pattern(s) a module must not match.
    #[serde(default, alias = "pathNot")]
    pub path_not: Option<PatternDto>,
    /// Cycle flag; only meaningful on `to`.
    #[serde(default)]
    pub circular: Option<bool>,
}

/// One pattern, or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PatternDto {
    /// A single pattern.
    One(String),
    /// Alternatives, matched if any matches.
    Many(Vec<String>),
}

impl PatternDto {
    /// Folds the pattern into a single alternation string.
    #[must_use]
    pub fn to_pattern(&self) -> String {
        match self {
            Self::One(pattern) => pattern.clone(),
            Self::Many(patterns) => patterns.join("|"),
        }
    }
}

/// TOML representation of a `[rules.<name>]` override.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleOverrideDto {
    /// Replacement severity.
    #[serde(default)]
    pub severity: Option<String>,
    /// `false` drops the rule.
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_empty() {
        let dto: ConfigDto = toml::from_str("").unwrap();
        assert!(dto.extends.is_empty());
        assert!(dto.forbidden.is_empty());
        assert!(dto.rules.is_empty());
        assert!(dto.options.is_empty());
    }

    #[test]
    fn deserialize_full_config() {
        let toml_str = r#"
extends = ["base", "ddd"]
fail_on = "warn"

[engine]
parallel = false
max_cycles_per_rule = 10

[[forbidden]]
name = "no-services-to-routes"
comment = "services must not depend on routes"
severity = "error"
from = { path = "src/services" }
to = { path = ["src/routes", "src/pages"], pathNot = "src/routes/shared" }

[[forbidden]]
name = "no-circular"
from = {}
to = { circular = true }

[rules.no-routes-to-services-directly]
severity = "error"

[options]
tsConfig = "tsconfig.json"
"#;
        let dto: ConfigDto = toml::from_str(toml_str).unwrap();
        assert_eq!(dto.extends, vec!["base", "ddd"]);
        assert_eq!(dto.fail_on.as_deref(), Some("warn"));
        assert_eq!(dto.engine.parallel, Some(false));
        assert_eq!(dto.engine.max_cycles_per_rule, Some(10));
        assert_eq!(dto.forbidden.len(), 2);

        let first = &dto.forbidden[0];
        assert_eq!(
            first.to.path,
            Some(PatternDto::Many(vec![
                "src/routes".into(),
                "src/pages".into()
            ]))
        );
        assert_eq!(
            first.to.path_not,
            Some(PatternDto::One("src/routes/shared".into()))
        );

        let second = &dto.forbidden[1];
        assert!(second.from.path.is_none());
        assert_eq!(second.to.circular, Some(true));
        assert!(second.severity.is_none());

        assert_eq!(
            dto.rules["no-routes-to-services-directly"]
                .severity
                .as_deref(),
            Some("error")
        );
        assert!(dto.options.contains_key("tsConfig"));
    }

    #[test]
    fn pattern_list_folds_to_alternation() {
        let dto = PatternDto::Many(vec!["src/utils".into(), "src/lib".into()]);
        assert_eq!(dto.to_pattern(), "src/utils|src/lib");
    }
}
