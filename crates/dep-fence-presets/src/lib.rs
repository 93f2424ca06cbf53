//! # dep-fence-presets
//!
//! Built-in rule presets for layered TypeScript/JavaScript projects.
//!
//! - `base`: routes → services → repositories layering, utils and types
//!   isolation, and `no-circular`
//! - `ddd`: a use case layer, domain protection and LLM adapters
//! - `frontend`: pages → components → hooks → utils layering
//!
//! Presets are plain rule sets and compose with [`dep_fence_core::compose`];
//! names never collide between presets, so any combination is valid.
//!
//! ## Example
//!
//! ```ignore
//! use dep_fence_presets::{resolve, Preset};
//!
//! let rules = Preset::Base.rule_set()?;
//! let config = dep_fence_core::Config::parse("extends = [\"base\", \"ddd\"]")?;
//! let composed = resolve(&config)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::fmt;
use std::str::FromStr;

use dep_fence_core::{config, Config, LoadError, RuleSet, RuleSetError};

/// Built-in rule presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Backend layering shared by every project.
    Base,
    /// DDD / clean architecture with a use case layer.
    Ddd,
    /// Frontend UI layering.
    Frontend,
}

impl Preset {
    /// Every preset, in recommended composition order.
    pub const ALL: [Self; 3] = [Self::Base, Self::Ddd, Self::Frontend];

    /// Returns the name used in `extends` and on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Ddd => "ddd",
            Self::Frontend => "frontend",
        }
    }

    /// Returns a one-line description.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Base => "routes -> services -> repositories layering and no cycles",
            Self::Ddd => "use case layer, domain protection and LLM adapters",
            Self::Frontend => "pages -> components -> hooks -> utils layering",
        }
    }

    /// Returns the preset's TOML source.
    #[must_use]
    pub fn source(self) -> &'static str {
        match self {
            Self::Base => include_str!("../presets/base.toml"),
            Self::Ddd => include_str!("../presets/ddd.toml"),
            Self::Frontend => include_str!("../presets/frontend.toml"),
        }
    }

    /// Looks up a preset by name.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Unknown`] for an unrecognised name.
    pub fn from_name(name: &str) -> Result<Self, PresetError> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == name.trim())
            .ok_or_else(|| PresetError::Unknown {
                name: name.to_string(),
            })
    }

    /// Loads the preset's rules.
    ///
    /// # Errors
    ///
    /// Returns [`PresetError::Load`] if the bundled TOML is invalid.
    pub fn rule_set(self) -> Result<RuleSet, PresetError> {
        let rules = config::load_str(self.source())
            .map(|c| c.rules)
            .map_err(|source| PresetError::Load {
                preset: self.name(),
                source,
            })?;
        tracing::debug!(preset = self.name(), rules = rules.len(), "preset loaded");
        Ok(rules)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = PresetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

/// Loads the named presets in order.
///
/// # Errors
///
/// Returns the first unknown name or load failure.
pub fn load_presets<S: AsRef<str>>(names: &[S]) -> Result<Vec<RuleSet>, PresetError> {
    names
        .iter()
        .map(|name| Preset::from_name(name.as_ref())?.rule_set())
        .collect()
}

/// Composes `names` into one rule set, in order.
///
/// # Errors
///
/// Returns an unknown preset, or a duplicate name when a preset is listed
/// twice.
pub fn compose_presets<S: AsRef<str>>(names: &[S]) -> Result<RuleSet, PresetError> {
    let sets = load_presets(names)?;
    match sets.split_first() {
        Some((base, rest)) => Ok(dep_fence_core::compose(base, rest)?),
        None => Ok(RuleSet::empty()),
    }
}

/// Resolves a configuration's `extends` list and composes it with the
/// local rules and overrides.
///
/// # Errors
///
/// Returns an unknown preset, a load failure, or a rule name collision.
pub fn resolve(config: &Config) -> Result<RuleSet, PresetError> {
    let presets = load_presets(config.extends.as_slice())?;
    Ok(config.resolve(&presets)?)
}

/// Errors resolving presets.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PresetError {
    /// No preset with this name.
    #[error("unknown preset `{name}`")]
    #[diagnostic(
        code(dep_fence::preset::unknown),
        help("available presets: base, ddd, frontend")
    )]
    Unknown {
        /// The requested name.
        name: String,
    },

    /// A bundled preset failed to load.
    #[error("preset `{preset}`: {source}")]
    #[diagnostic(code(dep_fence::preset::load))]
    Load {
        /// The preset name.
        preset: &'static str,
        /// The underlying load error.
        source: LoadError,
    },

    /// Composition failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    RuleSet(#[from] RuleSetError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use dep_fence_core::{evaluate, DependencyGraph, Severity};

    #[test]
    fn every_preset_loads() {
        for preset in Preset::ALL {
            let rules = preset.rule_set().unwrap();
            assert!(!rules.is_empty(), "{preset} is empty");
            assert!(rules.warnings().is_empty(), "{preset} has warnings");
        }
    }

    #[test]
    fn preset_sizes() {
        assert_eq!(Preset::Base.rule_set().unwrap().len(), 6);
        assert_eq!(Preset::Ddd.rule_set().unwrap().len(), 9);
        assert_eq!(Preset::Frontend.rule_set().unwrap().len(), 12);
    }

    #[test]
    fn from_name_round_trips() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_name(preset.name()).unwrap(), preset);
        }
        assert_eq!("ddd".parse::<Preset>().unwrap(), Preset::Ddd);
        assert!(matches!(
            Preset::from_name("hexagonal"),
            Err(PresetError::Unknown { .. })
        ));
    }

    #[test]
    fn base_has_the_only_circular_rule() {
        let base = Preset::Base.rule_set().unwrap();
        assert!(base.get("no-circular").unwrap().is_circular());
        assert!(!Preset::Ddd.rule_set().unwrap().has_circular());
        assert!(!Preset::Frontend.rule_set().unwrap().has_circular());
    }

    #[test]
    fn ddd_routes_rule_is_a_warning() {
        let ddd = Preset::Ddd.rule_set().unwrap();
        assert_eq!(
            ddd.get("no-routes-to-services-directly").unwrap().severity(),
            Severity::Warn
        );
    }

    #[test]
    fn all_presets_compose_without_collision() {
        let all = compose_presets(&["base", "ddd", "frontend"]).unwrap();
        assert_eq!(all.len(), 27);
        assert_eq!(all.names()[0], "no-infrastructure-to-services");
        assert_eq!(all.names()[6], "no-routes-to-services-directly");
    }

    #[test]
    fn repeated_preset_is_a_collision() {
        assert!(matches!(
            compose_presets(&["base", "base"]),
            Err(PresetError::RuleSet(RuleSetError::DuplicateRuleName { .. }))
        ));
    }

    #[test]
    fn no_presets_compose_to_empty() {
        assert!(compose_presets::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn resolve_composes_extends_with_local_rules() {
        let config = Config::parse(
            r#"
extends = ["base", "ddd"]

[[forbidden]]
name = "no-routes-to-db"
severity = "error"
from = { path = "src/routes" }
to = { path = "src/db" }

[rules.no-routes-to-services-directly]
severity = "error"
"#,
        )
        .unwrap();
        let rules = resolve(&config).unwrap();
        assert_eq!(rules.len(), 16);
        assert_eq!(rules.names().last(), Some(&"no-routes-to-db"));
        assert_eq!(
            rules
                .get("no-routes-to-services-directly")
                .unwrap()
                .severity(),
            Severity::Error
        );
    }

    #[test]
    fn ddd_sample_project() {
        let graph = DependencyGraph::builder()
            .path("src/routes/orders.ts")
            .path("src/usecases/place-order.ts")
            .path("src/services/pricing.ts")
            .path("src/domain/order.ts")
            .path("src/llm/client.ts")
            .edge("src/routes/orders.ts", "src/usecases/place-order.ts")
            .edge("src/routes/orders.ts", "src/services/pricing.ts")
            .edge("src/usecases/place-order.ts", "src/domain/order.ts")
            .edge("src/domain/order.ts", "src/llm/client.ts")
            .build()
            .unwrap();
        let rules = compose_presets(&["base", "ddd"]).unwrap();

        let found: Vec<(String, Severity)> = evaluate(&graph, &rules)
            .into_iter()
            .map(|v| (v.rule, v.severity))
            .collect();
        assert_eq!(
            found,
            vec![
                ("no-routes-to-services-directly".to_string(), Severity::Warn),
                ("no-domain-to-infrastructure".to_string(), Severity::Error),
            ]
        );
    }

    #[test]
    fn frontend_sample_project() {
        let graph = DependencyGraph::builder()
            .path("src/pages/home.tsx")
            .path("src/components/button.tsx")
            .path("src/hooks/use-cart.ts")
            .path("src/store/cart.ts")
            .edge("src/pages/home.tsx", "src/components/button.tsx")
            .edge("src/components/button.tsx", "src/hooks/use-cart.ts")
            .edge("src/hooks/use-cart.ts", "src/components/button.tsx")
            .edge("src/store/cart.ts", "src/pages/home.tsx")
            .build()
            .unwrap();
        let rules = compose_presets(&["base", "frontend"]).unwrap();

        let names: Vec<String> = evaluate(&graph, &rules)
            .into_iter()
            .map(|v| v.rule)
            .collect();
        assert_eq!(
            names,
            vec!["no-circular", "no-hooks-to-components", "no-store-to-pages"]
        );
    }
}
