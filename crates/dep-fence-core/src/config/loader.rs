//! DTO → Domain model conversion with validation.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tracing::warn;

use crate::pattern::{PatternCache, PatternError};
use crate::rule::{PathSelector, Rule, RuleError, RuleName, RuleOverride, RuleSet, RuleSetError};
use crate::types::Severity;

use super::dto::{ConfigDto, PatternDto, RuleDto, RuleOverrideDto, SelectorDto};
use super::{Config, EngineConfig};

/// Errors while loading a rule configuration.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum LoadError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    #[diagnostic(code(dep_fence::config::io))]
    Io {
        /// Path to the file.
        path: std::path::PathBuf,
        /// The underlying IO error.
        source: std::io::Error,
    },

    /// The TOML text is malformed or has the wrong shape.
    #[error("invalid TOML: {message}")]
    #[diagnostic(code(dep_fence::config::toml))]
    Toml {
        /// Parser message, including the location.
        message: String,
    },

    /// A path pattern failed to compile.
    #[error("{context}: {source}")]
    #[diagnostic(code(dep_fence::config::pattern))]
    Pattern {
        /// Where the error occurred (e.g., "forbidden[3].from.path").
        context: String,
        /// The underlying pattern error.
        source: PatternError,
    },

    /// A rule failed validation.
    #[error("{context}: {source}")]
    #[diagnostic(code(dep_fence::config::rule))]
    Rule {
        /// Where the error occurred (e.g., "forbidden[0]").
        context: String,
        /// The underlying rule error.
        source: RuleError,
    },

    /// Unknown severity string.
    #[error("{context}: unknown severity `{value}`, expected: error, warn, info")]
    #[diagnostic(code(dep_fence::config::severity))]
    UnknownSeverity {
        /// Where the error occurred.
        context: String,
        /// The invalid value.
        value: String,
    },

    /// `[engine] max_cycles_per_rule = 0`.
    #[error("engine.max_cycles_per_rule must be at least 1")]
    #[diagnostic(code(dep_fence::config::engine))]
    ZeroCycleLimit,

    /// Rule set invariants failed (duplicate names, unknown overrides).
    #[error(transparent)]
    #[diagnostic(transparent)]
    RuleSet(#[from] RuleSetError),
}

/// Parses TOML text and converts it into a validated [`Config`].
///
/// # Errors
///
/// Returns [`LoadError`] for malformed TOML or any validation failure.
pub fn load_str(content: &str) -> Result<Config, LoadError> {
    let dto: ConfigDto = toml::from_str(content).map_err(|e| LoadError::Toml {
        message: e.to_string(),
    })?;
    load(dto)
}

/// Converts a [`ConfigDto`] to a validated [`Config`].
///
/// Rule warnings (such as a `to` selector on a circular rule) do not fail
/// the load; [`Config::resolve`] logs them for the composed rule set.
///
/// # Errors
///
/// Returns the first error encountered during conversion.
pub fn load(dto: ConfigDto) -> Result<Config, LoadError> {
    let fail_on = match dto.fail_on.as_deref() {
        Some(value) => parse_severity(value, "fail_on")?,
        None => Severity::Error,
    };

    let max_cycles_per_rule = match dto.engine.max_cycles_per_rule {
        Some(limit) => Some(NonZeroUsize::new(limit).ok_or(LoadError::ZeroCycleLimit)?),
        None => None,
    };
    let engine = EngineConfig {
        parallel: dto.engine.parallel.unwrap_or(true),
        max_cycles_per_rule,
    };

    let rules = load_rules(&dto.forbidden)?;

    let overrides = dto
        .rules
        .into_iter()
        .map(|(name, o)| convert_override(&o, &name).map(|o| (name, o)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Config {
        extends: dto.extends,
        fail_on,
        engine,
        rules,
        overrides,
        options: dto.options,
    })
}

/// Converts `[[forbidden]]` entries into a [`RuleSet`].
///
/// Identical patterns across rules share one compiled matcher.
///
/// # Errors
///
/// Returns the first invalid rule, or a duplicate name.
pub fn load_rules(dtos: &[RuleDto]) -> Result<RuleSet, LoadError> {
    let mut cache = PatternCache::new();
    let rules = dtos
        .iter()
        .enumerate()
        .map(|(i, dto)| convert_rule(dto, i, &mut cache))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(RuleSet::new(rules)?)
}

fn convert_rule(dto: &RuleDto, index: usize, cache: &mut PatternCache) -> Result<Rule, LoadError> {
    let ctx = format!("forbidden[{index}]");
    let rule_error = |source| LoadError::Rule {
        context: ctx.clone(),
        source,
    };

    let name = RuleName::new(dto.name.as_deref().unwrap_or_default()).map_err(|source| {
        LoadError::Rule {
            context: format!("{ctx}.name"),
            source,
        }
    })?;

    let severity = match dto.severity.as_deref() {
        Some(value) => parse_severity(value, &format!("{ctx}.severity"))?,
        None => Severity::Warn,
    };

    let from = convert_selector(&dto.from, &format!("{ctx}.from"), cache)?;
    let to = convert_selector(&dto.to, &format!("{ctx}.to"), cache)?;
    let from_circular = dto.from.circular.unwrap_or(false);
    let circular =
        dto.circular.unwrap_or(false) || dto.to.circular.unwrap_or(false) || from_circular;

    if from_circular {
        warn!("{ctx}.from.circular is read as `circular = true`; write `to.circular` instead");
    }

    Rule::new(
        name,
        dto.comment.clone().unwrap_or_default(),
        severity,
        from,
        to,
        circular,
    )
    .map_err(rule_error)
}

fn convert_selector(
    dto: &SelectorDto,
    ctx: &str,
    cache: &mut PatternCache,
) -> Result<PathSelector, LoadError> {
    let mut selector = match &dto.path {
        Some(pattern) => PathSelector::path(compile(pattern, &format!("{ctx}.path"), cache)?),
        None => PathSelector::any(),
    };
    if let Some(pattern) = &dto.path_not {
        selector = selector.excluding(compile(pattern, &format!("{ctx}.path_not"), cache)?);
    }
    Ok(selector)
}

fn compile(
    pattern: &PatternDto,
    ctx: &str,
    cache: &mut PatternCache,
) -> Result<Arc<crate::pattern::PathMatcher>, LoadError> {
    cache
        .get_or_compile(&pattern.to_pattern())
        .map_err(|source| LoadError::Pattern {
            context: ctx.to_string(),
            source,
        })
}

fn convert_override(dto: &RuleOverrideDto, name: &str) -> Result<RuleOverride, LoadError> {
    let severity = dto
        .severity
        .as_deref()
        .map(|value| parse_severity(value, &format!("rules.{name}.severity")))
        .transpose()?;
    Ok(RuleOverride {
        severity,
        enabled: dto.enabled,
    })
}

fn parse_severity(s: &str, context: &str) -> Result<Severity, LoadError> {
    Severity::parse(s).ok_or_else(|| LoadError::UnknownSeverity {
        context: context.to_string(),
        value: s.to_string(),
    })
}
