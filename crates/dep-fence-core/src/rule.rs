//! Forbidden-dependency rules and ordered rule sets.
//!
//! Pure domain model: no serde, no I/O. Invariants are enforced at
//! construction time.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::pattern::{PathMatcher, PatternError};
use crate::types::Severity;

// ────────────────────────────────────────────
// Selectors
// ────────────────────────────────────────────

/// Selects a set of modules by path.
///
/// A module is selected when `path` (if set) matches and `path_not`
/// (if set) does not. A selector with neither is unrestricted and
/// selects every module.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSelector {
    path: Option<Arc<PathMatcher>>,
    path_not: Option<Arc<PathMatcher>>,
}

impl PathSelector {
    /// An unrestricted selector.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// A selector matching `matcher`.
    #[must_use]
    pub fn path(matcher: Arc<PathMatcher>) -> Self {
        Self {
            path: Some(matcher),
            path_not: None,
        }
    }

    /// Compiles `pattern` into a selector.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is malformed.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        Ok(Self::path(Arc::new(PathMatcher::compile(pattern)?)))
    }

    /// Excludes modules matching `matcher`.
    #[must_use]
    pub fn excluding(mut self, matcher: Arc<PathMatcher>) -> Self {
        self.path_not = Some(matcher);
        self
    }

    /// Returns true if the selector places no restriction.
    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.path.is_none() && self.path_not.is_none()
    }

    /// Returns the positive matcher, if any.
    #[must_use]
    pub fn path_matcher(&self) -> Option<&PathMatcher> {
        self.path.as_deref()
    }

    /// Returns the exclusion matcher, if any.
    #[must_use]
    pub fn path_not_matcher(&self) -> Option<&PathMatcher> {
        self.path_not.as_deref()
    }

    /// Tests whether a module path is selected.
    #[must_use]
    pub fn matches(&self, module_path: &str) -> bool {
        self.path.as_ref().map_or(true, |m| m.matches(module_path))
            && !self
                .path_not
                .as_ref()
                .is_some_and(|m| m.matches(module_path))
    }
}

impl fmt::Display for PathSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.path, &self.path_not) {
            (None, None) => write!(f, "*"),
            (Some(p), None) => write!(f, "{p}"),
            (None, Some(n)) => write!(f, "!{n}"),
            (Some(p), Some(n)) => write!(f, "{p} !{n}"),
        }
    }
}

// ────────────────────────────────────────────
// Rules
// ────────────────────────────────────────────

/// A validated rule name (non-empty, no whitespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleName(String);

impl RuleName {
    /// Creates a new rule name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or contains whitespace.
    pub fn new(name: &str) -> Result<Self, RuleError> {
        if name.is_empty() {
            return Err(RuleError::EmptyName);
        }
        if name.chars().any(char::is_whitespace) {
            return Err(RuleError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A forbidden-dependency rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    name: RuleName,
    comment: String,
    severity: Severity,
    from: PathSelector,
    to: PathSelector,
    circular: bool,
}

impl Rule {
    /// Creates a rule with full validation.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Unrestricted`] for a non-circular rule whose
    /// `from` and `to` are both unrestricted.
    pub fn new(
        name: RuleName,
        comment: String,
        severity: Severity,
        from: PathSelector,
        to: PathSelector,
        circular: bool,
    ) -> Result<Self, RuleError> {
        if !circular && from.is_unrestricted() && to.is_unrestricted() {
            return Err(RuleError::Unrestricted {
                name: name.to_string(),
            });
        }
        Ok(Self {
            name,
            comment,
            severity,
            from,
            to,
            circular,
        })
    }

    /// Shorthand for a non-circular `from -> to` rule with `error` severity.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid or both selectors are unrestricted.
    pub fn forbidden(name: &str, from: PathSelector, to: PathSelector) -> Result<Self, RuleError> {
        Self::new(
            RuleName::new(name)?,
            String::new(),
            Severity::Error,
            from,
            to,
            false,
        )
    }

    /// Shorthand for a circular rule with `error` severity.
    ///
    /// # Errors
    ///
    /// Returns error if the name is invalid.
    pub fn circular(name: &str, from: PathSelector) -> Result<Self, RuleError> {
        Self::new(
            RuleName::new(name)?,
            String::new(),
            Severity::Error,
            from,
            PathSelector::any(),
            true,
        )
    }

    /// Sets the human comment.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Returns the rule name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the human comment.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Returns the severity.
    #[must_use]
    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// Returns the source selector.
    #[must_use]
    pub fn from(&self) -> &PathSelector {
        &self.from
    }

    /// Returns the target selector. Ignored for circular rules.
    #[must_use]
    pub fn to(&self) -> &PathSelector {
        &self.to
    }

    /// Returns true for cycle-prohibition rules.
    #[must_use]
    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Tests whether the edge `from -> to` violates this rule.
    ///
    /// Always false for circular rules, which concern cycles rather
    /// than single edges.
    #[must_use]
    pub fn matches_edge(&self, from: &str, to: &str) -> bool {
        !self.circular && self.from.matches(from) && self.to.matches(to)
    }

    /// Configuration problems that do not invalidate the rule.
    #[must_use]
    pub fn warnings(&self) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();
        if self.circular && !self.to.is_unrestricted() {
            warnings.push(RuleWarning::CircularTargetIgnored {
                rule: self.name.to_string(),
                selector: self.to.to_string(),
            });
        }
        warnings
    }
}

/// A non-fatal configuration issue on a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleWarning {
    /// A circular rule declares a `to` path; cycles are symmetric so it is ignored.
    CircularTargetIgnored {
        /// The rule name.
        rule: String,
        /// The ignored selector.
        selector: String,
    },
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CircularTargetIgnored { rule, selector } => write!(
                f,
                "rule `{rule}`: `to` selector `{selector}` is ignored on circular rules"
            ),
        }
    }
}

// ────────────────────────────────────────────
// Rule sets
// ────────────────────────────────────────────

/// A per-rule adjustment applied after composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuleOverride {
    /// Replacement severity.
    pub severity: Option<Severity>,
    /// `Some(false)` removes the rule.
    pub enabled: Option<bool>,
}

/// An ordered sequence of rules with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Creates a rule set, rejecting duplicate names.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::DuplicateRuleName`] on the first repeated name.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleSetError> {
        check_unique(&rules)?;
        Ok(Self { rules })
    }

    /// Creates an empty rule set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the rules in declaration order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Iterates the rules in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Gets a rule by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.name() == name)
    }

    /// Rule names in declaration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(Rule::name).collect()
    }

    /// Returns true if any rule is circular.
    #[must_use]
    pub fn has_circular(&self) -> bool {
        self.rules.iter().any(Rule::is_circular)
    }

    /// Collects configuration warnings from all rules.
    #[must_use]
    pub fn warnings(&self) -> Vec<RuleWarning> {
        self.rules.iter().flat_map(Rule::warnings).collect()
    }

    /// Appends `extensions` after this set. See [`compose`].
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::DuplicateRuleName`] on any name collision.
    pub fn compose(&self, extensions: &[RuleSet]) -> Result<Self, RuleSetError> {
        compose(self, extensions)
    }

    /// Applies per-rule overrides and returns the adjusted set.
    ///
    /// Overrides change severity or drop a rule; they never reorder rules.
    ///
    /// # Errors
    ///
    /// Returns [`RuleSetError::UnknownRule`] if an override names a rule
    /// that is not in the set.
    pub fn with_overrides<'a, I>(&self, overrides: I) -> Result<Self, RuleSetError>
    where
        I: IntoIterator<Item = (&'a str, RuleOverride)>,
    {
        let mut rules = self.rules.clone();
        let mut disabled: HashSet<String> = HashSet::new();

        for (name, adjustment) in overrides {
            let rule = rules
                .iter_mut()
                .find(|r| r.name() == name)
                .ok_or_else(|| RuleSetError::UnknownRule {
                    name: name.to_string(),
                })?;
            if let Some(severity) = adjustment.severity {
                tracing::debug!(rule = name, %severity, "severity override");
                rule.severity = severity;
            }
            if adjustment.enabled == Some(false) {
                disabled.insert(name.to_string());
            }
        }

        rules.retain(|r| !disabled.contains(r.name()));
        Ok(Self { rules })
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

fn check_unique(rules: &[Rule]) -> Result<(), RuleSetError> {
    let mut seen = HashSet::with_capacity(rules.len());
    for rule in rules {
        if !seen.insert(rule.name()) {
            return Err(RuleSetError::DuplicateRuleName {
                name: rule.name().to_string(),
            });
        }
    }
    Ok(())
}

/// Concatenates `base` and each extension in order into a new rule set.
///
/// Inputs are not modified. Any name shared by two rules, within one
/// input or across inputs, is an error even when the rule bodies are
/// identical.
///
/// # Errors
///
/// Returns [`RuleSetError::DuplicateRuleName`] naming the first collision.
pub fn compose(base: &RuleSet, extensions: &[RuleSet]) -> Result<RuleSet, RuleSetError> {
    let total = base.len() + extensions.iter().map(RuleSet::len).sum::<usize>();
    let mut rules = Vec::with_capacity(total);
    rules.extend(base.rules.iter().cloned());
    for extension in extensions {
        rules.extend(extension.rules.iter().cloned());
    }
    RuleSet::new(rules)
}

// ────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────

/// Errors in rule construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RuleError {
    /// Rule name is empty.
    #[error("rule name must not be empty")]
    #[diagnostic(code(dep_fence::rule::empty_name))]
    EmptyName,

    /// Rule name contains whitespace.
    #[error("invalid rule name `{name}`: must not contain whitespace")]
    #[diagnostic(code(dep_fence::rule::invalid_name))]
    InvalidName {
        /// The invalid name.
        name: String,
    },

    /// A non-circular rule restricts neither side.
    #[error("rule `{name}` restricts neither `from` nor `to` and is not circular")]
    #[diagnostic(
        code(dep_fence::rule::unrestricted),
        help("set `from.path`, `to.path`, or `circular = true`")
    )]
    Unrestricted {
        /// The rule name.
        name: String,
    },
}

/// Errors in rule set construction and composition.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum RuleSetError {
    /// Two rules share a name.
    #[error("duplicate rule name `{name}`")]
    #[diagnostic(
        code(dep_fence::rule_set::duplicate_name),
        help("rename one of the rules, or adjust it with a per-rule override instead")
    )]
    DuplicateRuleName {
        /// The repeated name.
        name: String,
    },

    /// An override names a rule that does not exist.
    #[error("override for unknown rule `{name}`")]
    #[diagnostic(code(dep_fence::rule_set::unknown_rule))]
    UnknownRule {
        /// The unknown name.
        name: String,
    },
}
