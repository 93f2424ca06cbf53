//! Path selectors: compiled, segment-aligned module path patterns.
//!
//! A pattern is a module path prefix with optional alternation groups:
//!
//! ```text
//! src/services                 literal prefix
//! src/(repositories|db)        alternation inside a segment
//! src/use(cases|rs)/(a|b/c)    groups may sit mid-segment and span `/`
//! ^src/(utils|lib)             leading `^` is accepted and ignored
//! src/index.ts$                trailing `$` requires an exact match
//! ```
//!
//! Patterns are expanded into the finite set of concrete prefixes at compile
//! time. A module matches when its `/`-separated segments start with the
//! segments of any prefix, so `src/service` never matches `src/services2`.

use std::collections::HashMap;
use std::sync::Arc;

/// Upper bound on the number of concrete prefixes one pattern may expand to.
pub const MAX_EXPANSIONS: usize = 4096;

/// Errors from compiling a path pattern.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, miette::Diagnostic)]
pub enum PatternError {
    /// The pattern is empty after normalisation.
    #[error("path pattern must not be empty")]
    #[diagnostic(code(dep_fence::pattern::empty))]
    Empty,

    /// A `(` has no matching `)`.
    #[error("unclosed group in `{pattern}` at offset {position}")]
    #[diagnostic(code(dep_fence::pattern::unbalanced))]
    UnclosedGroup {
        /// The offending pattern.
        pattern: String,
        /// Byte offset of the opening parenthesis.
        position: usize,
    },

    /// A `)` appears without an opening `(`.
    #[error("unexpected `)` in `{pattern}` at offset {position}")]
    #[diagnostic(code(dep_fence::pattern::unbalanced))]
    UnexpectedClose {
        /// The offending pattern.
        pattern: String,
        /// Byte offset of the closing parenthesis.
        position: usize,
    },

    /// An alternation branch is empty, as in `()` or `(a|)`.
    #[error("empty alternative in `{pattern}` at offset {position}")]
    #[diagnostic(
        code(dep_fence::pattern::empty_alternative),
        help("every branch of `(a|b)` must contain at least one character")
    )]
    EmptyAlternative {
        /// The offending pattern.
        pattern: String,
        /// Byte offset where the empty branch ends.
        position: usize,
    },

    /// An expanded alternative contains an empty path segment (`src//x`).
    #[error("empty path segment in `{expanded}` (from `{pattern}`)")]
    #[diagnostic(code(dep_fence::pattern::empty_segment))]
    EmptySegment {
        /// The offending pattern.
        pattern: String,
        /// The expanded alternative containing the empty segment.
        expanded: String,
    },

    /// The pattern expands to more than [`MAX_EXPANSIONS`] prefixes.
    #[error("`{pattern}` expands to more than {limit} alternatives")]
    #[diagnostic(code(dep_fence::pattern::too_many_alternatives))]
    TooManyAlternatives {
        /// The offending pattern.
        pattern: String,
        /// The expansion limit.
        limit: usize,
    },
}

/// Parsed pattern syntax before expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Literal(String),
    Group(Vec<Vec<Node>>),
}

struct Parser<'a> {
    pattern: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            pattern,
            chars: pattern.char_indices().peekable(),
        }
    }

    fn offset(&mut self) -> usize {
        self.chars.peek().map_or(self.pattern.len(), |&(i, _)| i)
    }

    fn parse(mut self) -> Result<Vec<Vec<Node>>, PatternError> {
        let alternatives = self.parse_alternatives(0)?;
        if let Some(&(position, _)) = self.chars.peek() {
            return Err(PatternError::UnexpectedClose {
                pattern: self.pattern.to_string(),
                position,
            });
        }
        Ok(alternatives)
    }

    fn parse_alternatives(&mut self, depth: usize) -> Result<Vec<Vec<Node>>, PatternError> {
        let mut alternatives = Vec::new();
        loop {
            let sequence = self.parse_sequence(depth)?;
            if sequence.is_empty() {
                return Err(PatternError::EmptyAlternative {
                    pattern: self.pattern.to_string(),
                    position: self.offset(),
                });
            }
            alternatives.push(sequence);

            match self.chars.peek() {
                Some(&(_, '|')) => {
                    self.chars.next();
                }
                Some(&(position, ')')) if depth == 0 => {
                    return Err(PatternError::UnexpectedClose {
                        pattern: self.pattern.to_string(),
                        position,
                    });
                }
                _ => return Ok(alternatives),
            }
        }
    }

    fn parse_sequence(&mut self, depth: usize) -> Result<Vec<Node>, PatternError> {
        let mut nodes = Vec::new();
        let mut literal = String::new();

        while let Some(&(position, c)) = self.chars.peek() {
            match c {
                '|' | ')' => break,
                '(' => {
                    self.chars.next();
                    if !literal.is_empty() {
                        nodes.push(Node::Literal(std::mem::take(&mut literal)));
                    }
                    let group = self.parse_alternatives(depth + 1)?;
                    match self.chars.next() {
                        Some((_, ')')) => nodes.push(Node::Group(group)),
                        _ => {
                            return Err(PatternError::UnclosedGroup {
                                pattern: self.pattern.to_string(),
                                position,
                            })
                        }
                    }
                }
                _ => {
                    self.chars.next();
                    literal.push(c);
                }
            }
        }

        if !literal.is_empty() {
            nodes.push(Node::Literal(literal));
        }
        Ok(nodes)
    }
}

/// Expands alternatives into concrete strings, preserving declaration order.
fn expand_alternatives(
    alternatives: &[Vec<Node>],
    pattern: &str,
) -> Result<Vec<String>, PatternError> {
    let mut out = Vec::new();
    for sequence in alternatives {
        out.extend(expand_sequence(sequence, pattern)?);
        if out.len() > MAX_EXPANSIONS {
            return Err(too_many(pattern));
        }
    }
    Ok(out)
}

fn expand_sequence(sequence: &[Node], pattern: &str) -> Result<Vec<String>, PatternError> {
    let mut acc = vec![String::new()];
    for node in sequence {
        match node {
            Node::Literal(text) => acc.iter_mut().for_each(|s| s.push_str(text)),
            Node::Group(alternatives) => {
                let tails = expand_alternatives(alternatives, pattern)?;
                if acc.len().saturating_mul(tails.len()) > MAX_EXPANSIONS {
                    return Err(too_many(pattern));
                }
                acc = acc
                    .iter()
                    .flat_map(|head| tails.iter().map(move |tail| format!("{head}{tail}")))
                    .collect();
            }
        }
    }
    Ok(acc)
}

fn too_many(pattern: &str) -> PatternError {
    PatternError::TooManyAlternatives {
        pattern: pattern.to_string(),
        limit: MAX_EXPANSIONS,
    }
}

fn strip_dot_slash(path: &str) -> &str {
    let mut path = path;
    while let Some(rest) = path.strip_prefix("./") {
        path = rest;
    }
    path
}

/// One expanded alternative, split into segments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Prefix {
    segments: Vec<String>,
    /// Anchored with a trailing `$`: the path must end after `segments`.
    exact: bool,
}

impl Prefix {
    /// Normalises one expanded alternative, resolving its own `^` and `$`.
    fn parse(alternative: &str, pattern: &str) -> Result<Self, PatternError> {
        let body = alternative.strip_prefix('^').unwrap_or(alternative);
        let (body, exact) = match body.strip_suffix('$') {
            Some(rest) => (rest, true),
            None => (body, false),
        };
        let normalized = strip_dot_slash(body).trim_end_matches('/');
        if normalized.is_empty() {
            return Err(PatternError::Empty);
        }
        let segments: Vec<String> = normalized.split('/').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PatternError::EmptySegment {
                pattern: pattern.to_string(),
                expanded: alternative.to_string(),
            });
        }
        Ok(Self { segments, exact })
    }

    fn matches(&self, path: &str) -> bool {
        let mut segments = path.split('/');
        self.segments
            .iter()
            .all(|p| segments.next() == Some(p.as_str()))
            && (!self.exact || segments.next().is_none())
    }
}

/// A compiled path pattern.
///
/// Compiled once and reused for all match calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatcher {
    raw: String,
    prefixes: Vec<Prefix>,
}

impl PathMatcher {
    /// Compiles a path pattern.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] on an empty pattern, unbalanced groups,
    /// empty alternatives, empty segments, or an oversized expansion.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let body = pattern.trim();
        if body.is_empty() {
            return Err(PatternError::Empty);
        }

        let alternatives = Parser::new(body).parse()?;
        let expanded = expand_alternatives(&alternatives, pattern)?;

        let mut prefixes: Vec<Prefix> = Vec::with_capacity(expanded.len());
        for alternative in expanded {
            let prefix = Prefix::parse(&alternative, pattern)?;
            if !prefixes.contains(&prefix) {
                prefixes.push(prefix);
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            prefixes,
        })
    }

    /// Tests whether a module path is selected by this pattern.
    #[must_use]
    pub fn matches(&self, module_path: &str) -> bool {
        let path = strip_dot_slash(module_path);
        self.prefixes.iter().any(|prefix| prefix.matches(path))
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the expanded concrete prefixes, joined with `/`.
    #[must_use]
    pub fn prefixes(&self) -> Vec<String> {
        self.prefixes.iter().map(|p| p.segments.join("/")).collect()
    }

    /// Returns true if every alternative is anchored with a trailing `$`.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.prefixes.iter().all(|p| p.exact)
    }
}

impl std::fmt::Display for PathMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Compiles a path pattern into a [`PathMatcher`].
///
/// # Errors
///
/// See [`PathMatcher::compile`].
pub fn compile(pattern: &str) -> Result<PathMatcher, PatternError> {
    PathMatcher::compile(pattern)
}

/// Cache of compiled matchers keyed by pattern string.
///
/// Rule sets repeat the same selectors (`src/routes`, `src/(pages|views)`)
/// many times; each distinct string is compiled once.
#[derive(Debug, Default)]
pub struct PatternCache {
    compiled: HashMap<String, Arc<PathMatcher>>,
}

impl PatternCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached matcher for `pattern`, compiling it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern does not compile. Failures
    /// are not cached.
    pub fn get_or_compile(&mut self, pattern: &str) -> Result<Arc<PathMatcher>, PatternError> {
        if let Some(matcher) = self.compiled.get(pattern) {
            return Ok(Arc::clone(matcher));
        }
        let matcher = Arc::new(PathMatcher::compile(pattern)?);
        self.compiled
            .insert(pattern.to_string(), Arc::clone(&matcher));
        Ok(matcher)
    }

    /// Number of distinct compiled patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.len()
    }

    /// Returns true if nothing has been compiled yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.compiled.is_empty()
    }
}
