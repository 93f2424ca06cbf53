//! Module dependency graph supplied by an external graph builder.
//!
//! The graph is built once through [`GraphBuilder`] (or from JSON, see
//! [`input`]) and is read-only afterwards. Every edge endpoint must be a
//! declared module; duplicate edges collapse to one.

pub mod input;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A unit of source code in the dependency graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Module {
    path: String,
    #[serde(default)]
    external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    package: Option<String>,
}

impl Module {
    /// Creates an internal module with the given path.
    ///
    /// A leading `./` is stripped.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path.into()),
            external: false,
            package: None,
        }
    }

    /// Marks the module as external (third-party or core library).
    #[must_use]
    pub fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    /// Sets the package boundary the module belongs to.
    #[must_use]
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Returns the module path identifier.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns true for third-party or core-library modules.
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.external
    }

    /// Returns the package boundary, if known.
    #[must_use]
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }
}

fn normalize_path(path: String) -> String {
    let mut trimmed = path.as_str();
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest;
    }
    if trimmed.len() == path.len() {
        path
    } else {
        trimmed.to_string()
    }
}

/// Errors for malformed graph input.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum GraphError {
    /// An edge references a module that was never declared.
    #[error("edge {from} -> {to} references unknown module `{missing}`")]
    #[diagnostic(
        code(dep_fence::graph::unknown_module),
        help("declare every edge endpoint as a module before building the graph")
    )]
    UnknownModule {
        /// Edge source.
        from: String,
        /// Edge target.
        to: String,
        /// The endpoint that is not a declared module.
        missing: String,
    },

    /// The same module path was declared twice.
    #[error("module `{path}` declared more than once")]
    #[diagnostic(code(dep_fence::graph::duplicate_module))]
    DuplicateModule {
        /// The repeated path.
        path: String,
    },

    /// A module path is empty.
    #[error("module path must not be empty")]
    #[diagnostic(code(dep_fence::graph::empty_path))]
    EmptyPath,

    /// Graph JSON could not be deserialized.
    #[error("invalid graph JSON: {0}")]
    #[diagnostic(code(dep_fence::graph::json))]
    Json(#[from] serde_json::Error),
}

/// Collects modules and edges and validates them into a [`DependencyGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    modules: Vec<Module>,
    edges: Vec<(String, String)>,
}

impl GraphBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a module.
    #[must_use]
    pub fn module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// Declares an internal module by path.
    #[must_use]
    pub fn path(self, path: impl Into<String>) -> Self {
        self.module(Module::new(path))
    }

    /// Declares a dependency edge `from -> to`.
    #[must_use]
    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges
            .push((normalize_path(from.into()), normalize_path(to.into())));
        self
    }

    /// Declares a module via mutable reference.
    pub fn add_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    /// Declares an edge via mutable reference.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges
            .push((normalize_path(from.into()), normalize_path(to.into())));
    }

    /// Validates and builds the graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] for empty or duplicate module paths and for
    /// edges whose endpoints are not declared modules.
    pub fn build(self) -> Result<DependencyGraph, GraphError> {
        let mut graph = DiGraph::with_capacity(self.modules.len(), self.edges.len());
        let mut index = HashMap::with_capacity(self.modules.len());

        for module in self.modules {
            if module.path.is_empty() {
                return Err(GraphError::EmptyPath);
            }
            if index.contains_key(&module.path) {
                return Err(GraphError::DuplicateModule { path: module.path });
            }
            let path = module.path.clone();
            let idx = graph.add_node(module);
            index.insert(path, idx);
        }

        let mut seen: HashSet<(NodeIndex, NodeIndex)> = HashSet::with_capacity(self.edges.len());
        for (from, to) in self.edges {
            let lookup = |path: &String| {
                index
                    .get(path)
                    .copied()
                    .ok_or_else(|| GraphError::UnknownModule {
                        from: from.clone(),
                        to: to.clone(),
                        missing: path.clone(),
                    })
            };
            let a = lookup(&from)?;
            let b = lookup(&to)?;
            if seen.insert((a, b)) {
                graph.add_edge(a, b, ());
            }
        }

        let successors = graph
            .node_indices()
            .map(|idx| {
                // petgraph yields the most recently added edge first
                let mut next: Vec<NodeIndex> =
                    graph.neighbors_directed(idx, Direction::Outgoing).collect();
                next.reverse();
                next
            })
            .collect();

        tracing::debug!(
            modules = graph.node_count(),
            edges = graph.edge_count(),
            "built dependency graph"
        );

        Ok(DependencyGraph {
            graph,
            index,
            successors,
        })
    }
}

/// An immutable module dependency graph.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    graph: DiGraph<Module, ()>,
    index: HashMap<String, NodeIndex>,
    /// Outgoing neighbours per node, in edge insertion order.
    successors: Vec<Vec<NodeIndex>>,
}

impl DependencyGraph {
    /// Starts building a graph.
    #[must_use]
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    /// Returns the underlying petgraph graph.
    #[must_use]
    pub fn graph(&self) -> &DiGraph<Module, ()> {
        &self.graph
    }

    /// Number of modules.
    #[must_use]
    pub fn module_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns true if the graph has no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Looks up a module's node index by path.
    #[must_use]
    pub fn index_of(&self, path: &str) -> Option<NodeIndex> {
        self.index.get(path).copied()
    }

    /// Returns the module stored at `idx`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` does not belong to this graph.
    #[must_use]
    pub fn module(&self, idx: NodeIndex) -> &Module {
        &self.graph[idx]
    }

    /// Returns the module with the given path.
    #[must_use]
    pub fn module_by_path(&self, path: &str) -> Option<&Module> {
        self.index_of(path).map(|idx| &self.graph[idx])
    }

    /// Iterates modules in declaration order.
    pub fn modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Iterates node indices in declaration order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Iterates edges as `(from, to)` modules in first-occurrence order.
    pub fn edges(&self) -> impl Iterator<Item = (&Module, &Module)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (&self.graph[e.source()], &self.graph[e.target()]))
    }

    /// Outgoing neighbours of `idx` in edge insertion order.
    #[must_use]
    pub fn successors(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.successors
            .get(idx.index())
            .map_or(&[], Vec::as_slice)
    }

    /// Returns true if `from -> to` is an edge.
    #[must_use]
    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        match (self.index_of(from), self.index_of(to)) {
            (Some(a), Some(b)) => self.successors(a).contains(&b),
            _ => false,
        }
    }

    /// Number of modules depending on `path`.
    #[must_use]
    pub fn fan_in(&self, path: &str) -> usize {
        self.index_of(path).map_or(0, |idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .count()
        })
    }

    /// Number of modules `path` depends on.
    #[must_use]
    pub fn fan_out(&self, path: &str) -> usize {
        self.index_of(path)
            .map_or(0, |idx| self.successors(idx).len())
    }
}
