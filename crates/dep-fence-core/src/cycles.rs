//! Elementary cycle enumeration.
//!
//! Tarjan's SCC decomposition (via petgraph) runs once per detector and
//! narrows the search to nontrivial components. Inside each component the
//! elementary cycles are enumerated with Johnson's blocked-set algorithm,
//! driven by an explicit stack so deep graphs cannot overflow.

use std::collections::{HashMap, HashSet};
use std::fmt;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;

use crate::graph::DependencyGraph;

/// A closed elementary cycle: the first and last module are equal and no
/// other module repeats.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    modules: Vec<String>,
}

impl Cycle {
    /// The closed module path, e.g. `[a, b, a]`.
    #[must_use]
    pub fn modules(&self) -> &[String] {
        &self.modules
    }

    /// The distinct modules in cycle order, without the closing repeat.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.modules[..self.modules.len().saturating_sub(1)]
    }

    /// Number of distinct modules in the cycle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members().len()
    }

    /// Returns true if the cycle has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members().is_empty()
    }

    /// Returns true if `path` is part of the cycle.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.members().iter().any(|m| m == path)
    }

    /// Consumes the cycle, returning the closed module path.
    #[must_use]
    pub fn into_modules(self) -> Vec<String> {
        self.modules
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.modules.join(" -> "))
    }
}

/// A strongly connected component that can contain cycles.
#[derive(Debug, Clone)]
struct Component {
    /// Members sorted by node index, i.e. graph insertion order.
    members: Vec<NodeIndex>,
    rank: HashMap<NodeIndex, usize>,
}

/// Finds elementary cycles in a [`DependencyGraph`].
///
/// The SCC decomposition is computed in [`CycleDetector::new`] and shared
/// by every call to [`CycleDetector::cycles`].
#[derive(Debug, Clone)]
pub struct CycleDetector<'g> {
    graph: &'g DependencyGraph,
    components: Vec<Component>,
}

impl<'g> CycleDetector<'g> {
    /// Decomposes `graph` into strongly connected components.
    #[must_use]
    pub fn new(graph: &'g DependencyGraph) -> Self {
        let components: Vec<Component> = tarjan_scc(graph.graph())
            .into_iter()
            .filter(|scc| match scc.as_slice() {
                [single] => graph.successors(*single).contains(single),
                members => members.len() > 1,
            })
            .map(|mut members| {
                members.sort_unstable();
                let rank = members.iter().enumerate().map(|(i, n)| (*n, i)).collect();
                Component { members, rank }
            })
            .collect();

        tracing::debug!(
            modules = graph.module_count(),
            components = components.len(),
            "strongly connected components computed"
        );

        Self { graph, components }
    }

    /// Returns true if the graph contains no cycle at all.
    #[must_use]
    pub fn is_acyclic(&self) -> bool {
        self.components.is_empty()
    }

    /// Nontrivial strongly connected components as module paths, in
    /// discovery order.
    #[must_use]
    pub fn components(&self) -> Vec<Vec<&'g str>> {
        self.components
            .iter()
            .map(|c| {
                c.members
                    .iter()
                    .map(|n| self.graph.module(*n).path())
                    .collect()
            })
            .collect()
    }

    /// Iterates elementary cycles lazily.
    ///
    /// Each call starts a fresh enumeration and yields the same sequence.
    #[must_use]
    pub fn cycles(&self) -> Cycles<'_, 'g> {
        Cycles {
            detector: self,
            component: 0,
            start: 0,
            search: None,
        }
    }
}

/// Collects every elementary cycle of `graph`.
#[must_use]
pub fn find_cycles(graph: &DependencyGraph) -> Vec<Cycle> {
    CycleDetector::new(graph).cycles().collect()
}

/// Lazy iterator over elementary cycles. See [`CycleDetector::cycles`].
#[derive(Debug)]
pub struct Cycles<'d, 'g> {
    detector: &'d CycleDetector<'g>,
    component: usize,
    /// Rank of the next start module within the current component.
    start: usize,
    search: Option<Search>,
}

impl Iterator for Cycles<'_, '_> {
    type Item = Cycle;

    fn next(&mut self) -> Option<Self::Item> {
        let graph = self.detector.graph;
        loop {
            if let Some(search) = self.search.as_mut() {
                let component = &self.detector.components[self.component];
                if let Some(nodes) = search.next_cycle(graph, component) {
                    let modules = nodes
                        .into_iter()
                        .map(|n| graph.module(n).path().to_string())
                        .collect();
                    return Some(Cycle { modules });
                }
                self.search = None;
            }

            let component = self.detector.components.get(self.component)?;
            if self.start < component.members.len() {
                self.search = Some(Search::new(component.members[self.start], self.start));
                self.start += 1;
            } else {
                self.component += 1;
                self.start = 0;
            }
        }
    }
}

#[derive(Debug)]
struct Frame {
    node: NodeIndex,
    next: usize,
    found: bool,
}

/// Johnson's circuit search rooted at one start module.
///
/// Only modules of the current component ranked at or after the start
/// are visited, so each cycle is reported once, from its lowest member.
#[derive(Debug)]
struct Search {
    start: NodeIndex,
    min_rank: usize,
    blocked: HashSet<NodeIndex>,
    blocked_by: HashMap<NodeIndex, HashSet<NodeIndex>>,
    path: Vec<NodeIndex>,
    stack: Vec<Frame>,
}

impl Search {
    fn new(start: NodeIndex, min_rank: usize) -> Self {
        Self {
            start,
            min_rank,
            blocked: HashSet::from([start]),
            blocked_by: HashMap::new(),
            path: vec![start],
            stack: vec![Frame {
                node: start,
                next: 0,
                found: false,
            }],
        }
    }

    fn next_cycle(
        &mut self,
        graph: &DependencyGraph,
        component: &Component,
    ) -> Option<Vec<NodeIndex>> {
        let min_rank = self.min_rank;
        let in_scope = |n: &NodeIndex| component.rank.get(n).is_some_and(|r| *r >= min_rank);

        loop {
            let frame = self.stack.last_mut()?;
            let successors = graph.successors(frame.node);

            if let Some(&next) = successors.get(frame.next) {
                frame.next += 1;
                if !in_scope(&next) {
                    continue;
                }
                if next == self.start {
                    frame.found = true;
                    let mut cycle = self.path.clone();
                    cycle.push(self.start);
                    return Some(cycle);
                }
                if self.blocked.insert(next) {
                    self.path.push(next);
                    self.stack.push(Frame {
                        node: next,
                        next: 0,
                        found: false,
                    });
                }
                continue;
            }

            let Some(done) = self.stack.pop() else {
                return None;
            };
            if done.found {
                self.unblock(done.node);
            } else {
                for w in successors.iter().filter(|w| in_scope(w)) {
                    self.blocked_by.entry(*w).or_default().insert(done.node);
                }
            }
            self.path.pop();
            if let Some(parent) = self.stack.last_mut() {
                parent.found |= done.found;
            }
        }
    }

    fn unblock(&mut self, node: NodeIndex) {
        let mut pending = vec![node];
        while let Some(u) = pending.pop() {
            if self.blocked.remove(&u) {
                if let Some(waiting) = self.blocked_by.remove(&u) {
                    pending.extend(waiting);
                }
            }
        }
    }
}
