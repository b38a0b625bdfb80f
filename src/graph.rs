//! Multi-candidate recipe dependency graph.
//!
//! A requested recipe set can often be satisfied in more than one way: a
//! recipe may declare an *alternative group* (`[sdl2, pygame]`) where any one
//! member satisfies the dependency. Picking greedily is unsafe because a later
//! mandatory requirement may conflict with the early choice, so [`Graph`]
//! carries every way of resolving the alternatives seen so far as a separate
//! candidate [`DependencyGraph`] and prunes candidates as conflicts show up.
//!
//! Candidates are plain adjacency maps cloned by value on expansion. Counts
//! stay small in practice: each alternative group of size `k` multiplies the
//! candidate count by at most `k`, and candidates whose key-sets collapse to
//! the same node set are dropped straight away.
//!
//! ## Known precision loss
//!
//! Redundancy pruning compares only the *key-sets* of candidates. Two
//! candidates with identical nodes but different edges are treated as
//! duplicates and the later one is discarded, even though its build order
//! could differ.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use log::debug;

use crate::catalog::{Lookup, RecipeCatalog};
use crate::error::{Error, Result};
use crate::recipe::DependencySpec;

/// One concrete resolution: recipe name to the names it directly depends on.
///
/// Every name that appears as a dependency is also a key.
pub type DependencyGraph = BTreeMap<String, BTreeSet<String>>;

/// The set of live candidate graphs for one resolution request.
#[derive(Debug, Clone)]
pub struct Graph {
    graphs: Vec<DependencyGraph>,
}

impl Graph {
    /// Start with a single empty candidate.
    pub fn new() -> Self {
        Self {
            graphs: vec![DependencyGraph::new()],
        }
    }

    /// Record that `dependent` requires `dependency`.
    ///
    /// A single name is added to every candidate. For an alternative group
    /// `[d0, d1, .., dn]` every existing candidate takes `d0`, and is also
    /// cloned once per remaining alternative with that alternative's edge
    /// added to the clone. Redundant candidates are pruned afterwards.
    pub fn add(&mut self, dependent: &str, dependency: &DependencySpec) {
        match dependency {
            DependencySpec::Single(name) => {
                for graph in &mut self.graphs {
                    add_edge(graph, dependent, name);
                }
            }
            DependencySpec::Alternatives(choices) => {
                let Some((first, rest)) = choices.split_first() else {
                    return;
                };
                let existing = self.graphs.len();
                for index in 0..existing {
                    for alternative in rest {
                        let mut clone = self.graphs[index].clone();
                        add_edge(&mut clone, dependent, alternative);
                        self.graphs.push(clone);
                    }
                    add_edge(&mut self.graphs[index], dependent, first);
                }
            }
        }
        self.remove_redundant_graphs();
    }

    /// Add an ordering-only edge to candidates that already contain both
    /// names. Never introduces nodes.
    ///
    /// Call only after all mandatory edges have been added: this does not
    /// expand or prune candidates.
    pub fn add_optional(&mut self, dependent: &str, dependency: &str) {
        for graph in &mut self.graphs {
            if graph.contains_key(dependent) && graph.contains_key(dependency) {
                add_edge(graph, dependent, dependency);
            }
        }
    }

    /// Drop every candidate containing `name`.
    ///
    /// Returns true iff no candidates remain, i.e. `name` was unavoidable in
    /// every resolution.
    pub fn conflicts(&mut self, name: &str) -> bool {
        let before = self.graphs.len();
        self.graphs.retain(|graph| !graph.contains_key(name));
        if self.graphs.len() != before {
            debug!(
                "Dropped {} candidate graph(s) containing {}",
                before - self.graphs.len(),
                name
            );
        }
        self.graphs.is_empty()
    }

    /// Drop candidates that contain a conflicting pair.
    ///
    /// Checks every included recipe's `conflicts` list against the whole
    /// candidate. This catches conflicts introduced by alternative expansion
    /// after the incremental [`Graph::conflicts`] checks ran. Names with no
    /// recipe contribute no conflicts.
    pub fn remove_remaining_conflicts(&mut self, catalog: &RecipeCatalog) {
        self.graphs.retain(|graph| {
            let clash = graph.keys().find_map(|name| match catalog.lookup(name) {
                Lookup::Found(recipe) => recipe
                    .conflicts
                    .iter()
                    .find(|conflict| graph.contains_key(conflict.as_str()))
                    .map(|conflict| (name.clone(), conflict.clone())),
                Lookup::NotFound => None,
            });
            if let Some((name, conflict)) = &clash {
                debug!("Dropping candidate graph: {} conflicts with {}", name, conflict);
            }
            clash.is_none()
        });
    }

    /// Topologically sort candidate `index`.
    ///
    /// Repeatedly emits every node with no unresolved dependencies, sorted
    /// lexicographically, then removes them. Fails with
    /// [`Error::CycleDetected`] when a non-empty graph has no such node.
    pub fn find_order(&self, index: usize) -> Result<Vec<String>> {
        let graph = self.graphs.get(index).ok_or_else(|| Error::UnresolvableConflict {
            message: format!(
                "candidate graph {} requested but only {} candidate(s) exist",
                index,
                self.graphs.len()
            ),
        })?;

        let mut remaining = graph.clone();
        let mut order = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            // BTreeMap iteration already yields the leaves in sorted order
            let leaves: Vec<String> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(name, _)| name.clone())
                .collect();
            if leaves.is_empty() {
                return Err(Error::CycleDetected {
                    remaining: render_graph(&remaining),
                });
            }
            for leaf in &leaves {
                remaining.remove(leaf);
            }
            for deps in remaining.values_mut() {
                for leaf in &leaves {
                    deps.remove(leaf);
                }
            }
            order.extend(leaves);
        }
        Ok(order)
    }

    /// The live candidates, in creation order.
    pub fn candidates(&self) -> &[DependencyGraph] {
        &self.graphs
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }

    /// Remove candidates whose key-set equals that of an earlier candidate.
    fn remove_redundant_graphs(&mut self) {
        let mut seen: Vec<BTreeSet<&String>> = Vec::with_capacity(self.graphs.len());
        let mut keep = Vec::with_capacity(self.graphs.len());
        for graph in &self.graphs {
            let keys: BTreeSet<&String> = graph.keys().collect();
            let redundant = seen.contains(&keys);
            if !redundant {
                seen.push(keys);
            }
            keep.push(!redundant);
        }
        let mut flags = keep.into_iter();
        self.graphs.retain(|_| flags.next().unwrap_or(true));
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

fn add_edge(graph: &mut DependencyGraph, dependent: &str, dependency: &str) {
    graph.entry(dependency.to_string()).or_default();
    let deps = graph.entry(dependent.to_string()).or_default();
    if dependent != dependency {
        deps.insert(dependency.to_string());
    }
}

/// Render a graph as `name -> {a, b}` lines for diagnostics.
pub fn render_graph(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    for (name, deps) in graph {
        let deps: Vec<&str> = deps.iter().map(String::as_str).collect();
        let _ = writeln!(out, "  {} -> {{{}}}", name, deps.join(", "));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::Recipe;

    fn single(name: &str) -> DependencySpec {
        DependencySpec::Single(name.to_string())
    }

    fn alternatives(names: &[&str]) -> DependencySpec {
        DependencySpec::Alternatives(names.iter().map(|n| n.to_string()).collect())
    }

    fn keys(graph: &DependencyGraph) -> Vec<&str> {
        graph.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_self_edge_adds_node_only() {
        let mut graph = Graph::new();
        graph.add("a", &single("a"));
        assert_eq!(graph.len(), 1);
        assert!(graph.candidates()[0]["a"].is_empty());
    }

    #[test]
    fn test_linear_order() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        graph.add("b", &single("c"));
        assert_eq!(graph.find_order(0).unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_lexicographic_tie_break() {
        // A and C both depend only on B
        let mut graph = Graph::new();
        graph.add("A", &single("A"));
        graph.add("A", &single("B"));
        graph.add("B", &single("B"));
        graph.add("C", &single("C"));
        graph.add("C", &single("B"));
        assert_eq!(graph.find_order(0).unwrap(), vec!["B", "A", "C"]);
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        graph.add("b", &single("a"));
        let err = graph.find_order(0).unwrap_err();
        match err {
            Error::CycleDetected { remaining } => {
                assert!(remaining.contains("a -> {b}"));
                assert!(remaining.contains("b -> {a}"));
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_after_partial_order() {
        let mut graph = Graph::new();
        graph.add("root", &single("x"));
        graph.add("x", &single("y"));
        graph.add("y", &single("x"));
        graph.add("leaf", &single("leaf"));
        let err = graph.find_order(0).unwrap_err();
        let Error::CycleDetected { remaining } = err else {
            panic!("expected CycleDetected");
        };
        assert!(!remaining.contains("leaf"));
        assert!(remaining.contains("root"));
    }

    #[test]
    fn test_alternatives_expand_candidates() {
        let mut graph = Graph::new();
        graph.add("X", &single("X"));
        graph.add("X", &alternatives(&["Y", "Z"]));
        assert_eq!(graph.len(), 2);
        assert_eq!(keys(&graph.candidates()[0]), vec!["X", "Y"]);
        assert_eq!(keys(&graph.candidates()[1]), vec!["X", "Z"]);
        assert!(graph.candidates()[0]["X"].contains("Y"));
        assert!(graph.candidates()[1]["X"].contains("Z"));
    }

    #[test]
    fn test_conflict_removes_alternative_candidate() {
        let mut graph = Graph::new();
        graph.add("X", &single("X"));
        graph.add("X", &alternatives(&["Y", "Z"]));
        assert!(!graph.conflicts("Z"));
        assert_eq!(graph.len(), 1);
        assert_eq!(keys(&graph.candidates()[0]), vec!["X", "Y"]);
    }

    #[test]
    fn test_conflict_everywhere_empties_graph() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        assert!(graph.conflicts("b"));
        assert!(graph.is_empty());
        assert!(matches!(
            graph.find_order(0),
            Err(Error::UnresolvableConflict { .. })
        ));
    }

    #[test]
    fn test_conflict_absent_is_noop() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        assert!(!graph.conflicts("zzz"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_redundant_candidates_pruned() {
        // Both alternatives are already present, so both clones share a key-set
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        graph.add("a", &single("c"));
        graph.add("d", &alternatives(&["b", "c"]));
        assert_eq!(graph.len(), 1);
        // The earliest (choice "b") is the one kept
        assert!(graph.candidates()[0]["d"].contains("b"));
        assert!(!graph.candidates()[0]["d"].contains("c"));
    }

    #[test]
    fn test_alternatives_multiply_existing_candidates() {
        let mut graph = Graph::new();
        graph.add("a", &alternatives(&["b", "c"]));
        graph.add("d", &alternatives(&["e", "f", "g"]));
        assert_eq!(graph.len(), 6);
    }

    #[test]
    fn test_empty_alternative_group_is_noop() {
        let mut graph = Graph::new();
        graph.add("a", &single("a"));
        graph.add("a", &DependencySpec::Alternatives(vec![]));
        assert_eq!(graph.len(), 1);
        assert_eq!(keys(&graph.candidates()[0]), vec!["a"]);
    }

    #[test]
    fn test_add_optional_only_between_present_nodes() {
        let mut graph = Graph::new();
        graph.add("a", &single("a"));
        graph.add("b", &single("b"));
        graph.add_optional("a", "b");
        graph.add_optional("a", "missing");
        let candidate = &graph.candidates()[0];
        assert!(candidate["a"].contains("b"));
        assert!(!candidate.contains_key("missing"));
        assert_eq!(graph.find_order(0).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_remove_remaining_conflicts() {
        let catalog = RecipeCatalog::from_recipes(vec![
            Recipe::new("X").with_depends(vec![alternatives(&["Y", "Z"])]),
            Recipe::new("Y").with_conflicts(&["X"]),
            Recipe::new("Z"),
        ]);
        let mut graph = Graph::new();
        graph.add("X", &single("X"));
        graph.add("X", &alternatives(&["Y", "Z"]));
        graph.remove_remaining_conflicts(&catalog);
        assert_eq!(graph.len(), 1);
        assert_eq!(keys(&graph.candidates()[0]), vec!["X", "Z"]);
    }

    #[test]
    fn test_find_order_does_not_consume_graph() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        let first = graph.find_order(0).unwrap();
        let second = graph.find_order(0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_graph() {
        let mut graph = Graph::new();
        graph.add("a", &single("b"));
        let rendered = render_graph(&graph.candidates()[0]);
        assert_eq!(rendered, "  a -> {b}\n  b -> {}\n");
    }
}
