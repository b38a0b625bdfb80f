//! Property-based tests for the candidate dependency graph.
//!
//! Graphs are generated from random edge lists over a small name pool.
//! Edges always point from a higher index to a lower one, so generated
//! graphs are acyclic unless a test adds a back edge on purpose.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeSet;

    use crate::error::Error;
    use crate::graph::Graph;
    use crate::recipe::DependencySpec;
    use proptest::prelude::*;

    fn name(index: usize) -> String {
        format!("r{:02}", index)
    }

    fn acyclic_graph(edges: &[(usize, usize)]) -> Graph {
        let mut graph = Graph::new();
        for &(a, b) in edges {
            let (dependent, dependency) = if a >= b { (a, b) } else { (b, a) };
            graph.add(&name(dependent), &DependencySpec::Single(name(dependency)));
        }
        graph
    }

    fn edge_list() -> impl Strategy<Value = Vec<(usize, usize)>> {
        prop::collection::vec((0usize..10, 0usize..10), 1..25)
    }

    // ============================================================================
    // find_order property tests
    // ============================================================================

    proptest! {
        /// Property: the order is a permutation of the candidate's nodes
        #[test]
        fn order_contains_every_node_once(edges in edge_list()) {
            let graph = acyclic_graph(&edges);
            let order = graph.find_order(0).unwrap();
            let nodes: BTreeSet<&String> = graph.candidates()[0].keys().collect();
            let ordered: BTreeSet<&String> = order.iter().collect();
            prop_assert_eq!(order.len(), nodes.len());
            prop_assert_eq!(ordered, nodes);
        }

        /// Property: every dependency comes before its dependent
        #[test]
        fn order_respects_dependencies(edges in edge_list()) {
            let graph = acyclic_graph(&edges);
            let order = graph.find_order(0).unwrap();
            let position = |n: &str| order.iter().position(|o| o == n);
            for (dependent, deps) in &graph.candidates()[0] {
                for dep in deps {
                    if dep != dependent {
                        prop_assert!(
                            position(dep) < position(dependent),
                            "{} should be built before {} in {:?}",
                            dep,
                            dependent,
                            order
                        );
                    }
                }
            }
        }

        /// Property: sorting is deterministic and leaves the graph intact
        #[test]
        fn order_is_deterministic(edges in edge_list()) {
            let graph = acyclic_graph(&edges);
            let first = graph.find_order(0).unwrap();
            let second = graph.find_order(0).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Property: a back edge over an existing chain is reported as a cycle
        #[test]
        fn back_edge_is_a_cycle(len in 2usize..8) {
            let mut graph = Graph::new();
            for i in 1..len {
                graph.add(&name(i), &DependencySpec::Single(name(i - 1)));
            }
            graph.add(&name(0), &DependencySpec::Single(name(len - 1)));
            let is_cycle = matches!(graph.find_order(0), Err(Error::CycleDetected { .. }));
            prop_assert!(is_cycle);
        }
    }

    // ============================================================================
    // Candidate expansion and pruning property tests
    // ============================================================================

    proptest! {
        /// Property: an alternative group never yields more candidates than choices
        #[test]
        fn alternatives_bounded_by_choices(choices in prop::collection::btree_set(0usize..10, 1..6)) {
            let mut graph = Graph::new();
            let names: Vec<String> = choices.iter().map(|&i| name(i + 10)).collect();
            graph.add("root", &DependencySpec::Alternatives(names.clone()));
            prop_assert!(graph.len() <= names.len());
            for candidate in graph.candidates() {
                let picked = names.iter().filter(|n| candidate.contains_key(n.as_str())).count();
                prop_assert_eq!(picked, 1);
            }
        }

        /// Property: no two surviving candidates share a node set
        #[test]
        fn candidates_have_distinct_key_sets(
            groups in prop::collection::vec(prop::collection::vec(0usize..6, 1..4), 1..4)
        ) {
            let mut graph = Graph::new();
            for (i, group) in groups.iter().enumerate() {
                let names = group.iter().map(|&g| name(g)).collect();
                graph.add(&format!("top{}", i), &DependencySpec::Alternatives(names));
            }
            let key_sets: Vec<BTreeSet<&String>> =
                graph.candidates().iter().map(|c| c.keys().collect()).collect();
            let unique: BTreeSet<&BTreeSet<&String>> = key_sets.iter().collect();
            prop_assert_eq!(unique.len(), key_sets.len());
        }

        /// Property: after a conflict, no candidate contains the conflicting name
        #[test]
        fn conflict_removes_name_everywhere(
            choices in prop::collection::btree_set(0usize..8, 2..6),
            victim in 0usize..8,
        ) {
            let mut graph = Graph::new();
            let names: Vec<String> = choices.iter().map(|&i| name(i)).collect();
            graph.add("root", &DependencySpec::Alternatives(names));
            let emptied = graph.conflicts(&name(victim));
            prop_assert_eq!(emptied, graph.is_empty());
            for candidate in graph.candidates() {
                prop_assert!(!candidate.contains_key(&name(victim)));
            }
        }

        /// Property: optional edges never introduce nodes
        #[test]
        fn optional_edges_add_no_nodes(edges in edge_list(), a in 0usize..12, b in 0usize..12) {
            let mut graph = acyclic_graph(&edges);
            let before: BTreeSet<String> = graph.candidates()[0].keys().cloned().collect();
            graph.add_optional(&name(a.max(b)), &name(a.min(b)));
            let after: BTreeSet<String> = graph.candidates()[0].keys().cloned().collect();
            prop_assert_eq!(before, after);
        }
    }
}
