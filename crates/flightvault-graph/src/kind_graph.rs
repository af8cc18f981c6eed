//! Kind-level reference graph, built once from the registry rather than
//! replayed from an event history — there is no history to reconstruct
//! here, only a fixed set of declared edges. Uses `petgraph::DiGraph` as
//! the underlying adjacency structure for traversal and cycle checks.

use std::collections::{BTreeSet, HashMap};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use flightvault_core::registry::Registry;

/// `K -> K'` edge for every declared outgoing reference, so cascade and
/// cycle analysis can walk the registry as a graph instead of re-deriving
/// adjacency from `references` on every call.
pub struct KindGraph {
    graph: DiGraph<String, ()>,
    index_of: HashMap<String, NodeIndex>,
}

impl KindGraph {
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut index_of = HashMap::new();

        for kind in registry.kinds() {
            let idx = graph.add_node(kind.name.clone());
            index_of.insert(kind.name.clone(), idx);
        }

        for kind in registry.kinds() {
            let from = index_of[&kind.name];
            for reference in &kind.references {
                if let Some(&to) = index_of.get(&reference.target_kind) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, index_of }
    }

    /// Kinds with a declared outgoing reference to `kind` — the incoming
    /// side of §4.F's cascade-impact analysis.
    pub fn referrers_of(&self, kind: &str) -> Vec<String> {
        let Some(&idx) = self.index_of.get(kind) else {
            return Vec::new();
        };
        // A kind can declare more than one reference to the same target
        // (routes -> airports twice), so dedup before returning.
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .map(|n| self.graph[n].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Kinds `kind` declares an outgoing reference to.
    pub fn referents_of(&self, kind: &str) -> Vec<String> {
        let Some(&idx) = self.index_of.get(kind) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|n| self.graph[n].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// True if the registry's declared references contain a cycle — a
    /// misconfiguration the validator surfaces as a warning rather than
    /// failing on, since a restore can still proceed kind-by-kind.
    pub fn has_cycle(&self) -> bool {
        petgraph::algo::is_cyclic_directed(&self.graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightvault_core::registry::default_registry;

    #[test]
    fn routes_referents_are_airports() {
        let graph = KindGraph::from_registry(&default_registry());
        assert_eq!(graph.referents_of("routes"), vec!["airports".to_string()]);
    }

    #[test]
    fn airports_referrers_include_routes() {
        let graph = KindGraph::from_registry(&default_registry());
        assert_eq!(graph.referrers_of("airports"), vec!["routes".to_string()]);
    }

    #[test]
    fn default_registry_has_no_cycle() {
        let graph = KindGraph::from_registry(&default_registry());
        assert!(!graph.has_cycle());
    }
}
