//! Graph analytics over a petgraph view of the formula graph.
//!
//! All functions take a [`FormulaGraph`] reference and an optional edge-type
//! filter, and return structured results sorted by relevance.

use std::collections::{HashMap, HashSet};

use petgraph::algo::{astar, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::edge::EdgeType;

use super::FormulaGraph;

/// A petgraph snapshot: nodes carry formula ids, edges carry their type.
#[derive(Debug, Clone)]
pub struct GraphView {
    pub graph: DiGraph<String, EdgeType>,
    pub index: HashMap<String, NodeIndex>,
}

/// Build a petgraph view, keeping only edges whose type is in `types` (all
/// edges when `None`). Nodes are inserted in id order.
pub fn to_digraph(kg: &FormulaGraph, types: Option<&HashSet<EdgeType>>) -> GraphView {
    let mut graph = DiGraph::new();
    let mut index = HashMap::new();
    for id in kg.ids() {
        index.insert(id.to_string(), graph.add_node(id.to_string()));
    }
    for edge in kg.edges() {
        if types.is_some_and(|t| !t.contains(&edge.edge_type)) {
            continue;
        }
        if let (Some(&s), Some(&t)) = (index.get(&edge.source_id), index.get(&edge.target_id)) {
            graph.add_edge(s, t, edge.edge_type);
        }
    }
    GraphView { graph, index }
}

// ---------------------------------------------------------------------------
// Degree centrality
// ---------------------------------------------------------------------------

/// Degree centrality metrics for a single formula.
#[derive(Debug, Clone)]
pub struct DegreeCentrality {
    pub formula_id: String,
    pub in_degree: usize,
    pub out_degree: usize,
    /// Total degree (in + out).
    pub total: usize,
}

/// Compute degree centrality for all formulas. Sorted by total degree desc,
/// then id.
pub fn degree_centrality(kg: &FormulaGraph) -> Vec<DegreeCentrality> {
    let mut results: Vec<DegreeCentrality> = kg
        .ids()
        .into_iter()
        .map(|id| {
            let out_degree = kg.get_edges_from(id, None).len();
            let in_degree = kg.get_edges_to(id, None).len();
            DegreeCentrality {
                formula_id: id.to_string(),
                in_degree,
                out_degree,
                total: in_degree + out_degree,
            }
        })
        .collect();
    results.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.formula_id.cmp(&b.formula_id)));
    results
}

// ---------------------------------------------------------------------------
// Strongly connected components
// ---------------------------------------------------------------------------

/// Formulas that are mutually reachable over the selected edge types.
///
/// Singletons are only reported when they carry a self-loop, so every
/// component returned contains at least one cycle. Members are sorted; the
/// list is sorted by size desc.
pub fn strongly_connected_components(
    kg: &FormulaGraph,
    types: Option<&HashSet<EdgeType>>,
) -> Vec<Vec<String>> {
    let view = to_digraph(kg, types);
    let mut components: Vec<Vec<String>> = tarjan_scc(&view.graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || view.graph.contains_edge(scc[0], scc[0]))
        .map(|scc| {
            let mut members: Vec<String> = scc.iter().map(|&idx| view.graph[idx].clone()).collect();
            members.sort();
            members
        })
        .collect();
    components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    components
}

// ---------------------------------------------------------------------------
// Shortest path
// ---------------------------------------------------------------------------

/// Shortest path by hop count between two formulas over the selected edge
/// types. `None` if either end is missing or no route exists.
pub fn shortest_path(
    kg: &FormulaGraph,
    from: &str,
    to: &str,
    types: Option<&HashSet<EdgeType>>,
) -> Option<Vec<String>> {
    let view = to_digraph(kg, types);
    let from_idx = *view.index.get(from)?;
    let to_idx = *view.index.get(to)?;
    let (_cost, path) = astar(&view.graph, from_idx, |n| n == to_idx, |_| 1usize, |_| 0usize)?;
    Some(path.into_iter().map(|idx| view.graph[idx].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::formula::Formula;

    fn graph(ids: &[&str], edges: &[(&str, &str, EdgeType)]) -> FormulaGraph {
        let mut g = FormulaGraph::new();
        for id in ids {
            g.add_formula(Formula::new(*id, *id).with_id(*id), false);
        }
        for (s, t, ty) in edges {
            g.add_edge(Edge::new(*s, *t, *ty));
        }
        g
    }

    #[test]
    fn degree_centrality_hub_first() {
        use EdgeType::CombinesWith as C;
        let g = graph(&["hub", "a", "b", "c"], &[("hub", "a", C), ("hub", "b", C), ("hub", "c", C)]);
        let results = degree_centrality(&g);
        assert_eq!(results[0].formula_id, "hub");
        assert_eq!(results[0].out_degree, 3);
        assert_eq!(results[1].in_degree, 1);
    }

    #[test]
    fn scc_respects_type_filter() {
        let g = graph(
            &["a", "b", "c", "d"],
            &[
                ("a", "b", EdgeType::DerivesFrom),
                ("b", "c", EdgeType::DerivesFrom),
                ("c", "a", EdgeType::DerivesFrom),
                ("c", "d", EdgeType::EquivalentTo),
                ("d", "c", EdgeType::EquivalentTo),
            ],
        );
        assert_eq!(strongly_connected_components(&g, None), vec![vec!["a", "b", "c", "d"]]);

        let scope = EdgeType::cycle_scope();
        assert_eq!(strongly_connected_components(&g, Some(&scope)), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn acyclic_graph_has_no_components() {
        let g = graph(&["a", "b"], &[("a", "b", EdgeType::DerivesFrom)]);
        assert!(strongly_connected_components(&g, None).is_empty());
    }

    #[test]
    fn shortest_path_finds_route() {
        use EdgeType::DerivesFrom as D;
        let g = graph(&["a", "b", "c"], &[("a", "b", D), ("b", "c", D), ("a", "c", EdgeType::AnalogousTo)]);
        assert_eq!(shortest_path(&g, "a", "c", None).unwrap(), ["a", "c"]);
        let derivation = HashSet::from([D]);
        assert_eq!(shortest_path(&g, "a", "c", Some(&derivation)).unwrap(), ["a", "b", "c"]);
        assert!(shortest_path(&g, "c", "a", None).is_none());
        assert!(shortest_path(&g, "a", "nope", None).is_none());
    }
}
