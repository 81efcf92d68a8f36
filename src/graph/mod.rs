//! Knowledge graph: the authoritative store of formulas and typed edges.
//!
//! [`FormulaGraph`] owns every [`Formula`] node and [`Edge`] relationship and
//! keeps secondary indices incrementally consistent:
//!
//! - **Formula indices**: by domain, tag, status and layer (sets of ids)
//! - **Edge indices**: outgoing, incoming and by type (positions into the edge list)
//!
//! Expected failures (duplicate id, missing endpoint, absent node) are reported
//! through `bool` / `Option`. The graph does no internal locking: reads take
//! `&self`, mutations take `&mut self`, and callers sharing one instance across
//! threads serialize writers themselves.

pub mod analytics;
pub mod chain;
pub mod consistency;
pub mod paths;
pub mod persist;
pub mod query;

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, EdgeType};
use crate::error::{StoreError, StoreResult};
use crate::formula::{Formula, FormulaLayer, FormulaStatus};

pub use consistency::{ConsistencyIssue, IssueKind, Severity};
pub use query::FormulaQuery;

/// Counts derived from the maintained indices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphStats {
    /// Number of formulas in the graph.
    pub total_formulas: usize,
    /// Number of edges in the graph.
    pub total_edges: usize,
    /// Formula count per domain. Formulas without a domain are not counted.
    pub by_domain: BTreeMap<String, usize>,
    /// Formula count per lifecycle status.
    pub by_status: BTreeMap<FormulaStatus, usize>,
    /// Formula count per theory layer.
    pub by_layer: BTreeMap<FormulaLayer, usize>,
    /// Edge count per relationship type.
    pub by_edge_type: BTreeMap<EdgeType, usize>,
}

/// In-memory formula knowledge graph with secondary indices.
#[derive(Debug, Clone, Default)]
pub struct FormulaGraph {
    formulas: HashMap<String, Formula>,
    edges: Vec<Edge>,
    /// Formula id → positions in `edges` where it is the source.
    outgoing: HashMap<String, Vec<usize>>,
    /// Formula id → positions in `edges` where it is the target.
    incoming: HashMap<String, Vec<usize>>,
    by_edge_type: HashMap<EdgeType, Vec<usize>>,
    by_domain: HashMap<String, HashSet<String>>,
    by_tag: HashMap<String, HashSet<String>>,
    by_status: HashMap<FormulaStatus, HashSet<String>>,
    by_layer: HashMap<FormulaLayer, HashSet<String>>,
}

impl FormulaGraph {
    /// Create a new empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from already-parsed records.
    ///
    /// Duplicate formula ids and edges referencing missing formulas are hard
    /// errors here: this is the path persisted data takes, and corrupt data is
    /// never silently repaired.
    pub fn from_parts(formulas: Vec<Formula>, edges: Vec<Edge>) -> StoreResult<Self> {
        let mut graph = Self::new();
        for formula in formulas {
            let formula = formula.normalized();
            if graph.formulas.contains_key(&formula.id) {
                return Err(StoreError::DuplicateFormula { id: formula.id });
            }
            graph.index_formula(&formula);
            graph.formulas.insert(formula.id.clone(), formula);
        }
        for edge in edges {
            let edge = edge.normalized();
            if !graph.contains(&edge.source_id) || !graph.contains(&edge.target_id) {
                return Err(StoreError::DanglingEdge {
                    source_id: edge.source_id,
                    target_id: edge.target_id,
                    edge_type: edge.edge_type.to_string(),
                });
            }
            graph.edges.push(edge);
        }
        graph.rebuild_edge_indices();
        Ok(graph)
    }

    // -----------------------------------------------------------------------
    // Formulas
    // -----------------------------------------------------------------------

    /// Insert a formula.
    ///
    /// Returns `false` and leaves the graph untouched if the id already exists
    /// and `overwrite` is not set. On overwrite the old entry's index
    /// memberships are dropped before the new entry's are added; edges are kept.
    pub fn add_formula(&mut self, formula: Formula, overwrite: bool) -> bool {
        let formula = formula.normalized();
        if self.formulas.contains_key(&formula.id) {
            if !overwrite {
                tracing::debug!(id = %formula.id, "formula already present, not overwriting");
                return false;
            }
            if let Some(old) = self.formulas.remove(&formula.id) {
                self.unindex_formula(&old);
            }
        }
        tracing::debug!(id = %formula.id, name = %formula.name, overwrite, "adding formula");
        self.index_formula(&formula);
        self.formulas.insert(formula.id.clone(), formula);
        true
    }

    /// Remove a formula and every edge touching it.
    pub fn remove_formula(&mut self, id: &str) -> Option<Formula> {
        let formula = self.formulas.remove(id)?;
        self.unindex_formula(&formula);
        let before = self.edges.len();
        self.edges.retain(|e| !e.touches(id));
        let dropped = before - self.edges.len();
        self.rebuild_edge_indices();
        tracing::debug!(id, dropped_edges = dropped, "removed formula");
        Some(formula)
    }

    pub fn get_formula(&self, id: &str) -> Option<&Formula> {
        self.formulas.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formulas.contains_key(id)
    }

    /// Number of formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// All formulas, in no particular order.
    pub fn formulas(&self) -> impl Iterator<Item = &Formula> {
        self.formulas.values()
    }

    /// All formula ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.formulas.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// All formulas sorted by id.
    pub fn formulas_sorted(&self) -> Vec<&Formula> {
        let mut formulas: Vec<&Formula> = self.formulas.values().collect();
        formulas.sort_by(|a, b| a.id.cmp(&b.id));
        formulas
    }

    /// Formulas whose input symbols are all in `inputs` (when given) and whose
    /// output symbols intersect `outputs` (when given). Sorted by id.
    pub fn find_by_input_output(
        &self,
        inputs: Option<&HashSet<String>>,
        outputs: Option<&HashSet<String>>,
    ) -> Vec<&Formula> {
        self.formulas_sorted()
            .into_iter()
            .filter(|f| inputs.is_none_or(|known| f.inputs.iter().all(|v| known.contains(&v.symbol))))
            .filter(|f| {
                outputs.is_none_or(|wanted| f.outputs.iter().any(|v| wanted.contains(&v.symbol)))
            })
            .collect()
    }

    /// Formulas that produce `symbol`, sorted by id.
    pub fn producers_of(&self, symbol: &str) -> Vec<&Formula> {
        self.formulas_sorted()
            .into_iter()
            .filter(|f| f.outputs.iter().any(|v| v.symbol == symbol))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Add an edge. Returns `false` if either endpoint is missing.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        let edge = edge.normalized();
        if !self.contains(&edge.source_id) || !self.contains(&edge.target_id) {
            tracing::warn!(
                source = %edge.source_id,
                target = %edge.target_id,
                edge_type = %edge.edge_type,
                "rejecting edge with missing endpoint"
            );
            return false;
        }
        let pos = self.edges.len();
        self.outgoing.entry(edge.source_id.clone()).or_default().push(pos);
        self.incoming.entry(edge.target_id.clone()).or_default().push(pos);
        self.by_edge_type.entry(edge.edge_type).or_default().push(pos);
        tracing::debug!(
            source = %edge.source_id,
            target = %edge.target_id,
            edge_type = %edge.edge_type,
            "adding edge"
        );
        self.edges.push(edge);
        true
    }

    /// Remove the most recently added edge matching `(source, target, type)`.
    pub fn remove_edge(&mut self, source: &str, target: &str, edge_type: EdgeType) -> bool {
        let Some(pos) = self
            .edges
            .iter()
            .rposition(|e| e.matches(source, target, edge_type))
        else {
            return false;
        };
        self.edges.remove(pos);
        self.rebuild_edge_indices();
        true
    }

    /// Outgoing edges of `id`, optionally restricted to one type.
    pub fn get_edges_from(&self, id: &str, edge_type: Option<EdgeType>) -> Vec<&Edge> {
        self.indexed_edges(self.outgoing.get(id), edge_type)
    }

    /// Incoming edges of `id`, optionally restricted to one type.
    pub fn get_edges_to(&self, id: &str, edge_type: Option<EdgeType>) -> Vec<&Edge> {
        self.indexed_edges(self.incoming.get(id), edge_type)
    }

    /// All edges of one type, in insertion order.
    pub fn edges_of_type(&self, edge_type: EdgeType) -> Vec<&Edge> {
        self.indexed_edges(self.by_edge_type.get(&edge_type), None)
    }

    /// All edges, in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Number of edges touching `id` in either direction.
    pub fn degree(&self, id: &str) -> usize {
        self.outgoing.get(id).map_or(0, Vec::len) + self.incoming.get(id).map_or(0, Vec::len)
    }

    fn indexed_edges(&self, positions: Option<&Vec<usize>>, edge_type: Option<EdgeType>) -> Vec<&Edge> {
        positions
            .into_iter()
            .flatten()
            .map(|&pos| &self.edges[pos])
            .filter(|e| edge_type.is_none_or(|t| e.edge_type == t))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Statistics
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_formulas: self.formulas.len(),
            total_edges: self.edges.len(),
            by_domain: self.by_domain.iter().map(|(k, v)| (k.clone(), v.len())).collect(),
            by_status: self.by_status.iter().map(|(k, v)| (*k, v.len())).collect(),
            by_layer: self.by_layer.iter().map(|(k, v)| (*k, v.len())).collect(),
            by_edge_type: self.by_edge_type.iter().map(|(k, v)| (*k, v.len())).collect(),
        }
    }

    // -----------------------------------------------------------------------
    // Index maintenance
    // -----------------------------------------------------------------------

    fn index_formula(&mut self, f: &Formula) {
        if !f.domain.is_empty() {
            self.by_domain.entry(f.domain.clone()).or_default().insert(f.id.clone());
        }
        for tag in &f.tags {
            self.by_tag.entry(tag.clone()).or_default().insert(f.id.clone());
        }
        self.by_status.entry(f.status).or_default().insert(f.id.clone());
        self.by_layer.entry(f.layer).or_default().insert(f.id.clone());
    }

    fn unindex_formula(&mut self, f: &Formula) {
        remove_member(&mut self.by_domain, &f.domain, &f.id);
        for tag in &f.tags {
            remove_member(&mut self.by_tag, tag, &f.id);
        }
        remove_member(&mut self.by_status, &f.status, &f.id);
        remove_member(&mut self.by_layer, &f.layer, &f.id);
    }

    fn rebuild_edge_indices(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
        self.by_edge_type.clear();
        for (pos, edge) in self.edges.iter().enumerate() {
            self.outgoing.entry(edge.source_id.clone()).or_default().push(pos);
            self.incoming.entry(edge.target_id.clone()).or_default().push(pos);
            self.by_edge_type.entry(edge.edge_type).or_default().push(pos);
        }
    }
}

fn remove_member<K>(index: &mut HashMap<K, HashSet<String>>, key: &K, id: &str)
where
    K: std::hash::Hash + Eq,
{
    if let Some(members) = index.get_mut(key) {
        members.remove(id);
        if members.is_empty() {
            index.remove(key);
        }
    }
}
