//! Graph-level consistency audit.
//!
//! Detects:
//!
//! - **Contradictions**: a `CONTRADICTS` edge between two `ACCEPTED` formulas (high)
//! - **Cycles**: loops over derivation/dependency edges (medium)
//! - **Orphans**: non-foundational formulas with no edges at all (low)
//! - **Low confidence**: `ACCEPTED` formulas below [`LOW_CONFIDENCE_THRESHOLD`] (medium)
//!
//! Issues are *reported*, never repaired. The caller decides what to do.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::edge::EdgeType;
use crate::formula::FormulaStatus;

use super::FormulaGraph;

/// Accepted formulas below this confidence are flagged.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Contradiction,
    Cycle,
    Orphan,
    LowConfidence,
}

/// One finding of the consistency audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub kind: IssueKind,
    pub severity: Severity,
    /// Formulas involved, in a kind-specific order (edge endpoints, cycle order).
    pub formula_ids: Vec<String>,
    pub message: String,
}

impl FormulaGraph {
    /// Audit the graph using the default cycle scope
    /// ([`EdgeType::cycle_scope`]).
    pub fn check_consistency(&self) -> Vec<ConsistencyIssue> {
        self.check_consistency_scoped(&EdgeType::cycle_scope())
    }

    /// Audit the graph, scanning for cycles only over `cycle_types`.
    pub fn check_consistency_scoped(&self, cycle_types: &HashSet<EdgeType>) -> Vec<ConsistencyIssue> {
        let mut issues = Vec::new();

        for edge in self.edges_of_type(EdgeType::Contradicts) {
            let accepted = |id: &str| {
                self.get_formula(id)
                    .is_some_and(|f| f.status == FormulaStatus::Accepted)
            };
            if accepted(&edge.source_id) && accepted(&edge.target_id) {
                issues.push(ConsistencyIssue {
                    kind: IssueKind::Contradiction,
                    severity: Severity::High,
                    formula_ids: vec![edge.source_id.clone(), edge.target_id.clone()],
                    message: format!(
                        "accepted formulas {} and {} contradict each other",
                        edge.source_id, edge.target_id
                    ),
                });
            }
        }

        for cycle in self.find_cycles(cycle_types) {
            let message = format!("derivation cycle: {}", cycle.join(" -> "));
            issues.push(ConsistencyIssue {
                kind: IssueKind::Cycle,
                severity: Severity::Medium,
                formula_ids: cycle,
                message,
            });
        }

        for formula in self.formulas_sorted() {
            if self.degree(&formula.id) == 0 && !formula.layer.is_foundational() {
                issues.push(ConsistencyIssue {
                    kind: IssueKind::Orphan,
                    severity: Severity::Low,
                    formula_ids: vec![formula.id.clone()],
                    message: format!("{} ({}) has no relationships", formula.id, formula.layer),
                });
            }
            if formula.status == FormulaStatus::Accepted
                && formula.confidence < LOW_CONFIDENCE_THRESHOLD
            {
                issues.push(ConsistencyIssue {
                    kind: IssueKind::LowConfidence,
                    severity: Severity::Medium,
                    formula_ids: vec![formula.id.clone()],
                    message: format!(
                        "{} is accepted with confidence {:.2}",
                        formula.id, formula.confidence
                    ),
                });
            }
        }

        tracing::info!(
            formulas = self.len(),
            edges = self.edges().len(),
            issues = issues.len(),
            "consistency audit complete"
        );
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::Edge;
    use crate::formula::{Formula, FormulaLayer};

    fn f(id: &str) -> Formula {
        Formula::new(id, id).with_id(id).with_layer(FormulaLayer::Fundamental)
    }

    fn of_kind(issues: &[ConsistencyIssue], kind: IssueKind) -> Vec<&ConsistencyIssue> {
        issues.iter().filter(|i| i.kind == kind).collect()
    }

    #[test]
    fn accepted_contradiction_is_high_severity() {
        let mut g = FormulaGraph::new();
        g.add_formula(f("a"), false);
        g.add_formula(f("b"), false);
        g.add_formula(f("c").with_status(FormulaStatus::Contested), false);
        g.add_edge(Edge::new("a", "b", EdgeType::Contradicts));
        g.add_edge(Edge::new("a", "c", EdgeType::Contradicts));

        let issues = g.check_consistency();
        let contradictions = of_kind(&issues, IssueKind::Contradiction);
        assert_eq!(contradictions.len(), 1);
        assert_eq!(contradictions[0].severity, Severity::High);
        assert_eq!(contradictions[0].formula_ids, ["a", "b"]);
    }

    #[test]
    fn derivation_cycle_reported_unless_scoped_out() {
        let mut g = FormulaGraph::new();
        for id in ["a", "b", "c"] {
            g.add_formula(f(id), false);
        }
        g.add_edge(Edge::new("a", "b", EdgeType::DerivesFrom));
        g.add_edge(Edge::new("b", "c", EdgeType::DerivesFrom));
        g.add_edge(Edge::new("c", "a", EdgeType::DerivesFrom));

        let cycles = of_kind(&g.check_consistency(), IssueKind::Cycle).len();
        assert_eq!(cycles, 1);

        let mut scope = EdgeType::cycle_scope();
        scope.remove(&EdgeType::DerivesFrom);
        assert!(of_kind(&g.check_consistency_scoped(&scope), IssueKind::Cycle).is_empty());
    }

    #[test]
    fn orphans_exclude_foundational_layers() {
        let mut g = FormulaGraph::new();
        g.add_formula(f("axiom").with_layer(FormulaLayer::Axiom), false);
        g.add_formula(f("law"), false);
        g.add_formula(f("fit").with_layer(FormulaLayer::Phenomenological), false);

        let issues = g.check_consistency();
        let orphans = of_kind(&issues, IssueKind::Orphan);
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].formula_ids, ["fit"]);
        assert_eq!(orphans[0].severity, Severity::Low);
    }

    #[test]
    fn low_confidence_accepted_formula_is_flagged() {
        let mut g = FormulaGraph::new();
        g.add_formula(f("shaky").with_confidence(0.3), false);
        g.add_formula(f("candidate").with_confidence(0.3).with_status(FormulaStatus::Candidate), false);

        let issues = g.check_consistency();
        let low = of_kind(&issues, IssueKind::LowConfidence);
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].formula_ids, ["shaky"]);
    }

    #[test]
    fn clean_graph_has_no_issues() {
        let mut g = FormulaGraph::new();
        g.add_formula(f("a"), false);
        g.add_formula(f("b").with_layer(FormulaLayer::Effective), false);
        g.add_edge(Edge::new("b", "a", EdgeType::DerivesFrom));
        assert!(g.check_consistency().is_empty());
    }
}
