//! Priority-first search over derivation states.
//!
//! A state is the set of symbols known so far plus the set of formulas already
//! applied. States are popped cheapest first (ties by insertion order), and a
//! `(available, used)` pair is expanded at most once, so the same formula set
//! reached in a different order is not explored twice.

use std::cmp::Ordering;
use std::collections::{BTreeSet, BinaryHeap, HashSet};

use crate::formula::{Context, Formula};

use super::DerivationPlanner;

/// A goal-reaching formula sequence before it is replayed into a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlan {
    pub formula_ids: Vec<String>,
    pub cost: f64,
}

#[derive(Debug)]
struct State {
    cost: f64,
    seq: u64,
    available: BTreeSet<String>,
    used: BTreeSet<String>,
    path: Vec<String>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    // Reversed so the max-heap pops the cheapest, then the oldest.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

type StateKey = (BTreeSet<String>, BTreeSet<String>);

impl DerivationPlanner<'_> {
    /// Run the search and return goal-reaching sequences in the order found
    /// (non-decreasing cost).
    pub fn search(
        &self,
        inputs: &BTreeSet<String>,
        outputs: &BTreeSet<String>,
        context: &Context,
    ) -> Vec<RawPlan> {
        let cfg = self.config();

        // Applicability and cost depend only on the formula and context.
        let candidates: Vec<(&Formula, f64)> = self
            .graph()
            .formulas_sorted()
            .into_iter()
            .filter(|f| {
                let (ok, reasons) = f.is_applicable(context);
                if !ok {
                    tracing::debug!(formula = %f.id, ?reasons, "formula not applicable");
                }
                ok
            })
            .map(|f| (f, self.formula_cost(f, context)))
            .collect();

        let mut heap = BinaryHeap::new();
        let mut visited: HashSet<StateKey> = HashSet::new();
        let mut found = Vec::new();
        let mut seq = 0u64;
        let mut expansions = 0usize;

        heap.push(State {
            cost: 0.0,
            seq,
            available: inputs.clone(),
            used: BTreeSet::new(),
            path: Vec::new(),
        });

        while let Some(state) = heap.pop() {
            if found.len() >= cfg.max_plans {
                break;
            }
            if !visited.insert((state.available.clone(), state.used.clone())) {
                continue;
            }
            if outputs.is_subset(&state.available) {
                found.push(RawPlan {
                    formula_ids: state.path,
                    cost: state.cost,
                });
                continue;
            }
            if state.path.len() >= cfg.max_steps {
                continue;
            }
            if expansions >= cfg.max_expansions {
                tracing::warn!(
                    expansions,
                    plans = found.len(),
                    "search expansion limit reached; returning partial results"
                );
                break;
            }
            expansions += 1;

            for &(formula, step_cost) in &candidates {
                if state.used.contains(&formula.id) {
                    continue;
                }
                if !formula.inputs.iter().all(|v| state.available.contains(&v.symbol)) {
                    continue;
                }
                let contributes = formula
                    .outputs
                    .iter()
                    .any(|v| !state.available.contains(&v.symbol) || outputs.contains(&v.symbol));
                if !contributes {
                    continue;
                }

                let mut available = state.available.clone();
                available.extend(formula.outputs.iter().map(|v| v.symbol.clone()));
                let mut used = state.used.clone();
                used.insert(formula.id.clone());
                let mut path = state.path.clone();
                path.push(formula.id.clone());

                seq += 1;
                heap.push(State {
                    cost: state.cost + step_cost,
                    seq,
                    available,
                    used,
                    path,
                });
            }
        }

        tracing::debug!(
            expansions,
            states = visited.len(),
            plans = found.len(),
            "derivation search finished"
        );
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::FormulaLayer;
    use crate::graph::FormulaGraph;
    use crate::planner::PlannerConfig;

    fn set(symbols: &[&str]) -> BTreeSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    fn diamond() -> FormulaGraph {
        // x -> y by two routes, then y -> z.
        let mut g = FormulaGraph::new();
        g.add_formula(
            Formula::new("cheap", "y = f(x)").with_id("cheap").with_inputs(["x"]).with_outputs(["y"]).with_layer(FormulaLayer::Axiom),
            false,
        );
        g.add_formula(
            Formula::new("dear", "y = g(x)").with_id("dear").with_inputs(["x"]).with_outputs(["y"]).with_layer(FormulaLayer::Numerical),
            false,
        );
        g.add_formula(
            Formula::new("last", "z = h(y)").with_id("last").with_inputs(["y"]).with_outputs(["z"]).with_layer(FormulaLayer::Axiom),
            false,
        );
        g
    }

    #[test]
    fn results_come_out_cheapest_first() {
        let g = diamond();
        let planner = DerivationPlanner::new(&g);
        let found = planner.search(&set(&["x"]), &set(&["z"]), &Context::new());
        assert_eq!(found[0].formula_ids, ["cheap", "last"]);
        assert!(found.windows(2).all(|w| w[0].cost <= w[1].cost));
        assert!(found.iter().any(|r| r.formula_ids == ["dear", "last"]));
    }

    #[test]
    fn formula_sets_are_not_repeated_in_other_orders() {
        // Two independent formulas both needed: only one ordering is kept.
        let mut g = FormulaGraph::new();
        g.add_formula(Formula::new("p", "p = x").with_id("p").with_inputs(["x"]).with_outputs(["p"]), false);
        g.add_formula(Formula::new("q", "q = x").with_id("q").with_inputs(["x"]).with_outputs(["q"]), false);
        let planner = DerivationPlanner::new(&g);
        let found = planner.search(&set(&["x"]), &set(&["p", "q"]), &Context::new());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].formula_ids.len(), 2);
    }

    #[test]
    fn max_steps_bounds_plan_length() {
        let g = diamond();
        let config = PlannerConfig {
            max_steps: 1,
            ..PlannerConfig::default()
        };
        let planner = DerivationPlanner::with_config(&g, config);
        assert!(planner.search(&set(&["x"]), &set(&["z"]), &Context::new()).is_empty());
    }

    #[test]
    fn expansion_limit_stops_search() {
        let g = diamond();
        let config = PlannerConfig {
            max_expansions: 0,
            ..PlannerConfig::default()
        };
        let planner = DerivationPlanner::with_config(&g, config);
        assert!(planner.search(&set(&["x"]), &set(&["z"]), &Context::new()).is_empty());
    }

    #[test]
    fn non_contributing_formula_is_skipped() {
        let mut g = FormulaGraph::new();
        g.add_formula(Formula::new("echo", "x = x").with_id("echo").with_inputs(["x"]).with_outputs(["x"]), false);
        let planner = DerivationPlanner::new(&g);
        assert!(planner.search(&set(&["x"]), &set(&["y"]), &Context::new()).is_empty());
    }
}
