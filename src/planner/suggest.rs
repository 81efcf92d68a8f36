//! Diagnosis for outputs the planner cannot reach.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::formula::{Context, Formula};

use super::{Bindings, DerivationPlanner};

/// Why an output is unreachable and what would bridge the gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Suggestion {
    /// A producer exists but some of its inputs cannot be derived.
    MissingBridge {
        output: String,
        formula_id: String,
        formula_name: String,
        missing_inputs: Vec<String>,
    },
    /// A producer's inputs are reachable but its regime rejects the context.
    InapplicableProducer {
        output: String,
        formula_id: String,
        reasons: Vec<String>,
    },
    /// Nothing in the graph produces these outputs.
    NewFormulaNeeded {
        reachable: Vec<String>,
        outputs_needed: Vec<String>,
    },
}

impl DerivationPlanner<'_> {
    /// Explain which requested outputs cannot be derived from `inputs`.
    ///
    /// Returns an empty list when every output is reachable.
    pub fn suggest_missing_formulas<S: AsRef<str>>(
        &self,
        inputs: &Bindings,
        outputs: &[S],
        context: &Context,
    ) -> Vec<Suggestion> {
        let applicable: Vec<&Formula> = self
            .graph()
            .formulas_sorted()
            .into_iter()
            .filter(|f| f.is_applicable(context).0)
            .collect();
        let reachable = reachable_closure(inputs.keys().cloned().collect(), &applicable);

        let mut suggestions = Vec::new();
        let mut no_producer = Vec::new();

        for output in outputs {
            let output = output.as_ref();
            if reachable.contains(output) {
                continue;
            }
            let producers = self.graph().producers_of(output);
            if producers.is_empty() {
                no_producer.push(output.to_string());
                continue;
            }

            for producer in producers {
                let missing_inputs: Vec<String> = producer
                    .input_symbols()
                    .into_iter()
                    .filter(|s| !reachable.contains(*s))
                    .map(str::to_string)
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();

                if missing_inputs.is_empty() {
                    let (_, reasons) = producer.is_applicable(context);
                    suggestions.push(Suggestion::InapplicableProducer {
                        output: output.to_string(),
                        formula_id: producer.id.clone(),
                        reasons,
                    });
                } else {
                    suggestions.push(Suggestion::MissingBridge {
                        output: output.to_string(),
                        formula_id: producer.id.clone(),
                        formula_name: producer.name.clone(),
                        missing_inputs,
                    });
                }
            }
        }

        if !no_producer.is_empty() {
            suggestions.push(Suggestion::NewFormulaNeeded {
                reachable: reachable.into_iter().collect(),
                outputs_needed: no_producer,
            });
        }

        tracing::debug!(suggestions = suggestions.len(), "suggested missing formulas");
        suggestions
    }
}

/// Grow `known` with the outputs of every formula whose inputs are all known,
/// until nothing new appears.
fn reachable_closure(mut known: BTreeSet<String>, formulas: &[&Formula]) -> BTreeSet<String> {
    loop {
        let before = known.len();
        for formula in formulas {
            if formula.inputs.iter().all(|v| known.contains(&v.symbol)) {
                known.extend(formula.outputs.iter().map(|v| v.symbol.clone()));
            }
        }
        if known.len() == before {
            return known;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{RegimeOfValidity, ValueRange};
    use crate::graph::FormulaGraph;

    fn bindings(symbols: &[&str]) -> Bindings {
        symbols.iter().map(|s| (s.to_string(), 1.0)).collect()
    }

    #[test]
    fn empty_graph_needs_new_formula() {
        let g = FormulaGraph::new();
        let suggestions = DerivationPlanner::new(&g).suggest_missing_formulas(&Bindings::new(), &["x"], &Context::new());
        assert_eq!(
            suggestions,
            [Suggestion::NewFormulaNeeded {
                reachable: vec![],
                outputs_needed: vec!["x".into()],
            }]
        );
    }

    #[test]
    fn producer_with_unreachable_input_is_a_missing_bridge() {
        let mut g = FormulaGraph::new();
        g.add_formula(Formula::new("newton", "F = m * a").with_id("newton").with_inputs(["m", "a"]).with_outputs(["F"]), false);
        let suggestions = DerivationPlanner::new(&g).suggest_missing_formulas(&bindings(&["m"]), &["F"], &Context::new());
        assert_eq!(
            suggestions,
            [Suggestion::MissingBridge {
                output: "F".into(),
                formula_id: "newton".into(),
                formula_name: "newton".into(),
                missing_inputs: vec!["a".into()],
            }]
        );
    }

    #[test]
    fn closure_follows_chains() {
        let mut g = FormulaGraph::new();
        g.add_formula(Formula::new("accel", "a = dv/dt").with_id("accel").with_inputs(["dv", "dt"]).with_outputs(["a"]), false);
        g.add_formula(Formula::new("newton", "F = m a").with_id("newton").with_inputs(["m", "a"]).with_outputs(["F"]), false);
        let planner = DerivationPlanner::new(&g);
        assert!(planner.suggest_missing_formulas(&bindings(&["m", "dv", "dt"]), &["F"], &Context::new()).is_empty());
    }

    #[test]
    fn regime_rejection_is_explained() {
        let mut g = FormulaGraph::new();
        g.add_formula(
            Formula::new("newton", "F = m a")
                .with_id("newton")
                .with_inputs(["m", "a"])
                .with_outputs(["F"])
                .with_regime(RegimeOfValidity::new().with_bound("v", ValueRange::at_most(0.1))),
            false,
        );
        let ctx = Context::new().with_value("v", 0.5);
        let suggestions = DerivationPlanner::new(&g).suggest_missing_formulas(&bindings(&["m", "a"]), &["F"], &ctx);
        match &suggestions[..] {
            [Suggestion::InapplicableProducer { formula_id, reasons, .. }] => {
                assert_eq!(formula_id, "newton");
                assert_eq!(reasons.len(), 1);
            }
            other => panic!("unexpected suggestions: {other:?}"),
        }
    }

    #[test]
    fn serialized_with_kind_tag() {
        let s = Suggestion::NewFormulaNeeded {
            reachable: vec!["m".into()],
            outputs_needed: vec!["x".into()],
        };
        let value = serde_json::to_value(&s).unwrap();
        assert_eq!(value["kind"], "new_formula_needed");
        assert_eq!(value["outputs_needed"][0], "x");
    }
}
