//! Independent re-check of a derivation plan against the current graph.
//!
//! Nothing recorded in the plan is trusted: formulas are looked up again, and
//! the graph's own inputs and outputs are replayed in step order. Plans built
//! by hand or edited after planning are checked the same way.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{DerivationPlan, DerivationPlanner, VariableSource};

/// Condition pairs that cannot both hold within one derivation.
const CONTRADICTORY_CONDITIONS: &[(&str, &str)] = &[
    ("relativistic", "non-relativistic"),
    ("quantum", "classical"),
    ("strong field", "weak field"),
];

/// Outcome of [`DerivationPlanner::validate_plan`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanValidation {
    pub valid: bool,
    pub issues: Vec<String>,
}

impl DerivationPlanner<'_> {
    /// Check that `plan` is executable against this planner's graph.
    pub fn validate_plan(&self, plan: &DerivationPlan) -> PlanValidation {
        let mut issues = Vec::new();
        let mut available: HashSet<&str> = plan.inputs.iter().map(String::as_str).collect();
        let mut step_conditions: Vec<Vec<String>> = Vec::with_capacity(plan.steps.len());

        for (position, step) in plan.steps.iter().enumerate() {
            let Some(formula) = self.graph().get_formula(&step.formula_id) else {
                issues.push(format!(
                    "step {position}: formula {} not found in graph",
                    step.formula_id
                ));
                // Keep replaying with what the plan claims so later steps are
                // still checked.
                available.extend(step.outputs.iter().map(String::as_str));
                let mut recorded = step.assumptions.clone();
                recorded.extend(step.conditions.iter().cloned());
                step_conditions.push(recorded);
                continue;
            };

            for input in &formula.inputs {
                if !available.contains(input.symbol.as_str()) {
                    issues.push(format!(
                        "step {position}: input {} of {} is not available",
                        input.symbol, formula.id
                    ));
                }
            }

            for (symbol, source) in &step.input_sources {
                match *source {
                    VariableSource::Input if !plan.inputs.contains(symbol) => {
                        issues.push(format!(
                            "step {position}: {symbol} is recorded as an input but was not supplied"
                        ));
                    }
                    VariableSource::Step(j) => {
                        let produced = j < position
                            && plan.steps[j].outputs.iter().any(|o| o == symbol);
                        if !produced {
                            issues.push(format!(
                                "step {position}: {symbol} is recorded from step {j}, which does not precede it or produce it"
                            ));
                        }
                    }
                    VariableSource::Input => {}
                }
            }

            available.extend(formula.outputs.iter().map(|v| v.symbol.as_str()));
            step_conditions.push(formula.conditions());
        }

        for output in &plan.outputs {
            if !available.contains(output.as_str()) {
                issues.push(format!("output {output} is never produced"));
            }
        }

        issues.extend(condition_conflicts(&step_conditions));

        let valid = issues.is_empty();
        tracing::debug!(steps = plan.steps.len(), valid, issues = issues.len(), "validated plan");
        PlanValidation { valid, issues }
    }
}

fn condition_conflicts(step_conditions: &[Vec<String>]) -> Vec<String> {
    let tokenized: Vec<Vec<Vec<String>>> = step_conditions
        .iter()
        .map(|conds| conds.iter().map(|c| tokenize(c)).collect())
        .collect();

    let mut issues = Vec::new();
    for &(left, right) in CONTRADICTORY_CONDITIONS {
        let left_tokens = tokenize(left);
        let right_tokens = tokenize(right);
        let carriers = |term: &[String]| -> Vec<usize> {
            tokenized
                .iter()
                .enumerate()
                .filter(|(_, conds)| conds.iter().any(|c| contains_phrase(c, term)))
                .map(|(i, _)| i)
                .collect()
        };
        let with_left = carriers(&left_tokens);
        let with_right = carriers(&right_tokens);
        let conflict = with_left
            .iter()
            .flat_map(|&i| with_right.iter().map(move |&j| (i, j)))
            .find(|(i, j)| i != j);
        if let Some((i, j)) = conflict {
            issues.push(format!(
                "contradictory conditions: step {i} assumes {left}, step {j} assumes {right}"
            ));
        }
    }
    issues
}

/// Lowercase word tokens split on any non-alphanumeric character. A bare
/// `non` is glued onto the following word, so `non_relativistic`,
/// `non relativistic` and `non-relativistic` all become `non-relativistic`
/// and never match `relativistic`.
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut negated = false;
    for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        if word == "non" && !negated {
            negated = true;
        } else if negated {
            tokens.push(format!("non-{word}"));
            negated = false;
        } else {
            tokens.push(word.to_string());
        }
    }
    if negated {
        tokens.push("non".to_string());
    }
    tokens
}

fn contains_phrase(haystack: &[String], phrase: &[String]) -> bool {
    !phrase.is_empty() && haystack.windows(phrase.len()).any(|w| w == phrase)
}
