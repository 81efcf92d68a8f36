//! Derivation planning: ordered, cost-ranked formula sequences that turn known
//! inputs into required outputs.
//!
//! The [`DerivationPlanner`] borrows a [`FormulaGraph`] and runs a
//! priority-first search over states of *(available symbols, used formulas)*
//! (see [`search`]). Each accepted sequence is replayed into a
//! [`DerivationPlan`] recording where every step's inputs come from.
//! [`validate`] re-checks any plan against the graph without trusting its
//! origin, and [`suggest`] explains unreachable outputs.
//!
//! The planner never evaluates formulas numerically; an unreachable goal
//! yields zero plans, not an error.

pub mod search;
pub mod suggest;
pub mod validate;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::formula::{CONSERVATION_TAG, Context, Formula, FormulaStatus};
use crate::graph::FormulaGraph;

pub use search::RawPlan;
pub use suggest::Suggestion;
pub use validate::PlanValidation;

/// Known input values keyed by symbol. Only the keys matter for planning.
pub type Bindings = BTreeMap<String, f64>;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Search limits and cost weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Stop after this many goal states; also the output cap.
    pub max_plans: usize,
    /// Maximum formulas in one plan.
    pub max_steps: usize,
    /// Add the layer penalty (axioms cheapest, numerical schemes dearest).
    pub prefer_fundamental: bool,
    /// Multiplier on `1 - confidence`.
    pub uncertainty_weight: f64,
    pub contested_penalty: f64,
    pub deprecated_penalty: f64,
    /// Added when the context's domain is foreign to the formula.
    pub regime_penalty: f64,
    /// Subtracted when the context's domain matches the formula.
    pub domain_match_bonus: f64,
    /// Subtracted for formulas tagged `conservation`.
    pub conservation_bonus: f64,
    /// Floor for a single step's cost.
    pub min_step_cost: f64,
    /// Upper bound on expanded states per search.
    pub max_expansions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_plans: 5,
            max_steps: 10,
            prefer_fundamental: true,
            uncertainty_weight: 2.0,
            contested_penalty: 3.0,
            deprecated_penalty: 10.0,
            regime_penalty: 1.0,
            domain_match_bonus: 0.2,
            conservation_bonus: 0.5,
            min_step_cost: 0.1,
            max_expansions: 100_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Plan types
// ---------------------------------------------------------------------------

/// Where a step obtains one of its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSource {
    /// Supplied by the caller.
    Input,
    /// Produced by the step with this index.
    Step(usize),
}

impl std::fmt::Display for VariableSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableSource::Input => write!(f, "input"),
            VariableSource::Step(i) => write!(f, "step_{i}"),
        }
    }
}

/// One formula application in a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Position in the plan (0-based).
    pub index: usize,
    /// Id of the applied formula in the graph.
    pub formula_id: String,
    pub formula_name: String,
    /// Symbolic form copied from the formula at planning time.
    pub symbolic_form: String,
    /// Input symbol → where its value comes from.
    pub input_sources: BTreeMap<String, VariableSource>,
    /// Output symbols this step produces.
    pub outputs: Vec<String>,
    /// Planning cost of this formula under the request context.
    pub cost: f64,
    /// Assumptions declared by the formula.
    pub assumptions: Vec<String>,
    /// Regime conditions of the formula.
    pub conditions: Vec<String>,
}

/// An ordered sequence of formula applications deriving `outputs` from `inputs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationPlan {
    pub steps: Vec<PlanStep>,
    /// Symbols supplied by the caller.
    pub inputs: BTreeSet<String>,
    /// Symbols the caller asked for.
    pub outputs: Vec<String>,
    pub total_cost: f64,
    /// Weakest-link confidence: the minimum over all formulas used.
    pub confidence: f64,
    /// Every assumption made along the way, first occurrence order.
    pub assumptions: Vec<String>,
}

impl DerivationPlan {
    pub fn formula_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.formula_id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

/// Cost-guided planner over a borrowed graph.
#[derive(Debug, Clone)]
pub struct DerivationPlanner<'g> {
    graph: &'g FormulaGraph,
    config: PlannerConfig,
}

impl<'g> DerivationPlanner<'g> {
    /// Create a planner with default configuration.
    pub fn new(graph: &'g FormulaGraph) -> Self {
        Self::with_config(graph, PlannerConfig::default())
    }

    pub fn with_config(graph: &'g FormulaGraph, config: PlannerConfig) -> Self {
        Self { graph, config }
    }

    pub fn with_max_plans(mut self, max_plans: usize) -> Self {
        self.config.max_plans = max_plans;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.config.max_steps = max_steps;
        self
    }

    pub fn with_prefer_fundamental(mut self, prefer: bool) -> Self {
        self.config.prefer_fundamental = prefer;
        self
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn graph(&self) -> &'g FormulaGraph {
        self.graph
    }

    /// Cost of applying `formula` once in `context`.
    pub fn formula_cost(&self, formula: &Formula, context: &Context) -> f64 {
        let cfg = &self.config;
        let mut cost = 1.0 + (1.0 - formula.confidence) * cfg.uncertainty_weight;

        if cfg.prefer_fundamental {
            cost += formula.layer.planning_penalty();
        }
        match formula.status {
            FormulaStatus::Contested => cost += cfg.contested_penalty,
            FormulaStatus::Deprecated => cost += cfg.deprecated_penalty,
            _ => {}
        }
        if let Some(domain) = context.domain() {
            if formula.matches_domain(domain) {
                cost -= cfg.domain_match_bonus;
            } else {
                cost += cfg.regime_penalty;
            }
        }
        if formula.has_tag(CONSERVATION_TAG) {
            cost -= cfg.conservation_bonus;
        }
        cost.max(cfg.min_step_cost)
    }

    /// Find up to `max_plans` plans deriving `outputs` from `inputs`.
    ///
    /// Plans are ordered by confidence (desc), then total cost (asc). An empty
    /// result means no derivation exists within the configured limits; see
    /// [`suggest_missing_formulas`](Self::suggest_missing_formulas).
    pub fn plan<S: AsRef<str>>(
        &self,
        inputs: &Bindings,
        outputs: &[S],
        context: &Context,
    ) -> Vec<DerivationPlan> {
        let input_set: BTreeSet<String> = inputs.keys().cloned().collect();
        let requested: Vec<String> = outputs.iter().map(|s| s.as_ref().to_string()).collect();
        let goal: BTreeSet<String> = requested.iter().cloned().collect();

        let raw = self.search(&input_set, &goal, context);
        let mut plans: Vec<DerivationPlan> = raw
            .iter()
            .filter_map(|r| self.build_plan(r, &input_set, &requested, context))
            .collect();

        plans.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.total_cost.total_cmp(&b.total_cost))
        });
        plans.truncate(self.config.max_plans);

        tracing::debug!(
            inputs = input_set.len(),
            outputs = ?requested,
            plans = plans.len(),
            "planning complete"
        );
        plans
    }

    /// Replay a raw id sequence into a full plan. `None` if a formula has
    /// disappeared from the graph.
    fn build_plan(
        &self,
        raw: &RawPlan,
        inputs: &BTreeSet<String>,
        outputs: &[String],
        context: &Context,
    ) -> Option<DerivationPlan> {
        let mut sources: HashMap<&str, VariableSource> =
            inputs.iter().map(|s| (s.as_str(), VariableSource::Input)).collect();
        let mut steps = Vec::with_capacity(raw.formula_ids.len());
        let mut confidence: f64 = 1.0;
        let mut assumptions: Vec<String> = Vec::new();

        for (index, id) in raw.formula_ids.iter().enumerate() {
            let formula = self.graph.get_formula(id)?;
            let input_sources = formula
                .inputs
                .iter()
                .filter_map(|v| {
                    sources
                        .get(v.symbol.as_str())
                        .map(|src| (v.symbol.clone(), *src))
                })
                .collect();
            for v in &formula.outputs {
                sources.insert(v.symbol.as_str(), VariableSource::Step(index));
            }
            for a in &formula.assumptions {
                if !assumptions.contains(a) {
                    assumptions.push(a.clone());
                }
            }
            confidence = confidence.min(formula.confidence);
            steps.push(PlanStep {
                index,
                formula_id: formula.id.clone(),
                formula_name: formula.name.clone(),
                symbolic_form: formula.symbolic_form.clone(),
                input_sources,
                outputs: formula.outputs.iter().map(|v| v.symbol.clone()).collect(),
                cost: self.formula_cost(formula, context),
                assumptions: formula.assumptions.clone(),
                conditions: formula.regime.conditions.clone(),
            });
        }

        Some(DerivationPlan {
            total_cost: steps.iter().map(|s| s.cost).sum(),
            steps,
            inputs: inputs.clone(),
            outputs: outputs.to_vec(),
            confidence,
            assumptions,
        })
    }
}
