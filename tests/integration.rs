//! End-to-end tests for the formula knowledge graph.
//!
//! These exercise the graph, planner, validation and suggestion APIs together
//! through the public crate surface.

use std::collections::HashSet;

use formula_kg::config::Config;
use formula_kg::edge::{Edge, EdgeType};
use formula_kg::engine::Engine;
use formula_kg::formula::{Context, Formula, FormulaLayer, FormulaStatus, RegimeOfValidity, ValueRange};
use formula_kg::graph::{FormulaGraph, FormulaQuery, IssueKind};
use formula_kg::planner::{Bindings, DerivationPlanner, PlanValidation, Suggestion, VariableSource};

fn bindings(pairs: &[(&str, f64)]) -> Bindings {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn newton() -> Formula {
    Formula::new("Newton's second law", "F = m * a")
        .with_inputs(["m", "a"])
        .with_outputs(["F"])
        .with_domain("mechanics")
        .with_layer(FormulaLayer::Fundamental)
}

#[test]
fn add_then_get_returns_equal_formula() {
    let mut graph = FormulaGraph::new();
    let f = newton();
    assert!(graph.add_formula(f.clone(), false));
    assert_eq!(graph.get_formula(&f.id), Some(&f));

    let changed = f.clone().with_confidence(0.2);
    assert!(!graph.add_formula(changed, false));
    assert_eq!(graph.get_formula(&f.id), Some(&f));
}

#[test]
fn edges_never_dangle() {
    let mut graph = FormulaGraph::new();
    let f = newton();
    let w = Formula::new("Weight", "W = m * g");
    graph.add_formula(f.clone(), false);
    graph.add_formula(w.clone(), false);

    assert!(!graph.add_edge(Edge::new(&w.id, "missing", EdgeType::SpecialCaseOf)));
    assert!(graph.add_edge(Edge::new(&w.id, &f.id, EdgeType::SpecialCaseOf)));
    assert_eq!(graph.get_edges_to(&f.id, None).len(), 1);

    graph.remove_formula(&f.id);
    assert!(graph.edges().is_empty());
    assert!(graph.get_edges_from(&w.id, None).is_empty());
}

#[test]
fn single_formula_plan_validates() {
    let mut graph = FormulaGraph::new();
    let f = newton();
    graph.add_formula(f.clone(), false);

    let planner = DerivationPlanner::new(&graph);
    let plans = planner.plan(&bindings(&[("m", 2.0), ("a", 3.0)]), &["F"], &Context::new());
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].steps.len(), 1);
    assert_eq!(plans[0].steps[0].formula_id, f.id);
    assert_eq!(plans[0].steps[0].symbolic_form, "F = m * a");
    assert_eq!(
        planner.validate_plan(&plans[0]),
        PlanValidation { valid: true, issues: vec![] }
    );
}

#[test]
fn fundamental_plan_outranks_approximation() {
    let mut graph = FormulaGraph::new();
    let fundamental = newton().with_confidence(1.0);
    let approx = Formula::new("Linearized drag force", "F = m * a * (1 - eps)")
        .with_inputs(["m", "a"])
        .with_outputs(["F"])
        .with_layer(FormulaLayer::Approximation)
        .with_confidence(0.6);
    graph.add_formula(fundamental.clone(), false);
    graph.add_formula(approx.clone(), false);

    let planner = DerivationPlanner::new(&graph).with_prefer_fundamental(true);
    let plans = planner.plan(&bindings(&[("m", 2.0), ("a", 3.0)]), &["F"], &Context::new());
    let rank = |id: &str| plans.iter().position(|p| p.formula_ids() == [id]).unwrap();
    assert!(rank(&fundamental.id) < rank(&approx.id));
}

#[test]
fn empty_graph_suggests_new_formula() {
    let graph = FormulaGraph::new();
    let planner = DerivationPlanner::new(&graph);
    assert!(planner.plan(&Bindings::new(), &["x"], &Context::new()).is_empty());

    let suggestions = planner.suggest_missing_formulas(&Bindings::new(), &["x"], &Context::new());
    assert!(suggestions.iter().any(|s| matches!(
        s,
        Suggestion::NewFormulaNeeded { outputs_needed, .. } if outputs_needed == &["x"]
    )));
}

#[test]
fn regime_bound_excludes_formula() {
    let mut graph = FormulaGraph::new();
    graph.add_formula(
        newton().with_regime(RegimeOfValidity::new().with_bound("v", ValueRange::new(None, Some(0.1)))),
        false,
    );
    let planner = DerivationPlanner::new(&graph);
    let plans = planner.plan(
        &bindings(&[("m", 2.0), ("a", 3.0)]),
        &["F"],
        &Context::new().with_value("v", 0.5),
    );
    assert!(plans.is_empty());
}

#[test]
fn three_cycle_found_only_in_scope() {
    let mut graph = FormulaGraph::new();
    for id in ["a", "b", "c"] {
        graph.add_formula(Formula::new(id, id).with_id(id), false);
    }
    graph.add_edge(Edge::new("a", "b", EdgeType::DerivesFrom));
    graph.add_edge(Edge::new("b", "c", EdgeType::DerivesFrom));
    graph.add_edge(Edge::new("c", "a", EdgeType::DerivesFrom));

    let cycles = graph.find_cycles(&HashSet::from([EdgeType::DerivesFrom]));
    assert_eq!(cycles.len(), 1);
    let members: HashSet<&str> = cycles[0].iter().map(String::as_str).collect();
    assert_eq!(members, HashSet::from(["a", "b", "c"]));

    assert!(graph.find_cycles(&HashSet::from([EdgeType::Contradicts])).is_empty());
}

#[test]
fn planning_over_seeded_mechanics() {
    let engine = Engine::new(Config::default()).unwrap();

    // Free fall: g, h -> v, then m, v -> momentum.
    let inputs = bindings(&[("g", 9.81), ("h", 2.0), ("m", 1.5)]);
    let plans = engine.plan(&inputs, &["p"], &Context::new().with_domain("mechanics"));
    let best = &plans[0];
    assert_eq!(best.formula_ids(), ["free_fall_speed", "momentum"]);
    assert_eq!(best.steps[1].input_sources["v"], VariableSource::Step(0));
    assert_eq!(best.steps[1].input_sources["m"], VariableSource::Input);
    assert!(best.assumptions.contains(&"no air resistance".to_string()));
    assert!(engine.planner().validate_plan(best).valid);
}

#[test]
fn relativistic_and_classical_steps_conflict() {
    let engine = Engine::new(Config::default()).unwrap();
    let planner = engine.planner();

    // Both routes to KE are valid alone; splicing the relativistic step into
    // the classical plan must be rejected.
    let inputs = bindings(&[("m", 1.0), ("v", 3.0)]);
    let plans = planner.plan(&inputs, &["KE"], &Context::new());
    let single = |id: &str| plans.iter().find(|p| p.formula_ids() == [id]).unwrap().clone();
    let mut plan = single("kinetic_energy");
    let relativistic = single("relativistic_kinetic_energy");
    assert!(planner.validate_plan(&plan).valid);
    assert!(planner.validate_plan(&relativistic).valid);

    let mut extra = relativistic.steps[0].clone();
    extra.index = 1;
    plan.steps.push(extra);

    let result = planner.validate_plan(&plan);
    assert!(!result.valid);
    assert!(result.issues.iter().any(|i| i.contains("contradictory conditions")));
}

#[test]
fn context_flag_false_rejects_condition() {
    let engine = Engine::new(Config::default()).unwrap();
    let inputs = bindings(&[("L", 1.0), ("g", 9.81)]);

    assert_eq!(engine.plan(&inputs, &["T"], &Context::new()).len(), 1);
    let ctx = Context::new().with_flag("small angle", false);
    assert!(engine.plan(&inputs, &["T"], &ctx).is_empty());
    let ctx = Context::new().with_value("theta", 0.5);
    assert!(engine.plan(&inputs, &["T"], &ctx).is_empty());

    let suggestions = engine.planner().suggest_missing_formulas(&inputs, &["T"], &ctx);
    assert!(matches!(
        &suggestions[..],
        [Suggestion::InapplicableProducer { formula_id, .. }] if formula_id == "small_angle_pendulum"
    ));
}

#[test]
fn query_and_audit_seeded_graph() {
    let mut engine = Engine::new(Config::default()).unwrap();

    let energy = engine.graph().query(&FormulaQuery::new().with_tag("energy"));
    assert_eq!(energy.len(), 4);

    let fundamental = engine
        .graph()
        .query(&FormulaQuery::new().with_layer(FormulaLayer::Fundamental).with_domain("mechanics"));
    let ids: Vec<&str> = fundamental.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, ["momentum", "newton_second_law"]);

    assert!(engine.check_consistency().is_empty());

    let graph = engine.graph_mut();
    graph.add_formula(
        Formula::new("Aristotelian motion", "v = F / R")
            .with_id("aristotle")
            .with_status(FormulaStatus::Accepted),
        false,
    );
    graph.add_edge(Edge::new("aristotle", "newton_second_law", EdgeType::Contradicts));
    let issues = engine.check_consistency();
    assert!(issues.iter().any(|i| i.kind == IssueKind::Contradiction));
}

#[test]
fn derivation_chain_and_paths_on_seeds() {
    let engine = Engine::new(Config::default()).unwrap();
    let known: HashSet<String> = ["m", "dv", "dt"].iter().map(|s| s.to_string()).collect();
    let chain = engine.graph().find_derivation_chain("F", &known, 4).unwrap();
    assert_eq!(chain, ["acceleration_definition", "newton_second_law"]);

    let paths = engine.find_paths("small_angle_pendulum", "acceleration_definition", None);
    assert_eq!(
        paths,
        vec![vec![
            "small_angle_pendulum".to_string(),
            "newton_second_law".to_string(),
            "acceleration_definition".to_string(),
        ]]
    );
}
