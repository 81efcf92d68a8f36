// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # formula-kg
//!
//! A knowledge graph of scientific formulas and a cost-guided planner that
//! finds ordered derivations from known quantities to required ones.
//!
//! ## Architecture
//!
//! - **Formulas** (`formula`): variables, regimes of validity, layers and statuses
//! - **Edges** (`edge`): typed relationships grouped into families
//! - **Knowledge graph** (`graph`): indexed store with queries, paths, cycle
//!   detection, consistency audit and JSON persistence
//! - **Planner** (`planner`): priority-first search over symbol sets, plan
//!   validation and gap suggestions
//! - **Seeds** (`seeds`): TOML formula packs for bootstrapping
//!
//! ## Library usage
//!
//! ```no_run
//! use formula_kg::formula::{Context, Formula, FormulaLayer};
//! use formula_kg::graph::FormulaGraph;
//! use formula_kg::planner::{Bindings, DerivationPlanner};
//!
//! let mut graph = FormulaGraph::new();
//! graph.add_formula(
//!     Formula::new("Newton's second law", "F = m * a")
//!         .with_inputs(["m", "a"])
//!         .with_outputs(["F"])
//!         .with_layer(FormulaLayer::Fundamental),
//!     false,
//! );
//!
//! let inputs: Bindings = [("m".to_string(), 2.0), ("a".to_string(), 3.0)].into();
//! let planner = DerivationPlanner::new(&graph);
//! let plans = planner.plan(&inputs, &["F"], &Context::new());
//! assert!(planner.validate_plan(&plans[0]).valid);
//! ```

pub mod config;
pub mod edge;
pub mod engine;
pub mod error;
pub mod formula;
pub mod graph;
pub mod planner;
pub mod seeds;
