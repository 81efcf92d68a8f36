//! Engine facade: top-level API for the formula knowledge graph.
//!
//! The `Engine` owns the graph and its configuration, handles startup (load
//! the store or apply seed packs) and hands out planners bound to the graph.

use std::collections::HashSet;

use crate::config::Config;
use crate::edge::EdgeType;
use crate::error::KgResult;
use crate::formula::Context;
use crate::graph::{ConsistencyIssue, FormulaGraph, GraphStats};
use crate::planner::{Bindings, DerivationPlan, DerivationPlanner};
use crate::seeds::{SeedRegistry, SeedReport};

/// The formula knowledge graph engine.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    graph: FormulaGraph,
}

impl Engine {
    /// Create an engine.
    ///
    /// If `graph.store_path` names an existing file the graph is loaded from
    /// it; otherwise the graph starts empty and the configured seed packs are
    /// applied.
    pub fn new(config: Config) -> KgResult<Self> {
        let stored = config
            .graph
            .store_path
            .as_deref()
            .filter(|p| p.is_file());

        let graph = match stored {
            Some(path) => FormulaGraph::load(path)?,
            None => {
                let mut graph = FormulaGraph::new();
                if !config.seeds.is_empty() {
                    seed_registry(&config).apply_all(&config.seeds, &mut graph)?;
                }
                graph
            }
        };

        tracing::info!(
            formulas = graph.len(),
            edges = graph.edges().len(),
            persistent = config.graph.store_path.is_some(),
            "initialized formula engine"
        );
        Ok(Self { config, graph })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn graph(&self) -> &FormulaGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut FormulaGraph {
        &mut self.graph
    }

    /// A planner over the current graph using the configured weights.
    pub fn planner(&self) -> DerivationPlanner<'_> {
        DerivationPlanner::with_config(&self.graph, self.config.planner.clone())
    }

    /// Plan with the configured planner. See [`DerivationPlanner::plan`].
    pub fn plan<S: AsRef<str>>(
        &self,
        inputs: &Bindings,
        outputs: &[S],
        context: &Context,
    ) -> Vec<DerivationPlan> {
        self.planner().plan(inputs, outputs, context)
    }

    /// Paths between two formulas using the configured depth limit.
    pub fn find_paths(
        &self,
        start: &str,
        end: &str,
        allowed_types: Option<&HashSet<EdgeType>>,
    ) -> Vec<Vec<String>> {
        self.graph
            .find_paths(start, end, self.config.graph.max_path_depth, allowed_types)
    }

    pub fn check_consistency(&self) -> Vec<ConsistencyIssue> {
        self.graph.check_consistency()
    }

    pub fn stats(&self) -> GraphStats {
        self.graph.stats()
    }

    /// Seed packs visible to this engine (bundled plus `graph.seeds_dir`).
    pub fn seed_registry(&self) -> SeedRegistry {
        seed_registry(&self.config)
    }

    /// Apply seed packs by id.
    pub fn apply_seeds(&mut self, pack_ids: &[String]) -> KgResult<Vec<SeedReport>> {
        let registry = seed_registry(&self.config);
        Ok(registry.apply_all(pack_ids, &mut self.graph)?)
    }

    /// Write the graph to the configured store. Returns `false` in
    /// memory-only mode.
    pub fn persist(&self) -> KgResult<bool> {
        match &self.config.graph.store_path {
            Some(path) => {
                self.graph.save(path)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn seed_registry(config: &Config) -> SeedRegistry {
    match &config.graph.seeds_dir {
        Some(dir) => SeedRegistry::discover(dir),
        None => SeedRegistry::bundled(),
    }
}
