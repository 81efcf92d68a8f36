//! Seed packs: bootstrapping a graph with curated formulas.
//!
//! A seed pack is a TOML bundle of formulas and the relationships between
//! them. One pack is bundled into the library: `mechanics`. Further packs are
//! discovered from `<seeds_dir>/<pack>/seed.toml`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde::Deserialize;
use thiserror::Error;

use crate::edge::{Edge, EdgeType};
use crate::formula::{Formula, FormulaLayer, FormulaStatus, RegimeOfValidity, Variable};
use crate::graph::FormulaGraph;

// ── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Error, Diagnostic)]
pub enum SeedError {
    #[error("seed pack not found: \"{id}\"")]
    #[diagnostic(
        code(fkg::seed::not_found),
        help("Check the pack id, or point `graph.seeds_dir` at the directory containing <pack>/seed.toml.")
    )]
    NotFound { id: String },

    #[error("failed to parse seed pack \"{id}\": {message}")]
    #[diagnostic(
        code(fkg::seed::parse),
        help("Check the seed.toml syntax. Layers, statuses and edge types use SCREAMING_SNAKE_CASE names.")
    )]
    Parse { id: String, message: String },

    #[error("failed to read seed file: {path}")]
    #[diagnostic(code(fkg::seed::io), help("Ensure the file exists and is readable."))]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type SeedResult<T> = std::result::Result<T, SeedError>;

// ── Seed pack data model ────────────────────────────────────────────────

/// A seed pack: TOML-defined formula bundle.
#[derive(Debug, Clone)]
pub struct SeedPack {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    /// Domain given to formulas that do not declare their own.
    pub domain: Option<String>,
    pub formulas: Vec<SeedFormula>,
    pub edges: Vec<SeedEdge>,
    pub source: SeedSource,
}

/// Where a seed pack came from.
#[derive(Debug, Clone, PartialEq)]
pub enum SeedSource {
    /// Bundled into the library via `include_str!`.
    Bundled,
    /// Loaded from an external directory.
    External(PathBuf),
}

/// A formula record in a seed pack. Omitted fields take authoring defaults
/// (effective layer, accepted, full confidence).
#[derive(Debug, Clone, Deserialize)]
pub struct SeedFormula {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub symbolic_form: String,
    #[serde(default)]
    pub inputs: Vec<Variable>,
    #[serde(default)]
    pub outputs: Vec<Variable>,
    #[serde(default)]
    pub parameters: Vec<Variable>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub regime: RegimeOfValidity,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default = "default_layer")]
    pub layer: FormulaLayer,
    #[serde(default = "default_status")]
    pub status: FormulaStatus,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub uncertainty: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub source: Option<String>,
}

/// An edge record in a seed pack.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEdge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_layer() -> FormulaLayer {
    FormulaLayer::Effective
}

fn default_status() -> FormulaStatus {
    FormulaStatus::Accepted
}

fn default_confidence() -> f64 {
    1.0
}

impl SeedFormula {
    /// Build the graph formula, attributing it to `pack_id`.
    pub fn to_formula(&self, pack_id: &str, pack_domain: Option<&str>) -> Formula {
        let mut formula = Formula::new(&self.name, &self.symbolic_form)
            .with_layer(self.layer)
            .with_status(self.status)
            .with_confidence(self.confidence)
            .with_uncertainty(self.uncertainty)
            .with_regime(self.regime.clone())
            .with_created_by(format!("seed:{pack_id}"));
        if let Some(id) = &self.id {
            formula = formula.with_id(id);
        }
        if let Some(domain) = self.domain.as_deref().or(pack_domain) {
            formula = formula.with_domain(domain);
        }
        if let Some(source) = &self.source {
            formula = formula.with_source(source);
        }
        formula.inputs = self.inputs.clone();
        formula.outputs = self.outputs.clone();
        formula.parameters = self.parameters.clone();
        formula.assumptions = self.assumptions.clone();
        formula.tags = self.tags.iter().cloned().collect();
        formula.normalized()
    }
}

/// Report after applying a seed pack.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    /// Pack id.
    pub id: String,
    /// Formulas newly inserted.
    pub formulas_applied: usize,
    /// Formulas whose id was already present.
    pub formulas_skipped: usize,
    /// Edges newly inserted.
    pub edges_applied: usize,
    /// Edges already present or with a missing endpoint.
    pub edges_skipped: usize,
}

impl SeedReport {
    /// True when nothing new was added.
    pub fn already_applied(&self) -> bool {
        self.formulas_applied == 0 && self.edges_applied == 0
    }
}

// ── TOML deserialization helpers ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SeedToml {
    seed: SeedMeta,
    #[serde(default)]
    formulas: Vec<SeedFormula>,
    #[serde(default)]
    edges: Vec<SeedEdge>,
}

#[derive(Debug, Deserialize)]
struct SeedMeta {
    id: String,
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    domain: Option<String>,
}

// ── Bundled seed packs ──────────────────────────────────────────────────

const MECHANICS_TOML: &str = include_str!("../../data/seeds/mechanics/seed.toml");

/// Parse a seed pack from TOML text.
pub fn parse_seed_toml(toml_str: &str, source: SeedSource) -> SeedResult<SeedPack> {
    let parsed: SeedToml = toml::from_str(toml_str).map_err(|e| SeedError::Parse {
        id: "(unknown)".into(),
        message: e.to_string(),
    })?;
    Ok(SeedPack {
        id: parsed.seed.id,
        name: parsed.seed.name,
        version: parsed.seed.version,
        description: parsed.seed.description,
        domain: parsed.seed.domain,
        formulas: parsed.formulas,
        edges: parsed.edges,
        source,
    })
}

fn bundled_packs() -> Vec<SeedPack> {
    [(MECHANICS_TOML, "mechanics")]
        .iter()
        .filter_map(
            |(toml, id)| match parse_seed_toml(toml, SeedSource::Bundled) {
                Ok(pack) => Some(pack),
                Err(e) => {
                    tracing::warn!(seed = id, "failed to parse bundled seed: {e}");
                    None
                }
            },
        )
        .collect()
}

// ── Seed registry ───────────────────────────────────────────────────────

/// Registry of available seed packs (bundled + discovered from disk).
#[derive(Debug, Clone)]
pub struct SeedRegistry {
    packs: HashMap<String, SeedPack>,
}

impl SeedRegistry {
    /// Create a registry with only bundled packs.
    pub fn bundled() -> Self {
        let packs = bundled_packs()
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        Self { packs }
    }

    /// Discover seed packs from a directory in addition to the bundled ones.
    ///
    /// Each subdirectory containing a `seed.toml` is loaded as a pack. A
    /// discovered pack replaces a bundled one with the same id. Unreadable or
    /// malformed packs are skipped with a warning.
    pub fn discover(seeds_dir: &Path) -> Self {
        let mut registry = Self::bundled();

        let Ok(entries) = std::fs::read_dir(seeds_dir) else {
            tracing::debug!(dir = %seeds_dir.display(), "seeds directory not readable");
            return registry;
        };
        for entry in entries.flatten() {
            let seed_file = entry.path().join("seed.toml");
            if !seed_file.is_file() {
                continue;
            }
            match load_seed_file(&seed_file, entry.path()) {
                Ok(pack) => {
                    registry.packs.insert(pack.id.clone(), pack);
                }
                Err(e) => {
                    tracing::warn!(path = %seed_file.display(), "skipping seed pack: {e}");
                }
            }
        }
        registry
    }

    /// All available packs, sorted by id.
    pub fn list(&self) -> Vec<&SeedPack> {
        let mut packs: Vec<&SeedPack> = self.packs.values().collect();
        packs.sort_by(|a, b| a.id.cmp(&b.id));
        packs
    }

    pub fn get(&self, id: &str) -> SeedResult<&SeedPack> {
        self.packs
            .get(id)
            .ok_or_else(|| SeedError::NotFound { id: id.to_string() })
    }

    /// Apply a single seed pack. Re-applying a pack adds nothing.
    pub fn apply(&self, pack_id: &str, graph: &mut FormulaGraph) -> SeedResult<SeedReport> {
        let pack = self.get(pack_id)?;
        Ok(apply_seed_pack(pack, graph))
    }

    /// Apply several packs in order. Returns a report per pack.
    pub fn apply_all(&self, pack_ids: &[String], graph: &mut FormulaGraph) -> SeedResult<Vec<SeedReport>> {
        pack_ids.iter().map(|id| self.apply(id, graph)).collect()
    }
}

fn load_seed_file(path: &Path, dir: PathBuf) -> SeedResult<SeedPack> {
    let content = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed_toml(&content, SeedSource::External(dir))
}

// ── Application logic ───────────────────────────────────────────────────

fn apply_seed_pack(pack: &SeedPack, graph: &mut FormulaGraph) -> SeedReport {
    let mut report = SeedReport {
        id: pack.id.clone(),
        formulas_applied: 0,
        formulas_skipped: 0,
        edges_applied: 0,
        edges_skipped: 0,
    };

    for record in &pack.formulas {
        let formula = record.to_formula(&pack.id, pack.domain.as_deref());
        if graph.add_formula(formula, false) {
            report.formulas_applied += 1;
        } else {
            report.formulas_skipped += 1;
        }
    }

    for record in &pack.edges {
        let exists = graph
            .get_edges_from(&record.source, Some(record.edge_type))
            .iter()
            .any(|e| e.target_id == record.target);
        let added = !exists
            && graph.add_edge(
                Edge::new(&record.source, &record.target, record.edge_type)
                    .with_confidence(record.confidence)
                    .with_created_by(format!("seed:{}", pack.id)),
            );
        if added {
            report.edges_applied += 1;
        } else {
            tracing::warn!(
                seed = %pack.id,
                source = %record.source,
                target = %record.target,
                edge_type = %record.edge_type,
                duplicate = exists,
                "skipped seed edge"
            );
            report.edges_skipped += 1;
        }
    }

    tracing::info!(
        seed = %pack.id,
        formulas_applied = report.formulas_applied,
        formulas_skipped = report.formulas_skipped,
        edges_applied = report.edges_applied,
        edges_skipped = report.edges_skipped,
        "applied seed pack"
    );
    report
}
