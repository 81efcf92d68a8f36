//! Formula data model: the node type of the knowledge graph.
//!
//! A [`Formula`] is a stored fact or equation with typed inputs and outputs,
//! a [`RegimeOfValidity`] describing where it holds, a position in the
//! theory hierarchy ([`FormulaLayer`]), a lifecycle [`FormulaStatus`], and a
//! confidence score. Formulas are built by callers and handed to the graph as
//! whole values; the graph never edits individual fields on a caller's behalf.

pub mod context;
pub mod regime;
pub mod variable;

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub use context::{Context, ContextValue};
pub use regime::{RegimeOfValidity, ValueRange};
pub use variable::{Evidence, Variable};

/// Tag that marks a conservation law; such formulas get a planning bonus.
pub const CONSERVATION_TAG: &str = "conservation";

// ---------------------------------------------------------------------------
// Layer and status
// ---------------------------------------------------------------------------

/// Position of a formula in the theory hierarchy, most fundamental first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormulaLayer {
    /// First principles, taken as given.
    Axiom,
    /// Core laws of a theory, e.g. Newton's second law.
    Fundamental,
    /// Valid within a stated regime of a deeper theory.
    Effective,
    /// Fitted to observation rather than derived.
    Phenomenological,
    /// Truncated or linearized form of another formula.
    Approximation,
    /// Numerical scheme or tabulated fit.
    Numerical,
}

impl FormulaLayer {
    pub const ALL: [FormulaLayer; 6] = [
        FormulaLayer::Axiom,
        FormulaLayer::Fundamental,
        FormulaLayer::Effective,
        FormulaLayer::Phenomenological,
        FormulaLayer::Approximation,
        FormulaLayer::Numerical,
    ];

    /// Extra step cost applied when the planner prefers fundamental formulas.
    pub fn planning_penalty(self) -> f64 {
        match self {
            FormulaLayer::Axiom => 0.0,
            FormulaLayer::Fundamental => 0.5,
            FormulaLayer::Effective => 1.0,
            FormulaLayer::Phenomenological => 1.5,
            FormulaLayer::Approximation => 2.0,
            FormulaLayer::Numerical => 2.5,
        }
    }

    /// Axioms and fundamental laws may legitimately stand alone in the graph.
    pub fn is_foundational(self) -> bool {
        matches!(self, FormulaLayer::Axiom | FormulaLayer::Fundamental)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FormulaLayer::Axiom => "AXIOM",
            FormulaLayer::Fundamental => "FUNDAMENTAL",
            FormulaLayer::Effective => "EFFECTIVE",
            FormulaLayer::Phenomenological => "PHENOMENOLOGICAL",
            FormulaLayer::Approximation => "APPROXIMATION",
            FormulaLayer::Numerical => "NUMERICAL",
        }
    }
}

impl std::fmt::Display for FormulaLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormulaStatus {
    /// Proposed, not yet reviewed.
    Candidate,
    /// Reviewed and in normal use.
    Accepted,
    /// Retired; kept for history, heavily penalized by the planner.
    Deprecated,
    /// Under dispute; penalized by the planner.
    Contested,
    /// Settled cornerstone of its domain.
    Fundamental,
}

impl FormulaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FormulaStatus::Candidate => "CANDIDATE",
            FormulaStatus::Accepted => "ACCEPTED",
            FormulaStatus::Deprecated => "DEPRECATED",
            FormulaStatus::Contested => "CONTESTED",
            FormulaStatus::Fundamental => "FUNDAMENTAL",
        }
    }
}

impl std::fmt::Display for FormulaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Formula
// ---------------------------------------------------------------------------

/// A stored formula: the node type of the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    /// Unique within a graph. Derived from name and symbolic form when empty.
    #[serde(default)]
    pub id: String,
    pub name: String,
    /// The equation as text ("F = m * a").
    pub symbolic_form: String,
    #[serde(default)]
    pub inputs: Vec<Variable>,
    #[serde(default)]
    pub outputs: Vec<Variable>,
    /// Constants the formula relies on; not required as planning inputs.
    #[serde(default)]
    pub parameters: Vec<Variable>,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub regime: RegimeOfValidity,
    #[serde(default)]
    pub assumptions: Vec<String>,
    pub layer: FormulaLayer,
    pub status: FormulaStatus,
    /// Relative uncertainty in [0.0, 1.0].
    #[serde(default)]
    pub uncertainty: f64,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
    /// Citation or origin of the formula.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub tags: HashSet<String>,
}

fn default_version() -> u32 {
    1
}

/// Content-derived identifier: `f_` plus 16 hex digits of SHA-256 over
/// `name|symbolic_form`.
pub fn content_id(name: &str, symbolic_form: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.as_bytes());
    hasher.update(b"|");
    hasher.update(symbolic_form.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("f_{}", &digest[..16])
}

impl Formula {
    /// Create an accepted, effective-layer formula with full confidence and a
    /// content-derived id.
    pub fn new(name: impl Into<String>, symbolic_form: impl Into<String>) -> Self {
        let name = name.into();
        let symbolic_form = symbolic_form.into();
        Self {
            id: content_id(&name, &symbolic_form),
            name,
            symbolic_form,
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            domain: String::new(),
            regime: RegimeOfValidity::default(),
            assumptions: Vec::new(),
            layer: FormulaLayer::Effective,
            status: FormulaStatus::Accepted,
            uncertainty: 0.0,
            confidence: 1.0,
            evidence: Vec::new(),
            created_at: Utc::now(),
            created_by: String::new(),
            source: None,
            version: 1,
            tags: HashSet::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_input(mut self, variable: Variable) -> Self {
        self.inputs.push(variable);
        self
    }

    pub fn with_output(mut self, variable: Variable) -> Self {
        self.outputs.push(variable);
        self
    }

    pub fn with_parameter(mut self, variable: Variable) -> Self {
        self.parameters.push(variable);
        self
    }

    /// Add inputs by symbol only.
    pub fn with_inputs<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.extend(symbols.into_iter().map(Variable::symbol));
        self
    }

    /// Add outputs by symbol only.
    pub fn with_outputs<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs.extend(symbols.into_iter().map(Variable::symbol));
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_regime(mut self, regime: RegimeOfValidity) -> Self {
        self.regime = regime;
        self
    }

    pub fn with_assumption(mut self, assumption: impl Into<String>) -> Self {
        self.assumptions.push(assumption.into());
        self
    }

    pub fn with_layer(mut self, layer: FormulaLayer) -> Self {
        self.layer = layer;
        self
    }

    pub fn with_status(mut self, status: FormulaStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    pub fn with_uncertainty(mut self, uncertainty: f64) -> Self {
        self.uncertainty = clamp_unit(uncertainty);
        self
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Fill a missing id and clamp scores into range.
    ///
    /// Values already in range pass through unchanged, so a formula built with
    /// the builder methods compares equal to its normalized form.
    pub fn normalized(mut self) -> Self {
        if self.id.is_empty() {
            self.id = content_id(&self.name, &self.symbolic_form);
        }
        self.confidence = clamp_unit(self.confidence);
        self.uncertainty = clamp_unit(self.uncertainty);
        for evidence in &mut self.evidence {
            evidence.confidence = clamp_unit(evidence.confidence);
        }
        self
    }

    pub fn input_symbols(&self) -> HashSet<&str> {
        self.inputs.iter().map(|v| v.symbol.as_str()).collect()
    }

    pub fn output_symbols(&self) -> HashSet<&str> {
        self.outputs.iter().map(|v| v.symbol.as_str()).collect()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Assumptions followed by regime conditions, in declaration order.
    pub fn conditions(&self) -> Vec<String> {
        self.assumptions
            .iter()
            .chain(self.regime.conditions.iter())
            .cloned()
            .collect()
    }

    /// Whether the declared domain matches this formula's domain or any of its
    /// regime domains.
    pub fn matches_domain(&self, domain: &str) -> bool {
        self.domain == domain || self.regime.domains.contains(domain)
    }

    /// Check whether the formula may be applied in `context`.
    ///
    /// Returns `(true, [])` when applicable, otherwise `false` with one reason
    /// per violated condition.
    pub fn is_applicable(&self, context: &Context) -> (bool, Vec<String>) {
        let mut reasons = Vec::new();

        if let Some(domain) = context.domain()
            && !self.regime.domains.is_empty()
            && !self.regime.domains.contains(domain)
        {
            reasons.push(format!("domain '{domain}' outside regime domains"));
        }

        let mut bounded: Vec<_> = self.regime.variable_bounds.iter().collect();
        bounded.sort_by(|a, b| a.0.cmp(b.0));
        for (symbol, range) in bounded {
            let Some(value) = context.number(symbol) else {
                continue;
            };
            if let Some(lo) = range.min
                && value < lo
            {
                reasons.push(format!("{symbol}={value} below minimum {lo}"));
            }
            if let Some(hi) = range.max
                && value > hi
            {
                reasons.push(format!("{symbol}={value} above maximum {hi}"));
            }
        }

        for condition in &self.regime.conditions {
            if context.flag(condition) == Some(false) {
                reasons.push(format!("condition not met: {condition}"));
            }
        }

        (reasons.is_empty(), reasons)
    }

    /// Supporting minus challenging evidence confidence. Informational only;
    /// confidence recomputation is up to the caller.
    pub fn evidence_balance(&self) -> f64 {
        self.evidence
            .iter()
            .map(|e| if e.supports { e.confidence } else { -e.confidence })
            .sum()
    }
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn newton() -> Formula {
        Formula::new("Newton's second law", "F = m * a")
            .with_inputs(["m", "a"])
            .with_outputs(["F"])
            .with_domain("mechanics")
            .with_layer(FormulaLayer::Fundamental)
    }

    #[test]
    fn id_is_content_derived_and_stable() {
        let a = newton();
        let b = newton();
        assert_eq!(a.id, b.id);
        assert!(a.id.starts_with("f_"));
        assert_eq!(a.id.len(), 18);
        assert_ne!(a.id, Formula::new("Newton's second law", "F = m a").id);
    }

    #[test]
    fn normalized_fills_missing_id_and_clamps() {
        let mut f = newton();
        f.id.clear();
        f.confidence = 3.0;
        f.uncertainty = -1.0;
        let n = f.normalized();
        assert_eq!(n.id, newton().id);
        assert_eq!(n.confidence, 1.0);
        assert_eq!(n.uncertainty, 0.0);
    }

    #[test]
    fn normalized_is_identity_for_builder_values() {
        let f = newton().with_confidence(0.8).with_uncertainty(0.1);
        assert_eq!(f.clone().normalized(), f);
    }

    #[test]
    fn bound_violation_makes_formula_inapplicable() {
        let f = newton().with_regime(RegimeOfValidity::new().with_bound("v", ValueRange::at_most(0.1)));
        let (ok, reasons) = f.is_applicable(&Context::new().with_value("v", 0.5));
        assert!(!ok);
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("above maximum"));

        let (ok, _) = f.is_applicable(&Context::new().with_value("v", 0.05));
        assert!(ok);
    }

    #[test]
    fn domain_outside_regime_domains_is_rejected() {
        let f = newton().with_regime(RegimeOfValidity::new().with_domain("mechanics"));
        assert!(f.is_applicable(&Context::new().with_domain("mechanics")).0);
        assert!(!f.is_applicable(&Context::new().with_domain("optics")).0);
        // No declared regime domains means unrestricted.
        assert!(newton().is_applicable(&Context::new().with_domain("optics")).0);
    }

    #[test]
    fn false_condition_flag_is_rejected() {
        let f = newton().with_regime(RegimeOfValidity::new().with_condition("non-relativistic"));
        assert!(!f.is_applicable(&Context::new().with_flag("non-relativistic", false)).0);
        assert!(f.is_applicable(&Context::new().with_flag("non-relativistic", true)).0);
        assert!(f.is_applicable(&Context::new()).0);
    }

    #[test]
    fn enums_serialize_by_name_and_reject_unknown() {
        assert_eq!(
            serde_json::to_string(&FormulaLayer::Phenomenological).unwrap(),
            "\"PHENOMENOLOGICAL\""
        );
        let err = serde_json::from_str::<FormulaStatus>("\"MAYBE\"");
        assert!(err.is_err());
    }

    #[test]
    fn evidence_balance_subtracts_challenges() {
        let f = newton()
            .with_evidence(Evidence::supporting("experiment", "e1", "ok").with_confidence(0.9))
            .with_evidence(Evidence::challenging("experiment", "e2", "off").with_confidence(0.4));
        assert!((f.evidence_balance() - 0.5).abs() < 1e-9);
    }
}
