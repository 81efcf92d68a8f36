//! Typed, directed relationships between formulas.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::formula::clamp_unit;

/// Free-form edge metadata, kept as a JSON object.
pub type EdgeMetadata = serde_json::Map<String, serde_json::Value>;

/// Grouping of edge types by the kind of relationship they express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeFamily {
    Derivation,
    Limit,
    Conflict,
    Dependency,
    Validation,
    Composition,
}

/// The closed set of relationship types.
///
/// Serialized by SCREAMING_SNAKE_CASE name; unknown names are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    // Derivation
    DerivesFrom,
    SpecialCaseOf,
    Generalizes,
    // Limits
    LowEnergyLimitOf,
    NonRelativisticLimitOf,
    ClassicalLimitOf,
    WeakFieldLimitOf,
    SmallAngleLimitOf,
    ThermodynamicLimitOf,
    ContinuumLimitOf,
    // Conflict
    Contradicts,
    Supersedes,
    // Dependency
    DependsOn,
    UsesParameterFrom,
    // Validation
    CalibratedBy,
    ValidatedBy,
    ApproximatedBy,
    // Composition
    CombinesWith,
    EquivalentTo,
    AnalogousTo,
}

impl EdgeType {
    pub const ALL: [EdgeType; 20] = [
        EdgeType::DerivesFrom,
        EdgeType::SpecialCaseOf,
        EdgeType::Generalizes,
        EdgeType::LowEnergyLimitOf,
        EdgeType::NonRelativisticLimitOf,
        EdgeType::ClassicalLimitOf,
        EdgeType::WeakFieldLimitOf,
        EdgeType::SmallAngleLimitOf,
        EdgeType::ThermodynamicLimitOf,
        EdgeType::ContinuumLimitOf,
        EdgeType::Contradicts,
        EdgeType::Supersedes,
        EdgeType::DependsOn,
        EdgeType::UsesParameterFrom,
        EdgeType::CalibratedBy,
        EdgeType::ValidatedBy,
        EdgeType::ApproximatedBy,
        EdgeType::CombinesWith,
        EdgeType::EquivalentTo,
        EdgeType::AnalogousTo,
    ];

    pub fn family(self) -> EdgeFamily {
        use EdgeType::*;
        match self {
            DerivesFrom | SpecialCaseOf | Generalizes => EdgeFamily::Derivation,
            LowEnergyLimitOf | NonRelativisticLimitOf | ClassicalLimitOf | WeakFieldLimitOf
            | SmallAngleLimitOf | ThermodynamicLimitOf | ContinuumLimitOf => EdgeFamily::Limit,
            Contradicts | Supersedes => EdgeFamily::Conflict,
            DependsOn | UsesParameterFrom => EdgeFamily::Dependency,
            CalibratedBy | ValidatedBy | ApproximatedBy => EdgeFamily::Validation,
            CombinesWith | EquivalentTo | AnalogousTo => EdgeFamily::Composition,
        }
    }

    /// Edge types scanned for cycles by the consistency audit.
    pub fn cycle_scope() -> HashSet<EdgeType> {
        [
            EdgeType::DerivesFrom,
            EdgeType::SpecialCaseOf,
            EdgeType::Generalizes,
            EdgeType::DependsOn,
        ]
        .into_iter()
        .collect()
    }

    pub fn as_str(self) -> &'static str {
        use EdgeType::*;
        match self {
            DerivesFrom => "DERIVES_FROM",
            SpecialCaseOf => "SPECIAL_CASE_OF",
            Generalizes => "GENERALIZES",
            LowEnergyLimitOf => "LOW_ENERGY_LIMIT_OF",
            NonRelativisticLimitOf => "NON_RELATIVISTIC_LIMIT_OF",
            ClassicalLimitOf => "CLASSICAL_LIMIT_OF",
            WeakFieldLimitOf => "WEAK_FIELD_LIMIT_OF",
            SmallAngleLimitOf => "SMALL_ANGLE_LIMIT_OF",
            ThermodynamicLimitOf => "THERMODYNAMIC_LIMIT_OF",
            ContinuumLimitOf => "CONTINUUM_LIMIT_OF",
            Contradicts => "CONTRADICTS",
            Supersedes => "SUPERSEDES",
            DependsOn => "DEPENDS_ON",
            UsesParameterFrom => "USES_PARAMETER_FROM",
            CalibratedBy => "CALIBRATED_BY",
            ValidatedBy => "VALIDATED_BY",
            ApproximatedBy => "APPROXIMATED_BY",
            CombinesWith => "COMBINES_WITH",
            EquivalentTo => "EQUIVALENT_TO",
            AnalogousTo => "ANALOGOUS_TO",
        }
    }
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed relationship between two formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source_id: String,
    pub target_id: String,
    pub edge_type: EdgeType,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
    #[serde(default)]
    pub metadata: EdgeMetadata,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: String,
}

impl Edge {
    /// Create an edge with full confidence, empty metadata and the current time.
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        edge_type: EdgeType,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            edge_type,
            confidence: 1.0,
            metadata: EdgeMetadata::new(),
            created_at: Utc::now(),
            created_by: String::new(),
        }
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = clamp_unit(confidence);
        self
    }

    /// Re-clamp the confidence, which may have been set directly on the field.
    pub fn normalized(mut self) -> Self {
        self.confidence = clamp_unit(self.confidence);
        self
    }

    pub fn with_metadata(mut self, metadata: EdgeMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_created_by(mut self, created_by: impl Into<String>) -> Self {
        self.created_by = created_by.into();
        self
    }

    /// Whether this edge connects `source` to `target` with the given type.
    pub fn matches(&self, source: &str, target: &str, edge_type: EdgeType) -> bool {
        self.source_id == source && self.target_id == target && self.edge_type == edge_type
    }

    /// Whether either end of this edge is `id`.
    pub fn touches(&self, id: &str) -> bool {
        self.source_id == id || self.target_id == id
    }
}
