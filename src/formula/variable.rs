//! Variables and evidence records attached to formulas.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named quantity used as a formula input, output or parameter.
///
/// Planning keys on [`symbol`](Variable::symbol), never on `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    /// Human-readable name ("mass").
    pub name: String,
    /// Planning key ("m").
    pub symbol: String,
    /// Units, free-form ("kg", "m/s^2").
    #[serde(default)]
    pub units: Option<String>,
    /// Free-form constraint note ("m > 0").
    #[serde(default)]
    pub constraints: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Variable {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            units: None,
            constraints: None,
            description: None,
        }
    }

    /// Shorthand for a variable whose name is its symbol.
    pub fn symbol(symbol: impl Into<String>) -> Self {
        let symbol = symbol.into();
        Self::new(symbol.clone(), symbol)
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = Some(constraints.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A piece of evidence supporting or challenging a formula.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Kind of source ("experiment", "derivation", "literature", ...).
    pub source_type: String,
    /// Identifier within that source (DOI, run id, ...).
    pub source_id: String,
    pub description: String,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// `true` if the evidence supports the formula, `false` if it challenges it.
    pub supports: bool,
}

impl Evidence {
    /// Create a supporting evidence record with full confidence.
    pub fn supporting(
        source_type: impl Into<String>,
        source_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            source_id: source_id.into(),
            description: description.into(),
            confidence: 1.0,
            date: None,
            supports: true,
        }
    }

    /// Create a challenging evidence record with full confidence.
    pub fn challenging(
        source_type: impl Into<String>,
        source_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            supports: false,
            ..Self::supporting(source_type, source_id, description)
        }
    }

    /// Set the confidence score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = super::clamp_unit(confidence);
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }
}
