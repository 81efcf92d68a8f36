//! Regimes of validity: the conditions under which a formula may be applied.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// A closed interval with optionally open ends.
///
/// Serialized as a two-element array `[min, max]`, `null` marking an open side.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "(Option<f64>, Option<f64>)", into = "(Option<f64>, Option<f64>)")]
pub struct ValueRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ValueRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn at_most(max: f64) -> Self {
        Self::new(None, Some(max))
    }

    pub fn at_least(min: f64) -> Self {
        Self::new(Some(min), None)
    }

    pub fn between(min: f64, max: f64) -> Self {
        Self::new(Some(min), Some(max))
    }

    /// Whether `value` lies inside the range (bounds inclusive).
    pub fn contains(&self, value: f64) -> bool {
        self.min.is_none_or(|lo| value >= lo) && self.max.is_none_or(|hi| value <= hi)
    }

    /// Whether the two ranges share at least one point.
    pub fn overlaps(&self, other: &ValueRange) -> bool {
        let above = matches!((self.min, other.max), (Some(lo), Some(hi)) if lo > hi);
        let below = matches!((self.max, other.min), (Some(hi), Some(lo)) if hi < lo);
        !above && !below
    }
}

impl From<(Option<f64>, Option<f64>)> for ValueRange {
    fn from((min, max): (Option<f64>, Option<f64>)) -> Self {
        Self { min, max }
    }
}

impl From<ValueRange> for (Option<f64>, Option<f64>) {
    fn from(range: ValueRange) -> Self {
        (range.min, range.max)
    }
}

/// Qualitative and quantitative conditions under which a formula holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeOfValidity {
    /// Per-variable admissible ranges, keyed by symbol.
    pub variable_bounds: HashMap<String, ValueRange>,
    /// Named conditions ("non-relativistic", "weak field").
    pub conditions: Vec<String>,
    /// Domains the formula is valid in. Empty means unrestricted.
    pub domains: HashSet<String>,
    pub length_scale: Option<ValueRange>,
    pub energy_scale: Option<ValueRange>,
    pub time_scale: Option<ValueRange>,
}

impl RegimeOfValidity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bound(mut self, symbol: impl Into<String>, range: ValueRange) -> Self {
        self.variable_bounds.insert(symbol.into(), range);
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domains.insert(domain.into());
        self
    }

    /// Whether two regimes can hold at the same time.
    ///
    /// False if both declare domains and those sets are disjoint, or if any
    /// variable bounded by both has ranges that cannot overlap.
    pub fn is_compatible(&self, other: &RegimeOfValidity) -> bool {
        if !self.domains.is_empty()
            && !other.domains.is_empty()
            && self.domains.is_disjoint(&other.domains)
        {
            return false;
        }
        self.variable_bounds.iter().all(|(symbol, range)| {
            other
                .variable_bounds
                .get(symbol)
                .is_none_or(|theirs| range.overlaps(theirs))
        })
    }
}
