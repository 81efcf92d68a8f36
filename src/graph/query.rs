//! Index-backed formula queries.
//!
//! Structural filters (domain, tags, status, layer) are answered by
//! intersecting index sets; the confidence threshold and custom predicate are
//! applied in a final scan over the surviving candidates.

use std::collections::HashSet;

use crate::formula::{Formula, FormulaLayer, FormulaStatus};

use super::FormulaGraph;

/// A conjunctive query over formulas.
#[derive(Default)]
pub struct FormulaQuery<'a> {
    pub domain: Option<String>,
    /// All listed tags must be present.
    pub tags: Vec<String>,
    pub status: Option<FormulaStatus>,
    pub layer: Option<FormulaLayer>,
    pub min_confidence: f64,
    pub predicate: Option<Box<dyn Fn(&Formula) -> bool + 'a>>,
}

impl<'a> FormulaQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn with_status(mut self, status: FormulaStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_layer(mut self, layer: FormulaLayer) -> Self {
        self.layer = Some(layer);
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_predicate(mut self, predicate: impl Fn(&Formula) -> bool + 'a) -> Self {
        self.predicate = Some(Box::new(predicate));
        self
    }
}

impl std::fmt::Debug for FormulaQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormulaQuery")
            .field("domain", &self.domain)
            .field("tags", &self.tags)
            .field("status", &self.status)
            .field("layer", &self.layer)
            .field("min_confidence", &self.min_confidence)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

impl FormulaGraph {
    /// Run a query. Results are sorted by id.
    pub fn query(&self, q: &FormulaQuery<'_>) -> Vec<&Formula> {
        // `None` means "unconstrained so far".
        let mut candidates: Option<HashSet<&str>> = None;

        if let Some(domain) = &q.domain {
            narrow(&mut candidates, self.by_domain.get(domain));
        }
        for tag in &q.tags {
            narrow(&mut candidates, self.by_tag.get(tag));
        }
        if let Some(status) = &q.status {
            narrow(&mut candidates, self.by_status.get(status));
        }
        if let Some(layer) = &q.layer {
            narrow(&mut candidates, self.by_layer.get(layer));
        }

        let candidates =
            candidates.unwrap_or_else(|| self.formulas.keys().map(String::as_str).collect());

        let mut results: Vec<&Formula> = candidates
            .into_iter()
            .filter_map(|id| self.formulas.get(id))
            .filter(|f| f.confidence >= q.min_confidence)
            .filter(|f| q.predicate.as_ref().is_none_or(|p| p(*f)))
            .collect();
        results.sort_by(|a, b| a.id.cmp(&b.id));
        results
    }
}

/// Intersect the running candidate set with one index bucket. A missing bucket
/// empties the candidates.
fn narrow<'g>(candidates: &mut Option<HashSet<&'g str>>, bucket: Option<&'g HashSet<String>>) {
    let bucket: HashSet<&str> = bucket
        .map(|ids| ids.iter().map(String::as_str).collect())
        .unwrap_or_default();
    *candidates = Some(match candidates.take() {
        None => bucket,
        Some(current) => current.intersection(&bucket).copied().collect(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> FormulaGraph {
        let mut g = FormulaGraph::new();
        let entries = [
            ("newton", "mechanics", &["dynamics", "classical"][..], FormulaLayer::Fundamental, 1.0),
            ("hooke", "mechanics", &["classical", "elasticity"][..], FormulaLayer::Phenomenological, 0.7),
            ("snell", "optics", &["classical"][..], FormulaLayer::Effective, 0.9),
            ("drag", "mechanics", &["dynamics"][..], FormulaLayer::Approximation, 0.4),
        ];
        for (id, domain, tags, layer, confidence) in entries {
            let mut f = Formula::new(id, format!("{id}()"))
                .with_id(id)
                .with_domain(domain)
                .with_layer(layer)
                .with_confidence(confidence);
            for tag in tags {
                f = f.with_tag(*tag);
            }
            g.add_formula(f, false);
        }
        g
    }

    fn ids<'a>(formulas: &[&'a Formula]) -> Vec<&'a str> {
        formulas.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn unconstrained_query_returns_everything_sorted() {
        let g = populated();
        assert_eq!(ids(&g.query(&FormulaQuery::new())), ["drag", "hooke", "newton", "snell"]);
    }

    #[test]
    fn tags_use_and_semantics() {
        let g = populated();
        let q = FormulaQuery::new().with_tag("classical").with_tag("dynamics");
        assert_eq!(ids(&g.query(&q)), ["newton"]);
    }

    #[test]
    fn filters_intersect() {
        let g = populated();
        let q = FormulaQuery::new()
            .with_domain("mechanics")
            .with_tag("classical")
            .with_layer(FormulaLayer::Phenomenological);
        assert_eq!(ids(&g.query(&q)), ["hooke"]);
    }

    #[test]
    fn unknown_bucket_yields_nothing() {
        let g = populated();
        assert!(g.query(&FormulaQuery::new().with_domain("thermo")).is_empty());
        assert!(g.query(&FormulaQuery::new().with_status(FormulaStatus::Contested)).is_empty());
    }

    #[test]
    fn confidence_and_predicate_scan() {
        let g = populated();
        let q = FormulaQuery::new().with_domain("mechanics").with_min_confidence(0.5);
        assert_eq!(ids(&g.query(&q)), ["hooke", "newton"]);

        let q = FormulaQuery::new().with_predicate(|f| f.name.starts_with('s'));
        assert_eq!(ids(&g.query(&q)), ["snell"]);
    }
}
