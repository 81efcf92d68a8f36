//! Greedy backward chaining from a target symbol.
//!
//! Picks, for each needed symbol, the most confident producer whose inputs can
//! themselves be chained. Not cost-optimized and independent of the
//! [`planner`](crate::planner); the two may disagree.

use std::collections::HashSet;

use super::FormulaGraph;

impl FormulaGraph {
    /// Find an ordered list of formula ids that derives `target` from
    /// `inputs`, looking at most `max_depth` producers deep.
    ///
    /// Returns `Some(vec![])` when `target` is already an input and `None` when
    /// no chain exists within the depth limit.
    pub fn find_derivation_chain(
        &self,
        target: &str,
        inputs: &HashSet<String>,
        max_depth: usize,
    ) -> Option<Vec<String>> {
        let mut in_progress = HashSet::new();
        let chain = self.chain_for(target, inputs, max_depth, &mut in_progress)?;
        // A formula may be reached through several branches; keep its first use.
        let mut seen = HashSet::new();
        Some(chain.into_iter().filter(|id| seen.insert(id.clone())).collect())
    }

    fn chain_for<'g>(
        &'g self,
        symbol: &str,
        inputs: &HashSet<String>,
        depth_left: usize,
        in_progress: &mut HashSet<&'g str>,
    ) -> Option<Vec<String>> {
        if inputs.contains(symbol) {
            return Some(Vec::new());
        }
        if depth_left == 0 {
            return None;
        }

        let mut producers = self.producers_of(symbol);
        producers.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        'candidates: for formula in producers {
            if !in_progress.insert(formula.id.as_str()) {
                continue;
            }
            let mut chain = Vec::new();
            for input in &formula.inputs {
                match self.chain_for(&input.symbol, inputs, depth_left - 1, in_progress) {
                    Some(sub) => chain.extend(sub),
                    None => {
                        in_progress.remove(formula.id.as_str());
                        continue 'candidates;
                    }
                }
            }
            in_progress.remove(formula.id.as_str());
            chain.push(formula.id.clone());
            return Some(chain);
        }
        None
    }
}
