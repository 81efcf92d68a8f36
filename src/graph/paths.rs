//! Path enumeration and cycle detection.
//!
//! Both walks use an explicit stack of successor iterators instead of
//! recursion, so deep graphs cannot exhaust the call stack.

use std::collections::HashSet;

use crate::edge::EdgeType;

use super::FormulaGraph;

impl FormulaGraph {
    /// Distinct successor ids of `id`, in edge insertion order, following only
    /// `allowed` edge types when given.
    pub(crate) fn successors(&self, id: &str, allowed: Option<&HashSet<EdgeType>>) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.outgoing
            .get(id)
            .into_iter()
            .flatten()
            .map(|&pos| &self.edges[pos])
            .filter(|e| allowed.is_none_or(|types| types.contains(&e.edge_type)))
            .map(|e| e.target_id.as_str())
            .filter(|target| seen.insert(*target))
            .collect()
    }

    /// Enumerate every simple path from `start` to `end` with at most
    /// `max_depth` edges.
    ///
    /// A node is on the current path at most once; it is released on
    /// backtrack so it can appear on other branches.
    pub fn find_paths(
        &self,
        start: &str,
        end: &str,
        max_depth: usize,
        allowed_types: Option<&HashSet<EdgeType>>,
    ) -> Vec<Vec<String>> {
        if !self.contains(start) || !self.contains(end) {
            return Vec::new();
        }
        if start == end {
            return vec![vec![start.to_string()]];
        }

        let mut paths = Vec::new();
        let mut path: Vec<&str> = vec![start];
        let mut on_path: HashSet<&str> = HashSet::from([start]);
        let mut stack = vec![self.successors(start, allowed_types).into_iter()];

        while let Some(frame) = stack.last_mut() {
            // `path.len()` edges after extending; stop once that exceeds the limit.
            let next = if path.len() > max_depth { None } else { frame.next() };
            match next {
                None => {
                    stack.pop();
                    if let Some(node) = path.pop() {
                        on_path.remove(node);
                    }
                }
                Some(target) if on_path.contains(target) => {}
                Some(target) if target == end => {
                    let mut found: Vec<String> = path.iter().map(|s| s.to_string()).collect();
                    found.push(target.to_string());
                    paths.push(found);
                }
                Some(target) => {
                    path.push(target);
                    on_path.insert(target);
                    stack.push(self.successors(target, allowed_types).into_iter());
                }
            }
        }

        tracing::debug!(start, end, max_depth, found = paths.len(), "enumerated paths");
        paths
    }

    /// Find cycles over edges whose type is in `edge_types`.
    ///
    /// Depth-first search with a visited set, a recursion-stack set and the
    /// current path. Reaching a node already on the recursion stack reports the
    /// path slice from that node to the current one. Roots are visited in id
    /// order, so results are deterministic.
    pub fn find_cycles(&self, edge_types: &HashSet<EdgeType>) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();

        for root in self.ids() {
            if visited.contains(root) {
                continue;
            }
            let mut rec_stack: HashSet<&str> = HashSet::new();
            let mut path: Vec<&str> = Vec::new();
            let mut stack = Vec::new();

            visited.insert(root);
            rec_stack.insert(root);
            path.push(root);
            stack.push(self.successors(root, Some(edge_types)).into_iter());

            while let Some(frame) = stack.last_mut() {
                match frame.next() {
                    None => {
                        stack.pop();
                        if let Some(node) = path.pop() {
                            rec_stack.remove(node);
                        }
                    }
                    Some(next) if rec_stack.contains(next) => {
                        if let Some(start) = path.iter().position(|n| *n == next) {
                            cycles.push(path[start..].iter().map(|s| s.to_string()).collect());
                        }
                    }
                    Some(next) if visited.contains(next) => {}
                    Some(next) => {
                        visited.insert(next);
                        rec_stack.insert(next);
                        path.push(next);
                        stack.push(self.successors(next, Some(edge_types)).into_iter());
                    }
                }
            }
        }
        cycles
    }
}
