//! JSON persistence for the formula graph.
//!
//! Document layout:
//!
//! ```json
//! {"formulas": [...], "edges": [...], "metadata": {"saved_at": "<RFC 3339>", "version": "1.0"}}
//! ```
//!
//! Loading parses the whole document and builds a fresh graph before anything
//! is replaced, so a malformed record can never leave a half-populated graph.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::error::{StoreError, StoreResult};
use crate::formula::Formula;

use super::FormulaGraph;

/// Current document format version.
pub const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub saved_at: DateTime<Utc>,
    pub version: String,
}

/// Serialized form of a whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphDocument {
    pub formulas: Vec<Formula>,
    pub edges: Vec<Edge>,
    pub metadata: DocumentMetadata,
}

impl FormulaGraph {
    /// Snapshot the graph as a document. Formulas are ordered by id, edges by
    /// insertion.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            formulas: self.formulas_sorted().into_iter().cloned().collect(),
            edges: self.edges.clone(),
            metadata: DocumentMetadata {
                saved_at: Utc::now(),
                version: FORMAT_VERSION.to_string(),
            },
        }
    }

    /// Build a graph from a parsed document.
    pub fn from_document(doc: GraphDocument) -> StoreResult<Self> {
        if doc.metadata.version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                version: doc.metadata.version,
                expected: FORMAT_VERSION.to_string(),
            });
        }
        Self::from_parts(doc.formulas, doc.edges)
    }

    /// Write the graph to `path` as pretty-printed JSON.
    ///
    /// The document is written to a sibling temporary file and renamed into
    /// place, so readers never observe a truncated store.
    pub fn save(&self, path: impl AsRef<Path>) -> StoreResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.to_document())
            .map_err(|source| StoreError::Serialize { source })?;

        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        tracing::info!(
            path = %path.display(),
            formulas = self.len(),
            edges = self.edges.len(),
            "saved formula graph"
        );
        Ok(())
    }

    /// Read a graph from `path` into a new instance.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let doc: GraphDocument =
            serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        let graph = Self::from_document(doc)?;
        tracing::info!(
            path = %path.display(),
            formulas = graph.len(),
            edges = graph.edges.len(),
            "loaded formula graph"
        );
        Ok(graph)
    }

    /// Replace this graph with the contents of `path`.
    ///
    /// On error the current graph is left exactly as it was.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> StoreResult<()> {
        *self = Self::load(path)?;
        Ok(())
    }
}
