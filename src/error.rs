//! Rich diagnostic error types for the formula knowledge graph.
//!
//! Only unexpected conditions are errors: unreadable or corrupt store files,
//! unknown enum names in persisted data, malformed configuration. Expected
//! outcomes (duplicate ids, missing endpoints, unreachable goals) are reported
//! through `bool`, `Option` or empty collections by the graph and planner.

use miette::Diagnostic;
use thiserror::Error;

use crate::seeds::SeedError;

/// Top-level error type for the crate.
///
/// Each variant wraps a subsystem-specific error, preserving the full diagnostic
/// chain (error codes, help text, sources) through to the caller.
#[derive(Debug, Error, Diagnostic)]
pub enum KgError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Seed(#[from] SeedError),
}

// ---------------------------------------------------------------------------
// Store errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("I/O error on graph store {path}")]
    #[diagnostic(
        code(fkg::store::io),
        help(
            "A filesystem operation failed. Check that the parent directory exists, \
             has correct permissions, and that the disk is not full."
        )
    )]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse graph store {path}: {source}")]
    #[diagnostic(
        code(fkg::store::parse),
        help(
            "The file is not a valid graph document. Unknown edge types, layers or \
             statuses are rejected rather than defaulted; fix the offending record \
             or restore the file from a backup."
        )
    )]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize graph: {source}")]
    #[diagnostic(
        code(fkg::store::serialize),
        help("A formula or edge carries metadata that cannot be represented as JSON.")
    )]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported graph document version \"{version}\" (expected \"{expected}\")")]
    #[diagnostic(
        code(fkg::store::version),
        help("The store was written by an incompatible release. Re-export it with a matching version.")
    )]
    UnsupportedVersion { version: String, expected: String },

    #[error("duplicate formula id \"{id}\" in graph document")]
    #[diagnostic(
        code(fkg::store::duplicate_formula),
        help("Formula ids must be unique within a graph. Remove or rename one of the records.")
    )]
    DuplicateFormula { id: String },

    #[error("edge {source_id} -[{edge_type}]-> {target_id} references a missing formula")]
    #[diagnostic(
        code(fkg::store::dangling_edge),
        help(
            "Every edge must connect two formulas present in the same document. \
             Remove the edge or restore the missing formula."
        )
    )]
    DanglingEdge {
        source_id: String,
        target_id: String,
        edge_type: String,
    },
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config file: {path}")]
    #[diagnostic(code(fkg::config::read), help("Ensure the file exists and is readable."))]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    #[diagnostic(
        code(fkg::config::parse),
        help("Check the TOML syntax. Unknown keys are ignored, missing keys take defaults.")
    )]
    Parse { path: String, message: String },

    #[error("failed to serialize config for {path}: {source}")]
    #[diagnostic(
        code(fkg::config::serialize),
        help("Every configured path must be valid UTF-8 to be written as TOML.")
    )]
    Serialize {
        path: String,
        #[source]
        source: toml::ser::Error,
    },

    #[error("failed to write config file: {path}")]
    #[diagnostic(code(fkg::config::write), help("Check that the directory is writable."))]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Convenience alias for functions returning crate-level results.
pub type KgResult<T> = std::result::Result<T, KgError>;
