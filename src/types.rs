//! Core types for the LSIF indexer.
//!
//! This module defines the handle and configuration types shared across all
//! layers: oracle handles (files, syntax nodes, symbols, types), the stable
//! symbol key, and the options the indexing run is configured with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Oracle handles
// ============================================================================
//
// The semantic oracle hands out opaque handles. Comparing syntax nodes
// requires reference identity, so all of these are small Copy keys that stay
// valid for the lifetime of one indexing run.

/// Handle for a source file known to the language service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileId(pub u32);

/// Handle for a syntax node. Identity, not structure: two handles are the
/// same node iff they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

/// Handle for a raw symbol produced by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolRef(pub u32);

/// Handle for a type produced by the type checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef(pub u32);

/// Stable string key for a symbol, unique within one indexing run.
///
/// The oracle is responsible for making this stable across lookups of the
/// same symbol; the data manager keys all per-symbol state on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub String);

impl SymbolId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Run configuration
// ============================================================================

/// Options for one indexing run.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexerOptions {
    /// Absolute root of the project being indexed.
    pub project_root: PathBuf,
    /// Suppress file contents on document vertices.
    #[serde(default)]
    pub no_contents: bool,
    /// Path of the project's configuration file. Relative `rootDir`/`outDir`
    /// values resolve against its parent directory.
    #[serde(default)]
    pub config_file: Option<PathBuf>,
}

/// A dependent project whose build output this project consumes.
///
/// Files found under `out_dir` are identified across dumps via moniker paths
/// relative to that directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentProject {
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
}

/// Root and output directory of the visited project, as resolved by the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectInfo {
    pub root_dir: PathBuf,
    pub out_dir: PathBuf,
}
