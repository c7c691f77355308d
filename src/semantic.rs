//! The semantic oracle: everything the indexer asks of the compiler.
//!
//! The engine never parses or type-checks. It drives a [`LanguageService`], a
//! synchronous query surface over an already-compiled program: source files,
//! syntax handles, symbols, types, hover text, and per-file diagnostics and
//! outlining data. Implementations wrap a real compiler front-end; the crate
//! ships [`crate::snapshot::ProgramSnapshot`] as a self-contained one.
//!
//! All answers are optional where the compiler can legitimately come up
//! empty; the indexer degrades by omitting the corresponding output.

use crate::types::{FileId, NodeId, SymbolRef, TypeRef};
use bitflags::bitflags;
use lsp_types::Range;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Syntactic classification of a node, reduced to the kinds the indexer
/// dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    SourceFile,
    ModuleDeclaration,
    ClassDeclaration,
    InterfaceDeclaration,
    MethodDeclaration,
    MethodSignature,
    FunctionDeclaration,
    ParameterDeclaration,
    TypeParameterDeclaration,
    ClassExpression,
    Identifier,
    Block,
    Other,
}

bitflags! {
    /// Classification bits of a raw symbol.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
    pub struct SymbolFlags: u32 {
        const CLASS         = 1 << 0;
        const INTERFACE     = 1 << 1;
        const METHOD        = 1 << 2;
        const FUNCTION      = 1 << 3;
        const PROPERTY      = 1 << 4;
        const VARIABLE      = 1 << 5;
        const ALIAS         = 1 << 6;
        const TRANSIENT     = 1 << 7;
        const TYPE_LITERAL  = 1 << 8;
        const SOURCE_FILE   = 1 << 9;
    }
}

/// Outlining span reported by the navigation service, mapped to a folding
/// range on document end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutliningSpan {
    pub range: Range,
    pub kind: OutliningSpanKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutliningSpanKind {
    Comment,
    Imports,
    Region,
    Code,
}

/// Diagnostic as the compiler reports it. Semantic diagnostics may lack a
/// resolvable location; those are dropped on conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDiagnostic {
    pub range: Option<Range>,
    pub severity: DiagnosticLevel,
    #[serde(default)]
    pub code: Option<i32>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    Error,
    Warning,
    Suggestion,
    Message,
}

/// The subset of compiler options the run consumes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerOptions {
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
    #[serde(default)]
    pub out_dir: Option<PathBuf>,
}

/// Synchronous query oracle over a compiled program.
///
/// One indexing run holds a single service reference; handles returned by
/// one method may be passed to any other for the lifetime of the run.
pub trait LanguageService {
    // ------------------------------------------------------------------
    // Program
    // ------------------------------------------------------------------

    /// Source files in program order. This order drives emission order.
    fn source_files(&self) -> Vec<FileId>;

    fn compiler_options(&self) -> CompilerOptions;

    /// Absolute path of the file.
    fn file_path(&self, file: FileId) -> &Path;

    /// Full text, when the host made it available.
    fn file_text(&self, file: FileId) -> Option<&str>;

    /// Root syntax node of the file.
    fn root_node(&self, file: FileId) -> NodeId;

    fn is_declaration_file(&self, file: FileId) -> bool;

    /// True when the file was imported from a third-party package rather
    /// than compiled as part of this project.
    fn is_external_library(&self, file: FileId) -> bool;

    fn outlining_spans(&self, file: FileId) -> Vec<OutliningSpan>;

    fn syntactic_diagnostics(&self, file: FileId) -> Vec<RawDiagnostic>;

    fn semantic_diagnostics(&self, file: FileId) -> Vec<RawDiagnostic>;

    // ------------------------------------------------------------------
    // Syntax
    // ------------------------------------------------------------------

    fn node_kind(&self, node: NodeId) -> NodeKind;

    fn node_children(&self, node: NodeId) -> Vec<NodeId>;

    fn node_file(&self, node: NodeId) -> FileId;

    /// Half-open `[start, end)` span in line/character coordinates.
    fn node_range(&self, node: NodeId) -> Range;

    fn node_text(&self, node: NodeId) -> String;

    /// The name node of a declaration, when it has one.
    fn name_node(&self, node: NodeId) -> Option<NodeId>;

    /// Heritage type nodes (`extends`/`implements`) of a class declaration.
    fn heritage_nodes(&self, node: NodeId) -> Vec<NodeId>;

    // ------------------------------------------------------------------
    // Checker
    // ------------------------------------------------------------------

    fn symbol_at(&self, node: NodeId) -> Option<SymbolRef>;

    fn type_at(&self, node: NodeId) -> Option<TypeRef>;

    /// Hover content for the node, as markdown.
    fn quick_info(&self, node: NodeId) -> Option<String>;

    /// Stable key for the symbol, unique within the run.
    fn symbol_id(&self, symbol: SymbolRef) -> crate::types::SymbolId;

    fn symbol_name(&self, symbol: SymbolRef) -> String;

    fn symbol_flags(&self, symbol: SymbolRef) -> SymbolFlags;

    fn symbol_declarations(&self, symbol: SymbolRef) -> Vec<NodeId>;

    fn symbol_parent(&self, symbol: SymbolRef) -> Option<SymbolRef>;

    /// Member of the symbol's members table, by name.
    fn symbol_member(&self, symbol: SymbolRef, name: &str) -> Option<SymbolRef>;

    /// Entry of the symbol's exports table, by name.
    fn symbol_export(&self, symbol: SymbolRef, name: &str) -> Option<SymbolRef>;

    /// Target of an alias symbol.
    fn aliased_symbol(&self, symbol: SymbolRef) -> Option<SymbolRef>;

    /// The innermost node bounding the lifetime of a locally visible
    /// symbol; `None` for symbols visible beyond one scope.
    fn symbol_scope(&self, symbol: SymbolRef) -> Option<NodeId>;

    /// Declared base types of an interface symbol.
    fn declared_base_types(&self, symbol: SymbolRef) -> Vec<TypeRef>;

    fn type_symbol(&self, ty: TypeRef) -> Option<SymbolRef>;

    /// Constituents when the type is a union or intersection.
    fn union_or_intersection_parts(&self, ty: TypeRef) -> Option<Vec<TypeRef>>;

    /// Property of the (possibly synthesized) type, by name.
    fn type_property(&self, ty: TypeRef, name: &str) -> Option<SymbolRef>;
}
