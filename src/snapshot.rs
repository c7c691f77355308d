//! A self-contained, serializable implementation of the semantic oracle.
//!
//! A [`ProgramSnapshot`] is a compiled program flattened into tables: files,
//! syntax nodes, symbols, and types, cross-referenced by the handle types the
//! indexer uses. It backs the CLI (index a snapshot produced by a compiler
//! front-end) and the test suites (script a program shape directly via
//! [`SnapshotBuilder`]).

use crate::semantic::{
    CompilerOptions, LanguageService, NodeKind, OutliningSpan, RawDiagnostic, SymbolFlags,
};
use crate::types::{FileId, NodeId, SymbolId, SymbolRef, TypeRef};
use lsp_types::{Position, Range};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse snapshot {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot is inconsistent: {0}")]
    Invalid(String),
}

/// One source file of the program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileData {
    pub path: PathBuf,
    #[serde(default)]
    pub text: Option<String>,
    pub root: NodeId,
    #[serde(default)]
    pub declaration_file: bool,
    #[serde(default)]
    pub external_library: bool,
    #[serde(default)]
    pub outlining_spans: Vec<OutliningSpan>,
    #[serde(default)]
    pub syntactic_diagnostics: Vec<RawDiagnostic>,
    #[serde(default)]
    pub semantic_diagnostics: Vec<RawDiagnostic>,
}

/// One syntax node, flattened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub kind: NodeKind,
    pub file: FileId,
    pub range: Range,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub children: Vec<NodeId>,
    #[serde(default)]
    pub name: Option<NodeId>,
    #[serde(default)]
    pub symbol: Option<SymbolRef>,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeRef>,
    #[serde(default)]
    pub heritage: Vec<NodeId>,
    #[serde(default)]
    pub hover: Option<String>,
}

/// One checker symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Stable key, unique within the snapshot.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub flags: SymbolFlags,
    #[serde(default)]
    pub declarations: Vec<NodeId>,
    #[serde(default)]
    pub parent: Option<SymbolRef>,
    #[serde(default)]
    pub members: BTreeMap<String, SymbolRef>,
    #[serde(default)]
    pub exports: BTreeMap<String, SymbolRef>,
    #[serde(default)]
    pub alias_target: Option<SymbolRef>,
    #[serde(default)]
    pub scope: Option<NodeId>,
    #[serde(default)]
    pub base_types: Vec<TypeRef>,
}

/// One checker type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeInfo {
    #[serde(default)]
    pub symbol: Option<SymbolRef>,
    /// Constituents when this is a union or intersection type.
    #[serde(default)]
    pub parts: Option<Vec<TypeRef>>,
    #[serde(default)]
    pub properties: BTreeMap<String, SymbolRef>,
}

/// A compiled program flattened into tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramSnapshot {
    #[serde(default)]
    pub options: CompilerOptions,
    #[serde(default)]
    pub files: Vec<FileData>,
    #[serde(default)]
    pub nodes: Vec<NodeData>,
    #[serde(default)]
    pub symbols: Vec<SymbolInfo>,
    #[serde(default)]
    pub types: Vec<TypeInfo>,
}

impl ProgramSnapshot {
    pub fn from_json_file(path: &Path) -> Result<Self, SnapshotError> {
        let data = std::fs::read(path).map_err(|source| SnapshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let snapshot: Self =
            serde_json::from_slice(&data).map_err(|source| SnapshotError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Check that every handle points into its table.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let node_ok = |node: NodeId| (node.0 as usize) < self.nodes.len();
        let symbol_ok = |symbol: SymbolRef| (symbol.0 as usize) < self.symbols.len();
        let type_ok = |ty: TypeRef| (ty.0 as usize) < self.types.len();

        for (index, file) in self.files.iter().enumerate() {
            if !node_ok(file.root) {
                return Err(SnapshotError::Invalid(format!(
                    "file {index} has out-of-range root node {}",
                    file.root.0
                )));
            }
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if (node.file.0 as usize) >= self.files.len() {
                return Err(SnapshotError::Invalid(format!(
                    "node {index} has out-of-range file {}",
                    node.file.0
                )));
            }
            if node.children.iter().chain(&node.heritage).any(|n| !node_ok(*n))
                || node.name.is_some_and(|n| !node_ok(n))
            {
                return Err(SnapshotError::Invalid(format!(
                    "node {index} references an out-of-range node"
                )));
            }
            if node.symbol.is_some_and(|s| !symbol_ok(s)) {
                return Err(SnapshotError::Invalid(format!(
                    "node {index} references an out-of-range symbol"
                )));
            }
            if node.ty.is_some_and(|t| !type_ok(t)) {
                return Err(SnapshotError::Invalid(format!(
                    "node {index} references an out-of-range type"
                )));
            }
        }
        for (index, symbol) in self.symbols.iter().enumerate() {
            if symbol.declarations.iter().any(|n| !node_ok(*n))
                || symbol.scope.is_some_and(|n| !node_ok(n))
            {
                return Err(SnapshotError::Invalid(format!(
                    "symbol {index} references an out-of-range node"
                )));
            }
            if symbol.parent.is_some_and(|s| !symbol_ok(s))
                || symbol.alias_target.is_some_and(|s| !symbol_ok(s))
                || symbol.members.values().chain(symbol.exports.values()).any(|s| !symbol_ok(*s))
            {
                return Err(SnapshotError::Invalid(format!(
                    "symbol {index} references an out-of-range symbol"
                )));
            }
            if symbol.base_types.iter().any(|t| !type_ok(*t)) {
                return Err(SnapshotError::Invalid(format!(
                    "symbol {index} references an out-of-range type"
                )));
            }
        }
        for (index, ty) in self.types.iter().enumerate() {
            if ty.symbol.is_some_and(|s| !symbol_ok(s))
                || ty.properties.values().any(|s| !symbol_ok(*s))
            {
                return Err(SnapshotError::Invalid(format!(
                    "type {index} references an out-of-range symbol"
                )));
            }
            if ty.parts.iter().flatten().any(|t| !type_ok(*t)) {
                return Err(SnapshotError::Invalid(format!(
                    "type {index} references an out-of-range type"
                )));
            }
        }
        Ok(())
    }

    fn file(&self, file: FileId) -> &FileData {
        &self.files[file.0 as usize]
    }

    fn node(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0 as usize]
    }

    fn symbol(&self, symbol: SymbolRef) -> &SymbolInfo {
        &self.symbols[symbol.0 as usize]
    }

    fn ty(&self, ty: TypeRef) -> &TypeInfo {
        &self.types[ty.0 as usize]
    }
}

impl LanguageService for ProgramSnapshot {
    fn source_files(&self) -> Vec<FileId> {
        (0..self.files.len() as u32).map(FileId).collect()
    }

    fn compiler_options(&self) -> CompilerOptions {
        self.options.clone()
    }

    fn file_path(&self, file: FileId) -> &Path {
        &self.file(file).path
    }

    fn file_text(&self, file: FileId) -> Option<&str> {
        self.file(file).text.as_deref()
    }

    fn root_node(&self, file: FileId) -> NodeId {
        self.file(file).root
    }

    fn is_declaration_file(&self, file: FileId) -> bool {
        self.file(file).declaration_file
    }

    fn is_external_library(&self, file: FileId) -> bool {
        self.file(file).external_library
    }

    fn outlining_spans(&self, file: FileId) -> Vec<OutliningSpan> {
        self.file(file).outlining_spans.clone()
    }

    fn syntactic_diagnostics(&self, file: FileId) -> Vec<RawDiagnostic> {
        self.file(file).syntactic_diagnostics.clone()
    }

    fn semantic_diagnostics(&self, file: FileId) -> Vec<RawDiagnostic> {
        self.file(file).semantic_diagnostics.clone()
    }

    fn node_kind(&self, node: NodeId) -> NodeKind {
        self.node(node).kind
    }

    fn node_children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).children.clone()
    }

    fn node_file(&self, node: NodeId) -> FileId {
        self.node(node).file
    }

    fn node_range(&self, node: NodeId) -> Range {
        self.node(node).range
    }

    fn node_text(&self, node: NodeId) -> String {
        self.node(node).text.clone()
    }

    fn name_node(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).name
    }

    fn heritage_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node).heritage.clone()
    }

    fn symbol_at(&self, node: NodeId) -> Option<SymbolRef> {
        self.node(node).symbol
    }

    fn type_at(&self, node: NodeId) -> Option<TypeRef> {
        self.node(node).ty
    }

    fn quick_info(&self, node: NodeId) -> Option<String> {
        self.node(node).hover.clone()
    }

    fn symbol_id(&self, symbol: SymbolRef) -> SymbolId {
        SymbolId(self.symbol(symbol).id.clone())
    }

    fn symbol_name(&self, symbol: SymbolRef) -> String {
        self.symbol(symbol).name.clone()
    }

    fn symbol_flags(&self, symbol: SymbolRef) -> SymbolFlags {
        self.symbol(symbol).flags
    }

    fn symbol_declarations(&self, symbol: SymbolRef) -> Vec<NodeId> {
        self.symbol(symbol).declarations.clone()
    }

    fn symbol_parent(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        self.symbol(symbol).parent
    }

    fn symbol_member(&self, symbol: SymbolRef, name: &str) -> Option<SymbolRef> {
        self.symbol(symbol).members.get(name).copied()
    }

    fn symbol_export(&self, symbol: SymbolRef, name: &str) -> Option<SymbolRef> {
        self.symbol(symbol).exports.get(name).copied()
    }

    fn aliased_symbol(&self, symbol: SymbolRef) -> Option<SymbolRef> {
        self.symbol(symbol).alias_target
    }

    fn symbol_scope(&self, symbol: SymbolRef) -> Option<NodeId> {
        self.symbol(symbol).scope
    }

    fn declared_base_types(&self, symbol: SymbolRef) -> Vec<TypeRef> {
        self.symbol(symbol).base_types.clone()
    }

    fn type_symbol(&self, ty: TypeRef) -> Option<SymbolRef> {
        self.ty(ty).symbol
    }

    fn union_or_intersection_parts(&self, ty: TypeRef) -> Option<Vec<TypeRef>> {
        self.ty(ty).parts.clone()
    }

    fn type_property(&self, ty: TypeRef, name: &str) -> Option<SymbolRef> {
        self.ty(ty).properties.get(name).copied()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Incrementally assembles a [`ProgramSnapshot`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: ProgramSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_options(&mut self, options: CompilerOptions) {
        self.snapshot.options = options;
    }

    /// Add a file together with its root node.
    pub fn file(&mut self, path: &str, text: &str) -> FileId {
        let file = FileId(self.snapshot.files.len() as u32);
        let root = NodeId(self.snapshot.nodes.len() as u32);
        let end_line = text.lines().count() as u32;
        self.snapshot.nodes.push(NodeData {
            kind: NodeKind::SourceFile,
            file,
            range: Range::new(Position::new(0, 0), Position::new(end_line, 0)),
            text: String::new(),
            children: Vec::new(),
            name: None,
            symbol: None,
            ty: None,
            heritage: Vec::new(),
            hover: None,
        });
        self.snapshot.files.push(FileData {
            path: PathBuf::from(path),
            text: Some(text.to_string()),
            root,
            declaration_file: false,
            external_library: false,
            outlining_spans: Vec::new(),
            syntactic_diagnostics: Vec::new(),
            semantic_diagnostics: Vec::new(),
        });
        file
    }

    pub fn root(&self, file: FileId) -> NodeId {
        self.snapshot.files[file.0 as usize].root
    }

    /// Add a node as the last child of `parent`.
    pub fn node(
        &mut self,
        file: FileId,
        parent: NodeId,
        kind: NodeKind,
        range: Range,
        text: &str,
    ) -> NodeId {
        let node = NodeId(self.snapshot.nodes.len() as u32);
        self.snapshot.nodes.push(NodeData {
            kind,
            file,
            range,
            text: text.to_string(),
            children: Vec::new(),
            name: None,
            symbol: None,
            ty: None,
            heritage: Vec::new(),
            hover: None,
        });
        self.snapshot.nodes[parent.0 as usize].children.push(node);
        node
    }

    pub fn set_name(&mut self, node: NodeId, name: NodeId) {
        self.snapshot.nodes[node.0 as usize].name = Some(name);
    }

    /// Make the checker answer `symbol` for lookups at `node`.
    pub fn bind(&mut self, node: NodeId, symbol: SymbolRef) {
        self.snapshot.nodes[node.0 as usize].symbol = Some(symbol);
    }

    pub fn set_node_type(&mut self, node: NodeId, ty: TypeRef) {
        self.snapshot.nodes[node.0 as usize].ty = Some(ty);
    }

    pub fn set_hover(&mut self, node: NodeId, text: &str) {
        self.snapshot.nodes[node.0 as usize].hover = Some(text.to_string());
    }

    pub fn set_heritage(&mut self, node: NodeId, heritage: Vec<NodeId>) {
        self.snapshot.nodes[node.0 as usize].heritage = heritage;
    }

    pub fn symbol(&mut self, id: &str, name: &str, flags: SymbolFlags) -> SymbolRef {
        let symbol = SymbolRef(self.snapshot.symbols.len() as u32);
        self.snapshot.symbols.push(SymbolInfo {
            id: id.to_string(),
            name: name.to_string(),
            flags,
            declarations: Vec::new(),
            parent: None,
            members: BTreeMap::new(),
            exports: BTreeMap::new(),
            alias_target: None,
            scope: None,
            base_types: Vec::new(),
        });
        symbol
    }

    /// Register `node` as a declaration of `symbol` and bind the node (and
    /// its name node, if set) to it.
    pub fn declare(&mut self, symbol: SymbolRef, node: NodeId) {
        self.snapshot.symbols[symbol.0 as usize].declarations.push(node);
        self.snapshot.nodes[node.0 as usize].symbol = Some(symbol);
        if let Some(name) = self.snapshot.nodes[node.0 as usize].name {
            self.snapshot.nodes[name.0 as usize].symbol = Some(symbol);
        }
    }

    pub fn set_parent(&mut self, symbol: SymbolRef, parent: SymbolRef) {
        self.snapshot.symbols[symbol.0 as usize].parent = Some(parent);
    }

    pub fn add_member(&mut self, symbol: SymbolRef, name: &str, member: SymbolRef) {
        self.snapshot.symbols[symbol.0 as usize]
            .members
            .insert(name.to_string(), member);
    }

    pub fn add_export(&mut self, symbol: SymbolRef, name: &str, member: SymbolRef) {
        self.snapshot.symbols[symbol.0 as usize]
            .exports
            .insert(name.to_string(), member);
    }

    pub fn set_alias(&mut self, symbol: SymbolRef, target: SymbolRef) {
        self.snapshot.symbols[symbol.0 as usize].alias_target = Some(target);
    }

    pub fn set_scope(&mut self, symbol: SymbolRef, node: NodeId) {
        self.snapshot.symbols[symbol.0 as usize].scope = Some(node);
    }

    pub fn set_base_types(&mut self, symbol: SymbolRef, base_types: Vec<TypeRef>) {
        self.snapshot.symbols[symbol.0 as usize].base_types = base_types;
    }

    pub fn ty(&mut self, symbol: Option<SymbolRef>) -> TypeRef {
        let ty = TypeRef(self.snapshot.types.len() as u32);
        self.snapshot.types.push(TypeInfo {
            symbol,
            parts: None,
            properties: BTreeMap::new(),
        });
        ty
    }

    pub fn union(&mut self, parts: Vec<TypeRef>) -> TypeRef {
        let ty = TypeRef(self.snapshot.types.len() as u32);
        self.snapshot.types.push(TypeInfo {
            symbol: None,
            parts: Some(parts),
            properties: BTreeMap::new(),
        });
        ty
    }

    pub fn set_type_property(&mut self, ty: TypeRef, name: &str, symbol: SymbolRef) {
        self.snapshot.types[ty.0 as usize]
            .properties
            .insert(name.to_string(), symbol);
    }

    pub fn mark_declaration_file(&mut self, file: FileId) {
        self.snapshot.files[file.0 as usize].declaration_file = true;
    }

    pub fn mark_external_library(&mut self, file: FileId) {
        self.snapshot.files[file.0 as usize].external_library = true;
    }

    pub fn add_outlining_span(&mut self, file: FileId, span: OutliningSpan) {
        self.snapshot.files[file.0 as usize].outlining_spans.push(span);
    }

    pub fn add_syntactic_diagnostic(&mut self, file: FileId, diagnostic: RawDiagnostic) {
        self.snapshot.files[file.0 as usize]
            .syntactic_diagnostics
            .push(diagnostic);
    }

    pub fn add_semantic_diagnostic(&mut self, file: FileId, diagnostic: RawDiagnostic) {
        self.snapshot.files[file.0 as usize]
            .semantic_diagnostics
            .push(diagnostic);
    }

    pub fn build(self) -> ProgramSnapshot {
        debug_assert!(self.snapshot.validate().is_ok());
        self.snapshot
    }
}
