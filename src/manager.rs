//! Global registry of project, document, and symbol data.
//!
//! The [`DataManager`] owns every accumulator of the run and the lifecycle
//! that drains them: documents end when their traversal completes, scoped
//! symbols end when their scope node is processed, and everything still live
//! ends at project end: symbols first, then documents, then the project.
//! That three-phase order is load-bearing: partition flushes emit `item`
//! edges that must land inside the begin/end bracket of their document.
//!
//! Registries are tri-state. A missing entry means "never created", a
//! tombstone means "created and already drained"; touching a tombstone is a
//! programming error and panics.

use crate::emit::GraphWriter;
use crate::protocol::{
    DefinitionTag, EventScope, Id, ItemProperty, RangeBasedDocumentSymbol, RangeTag, ReferenceTag,
};
use crate::resolver::ResolverKind;
use crate::semantic::{LanguageService, NodeKind};
use crate::symbol_data::{
    DefinitionInfo, SymbolContext, SymbolData, SymbolIndex, SymbolStore, SymbolVariant,
};
use crate::symbols::Symbols;
use crate::types::{DependentProject, FileId, NodeId, ProjectInfo, SymbolId, SymbolRef};
use anyhow::{Result, anyhow};
use lsp_types::{
    Diagnostic, FoldingRange, Hover, HoverContents, MarkupContent, MarkupKind, MonikerKind, Range,
    SymbolKind, Url,
};
use std::collections::HashMap;
use std::path::Path;

/// Documents are linked to the project in batches to bound emission latency.
const CONTAINS_BATCH_SIZE: usize = 32;

// ============================================================================
// Project data
// ============================================================================

/// The project vertex plus the buffer of pending `contains` document links.
struct ProjectData {
    project: Id,
    pending_documents: Vec<Id>,
}

impl ProjectData {
    fn new(project: Id) -> Self {
        Self {
            project,
            pending_documents: Vec::new(),
        }
    }

    fn add_document(&mut self, writer: &mut GraphWriter<'_>, document: Id) -> Result<()> {
        self.pending_documents.push(document);
        if self.pending_documents.len() >= CONTAINS_BATCH_SIZE {
            self.flush(writer)?;
        }
        Ok(())
    }

    fn flush(&mut self, writer: &mut GraphWriter<'_>) -> Result<()> {
        if self.pending_documents.is_empty() {
            return Ok(());
        }
        let documents = std::mem::take(&mut self.pending_documents);
        writer.contains(self.project, documents)?;
        Ok(())
    }
}

// ============================================================================
// Document data
// ============================================================================

/// Accumulator for one document: ranges plus the document-scoped results.
pub struct DocumentData {
    document: Id,
    /// Path used for cross-project identity, when the file has one.
    moniker_path: Option<String>,
    /// True when the file comes from a third-party package or another
    /// project's build output.
    external_library: bool,
    ranges: Vec<Id>,
    diagnostics: Vec<Diagnostic>,
    folding_ranges: Vec<FoldingRange>,
    document_symbols: Vec<RangeBasedDocumentSymbol>,
}

impl DocumentData {
    fn new(document: Id, moniker_path: Option<String>, external_library: bool) -> Self {
        Self {
            document,
            moniker_path,
            external_library,
            ranges: Vec::new(),
            diagnostics: Vec::new(),
            folding_ranges: Vec::new(),
            document_symbols: Vec::new(),
        }
    }

    pub fn document(&self) -> Id {
        self.document
    }

    pub fn moniker_path(&self) -> Option<&str> {
        self.moniker_path.as_deref()
    }

    pub fn is_external_library(&self) -> bool {
        self.external_library
    }

    fn add_range(&mut self, range: Id) {
        self.ranges.push(range);
    }

    /// Emit the accumulated contribution. The ranges `contains` edge is
    /// guarded: documents without ranges emit none.
    fn end(self, writer: &mut GraphWriter<'_>) -> Result<()> {
        if !self.ranges.is_empty() {
            writer.contains(self.document, self.ranges)?;
        }
        if !self.diagnostics.is_empty() {
            let result = writer.diagnostic_result(self.diagnostics)?;
            writer.diagnostic_edge(self.document, result)?;
        }
        if !self.folding_ranges.is_empty() {
            let result = writer.folding_range_result(self.folding_ranges)?;
            writer.folding_range_edge(self.document, result)?;
        }
        if !self.document_symbols.is_empty() {
            let result = writer.document_symbol_result(self.document_symbols)?;
            writer.document_symbol_edge(self.document, result)?;
        }
        Ok(())
    }
}

enum DocumentSlot {
    Live(DocumentData),
    Processed,
}

enum SymbolSlot {
    Live(SymbolIndex),
    Cleared,
}

// ============================================================================
// Data manager
// ============================================================================

/// Capability handed to symbol datas: document lookup and lifecycle
/// registration, nothing more.
struct ManagerContext<'m> {
    service: &'m dyn LanguageService,
    documents: &'m HashMap<FileId, DocumentSlot>,
    clear_on_node: &'m mut HashMap<NodeId, Vec<SymbolIndex>>,
}

impl SymbolContext for ManagerContext<'_> {
    fn document_id(&self, file: FileId) -> Option<Id> {
        match self.documents.get(&file) {
            Some(DocumentSlot::Live(data)) => Some(data.document()),
            _ => None,
        }
    }

    fn source_file_root(&self, file: FileId) -> NodeId {
        self.service.root_node(file)
    }

    fn manage_lifecycle(&mut self, node: NodeId, symbol: SymbolIndex) {
        self.clear_on_node.entry(node).or_default().push(symbol);
    }
}

/// Counters reported when the run finishes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerStats {
    pub documents: u32,
    pub symbols: u32,
}

pub struct DataManager<'a> {
    service: &'a dyn LanguageService,
    project_info: ProjectInfo,
    dependents: Vec<DependentProject>,
    project_data: ProjectData,
    store: SymbolStore,
    documents: HashMap<FileId, DocumentSlot>,
    symbols: HashMap<SymbolId, SymbolSlot>,
    clear_on_node: HashMap<NodeId, Vec<SymbolIndex>>,
    stats: ManagerStats,
}

impl<'a> DataManager<'a> {
    /// Emits the project vertex and its begin event.
    pub fn begin(
        service: &'a dyn LanguageService,
        writer: &mut GraphWriter<'_>,
        project_info: ProjectInfo,
        dependents: Vec<DependentProject>,
    ) -> Result<Self> {
        let resource = Url::from_file_path(&project_info.root_dir).ok();
        let project = writer.project("typescript", resource)?;
        writer.begin_event(EventScope::Project, project)?;
        Ok(Self {
            service,
            project_info,
            dependents,
            project_data: ProjectData::new(project),
            store: SymbolStore::new(),
            documents: HashMap::new(),
            symbols: HashMap::new(),
            clear_on_node: HashMap::new(),
            stats: ManagerStats::default(),
        })
    }

    pub fn stats(&self) -> ManagerStats {
        self.stats
    }

    fn with_symbol<R>(
        &mut self,
        writer: &mut GraphWriter<'_>,
        index: SymbolIndex,
        f: impl FnOnce(
            &mut SymbolData,
            &mut GraphWriter<'_>,
            &SymbolStore,
            &mut ManagerContext<'_>,
        ) -> R,
    ) -> R {
        let Self {
            service,
            store,
            documents,
            clear_on_node,
            ..
        } = self;
        let store: &SymbolStore = store;
        let mut ctx = ManagerContext {
            service: *service,
            documents,
            clear_on_node,
        };
        let mut data = store.get(index).borrow_mut();
        f(&mut data, writer, store, &mut ctx)
    }

    // ------------------------------------------------------------------
    // Documents
    // ------------------------------------------------------------------

    /// Document vertex id for the file, creating the document data (and its
    /// begin event) on first use.
    pub fn get_or_create_document_data(
        &mut self,
        writer: &mut GraphWriter<'_>,
        file: FileId,
    ) -> Result<Id> {
        match self.documents.get(&file) {
            Some(DocumentSlot::Live(data)) => return Ok(data.document()),
            Some(DocumentSlot::Processed) => panic!(
                "document data for {} has already been processed",
                self.service.file_path(file).display()
            ),
            None => {}
        }

        let path = self.service.file_path(file);
        let uri = Url::from_file_path(path)
            .map_err(|()| anyhow!("cannot build a file URI from {}", path.display()))?;
        let contents = self.service.file_text(file).map(str::to_string);
        let document = writer.document(uri, language_id(path), contents)?;
        writer.begin_event(EventScope::Document, document)?;

        let (moniker_path, external_library) = self.moniker_path_for(file);
        self.documents.insert(
            file,
            DocumentSlot::Live(DocumentData::new(document, moniker_path, external_library)),
        );
        self.stats.documents += 1;
        Ok(document)
    }

    /// Cross-project identity path of a file: relative to the project root
    /// for own sources, relative to a dependent project's out directory for
    /// consumed build output, absent otherwise.
    fn moniker_path_for(&self, file: FileId) -> (Option<String>, bool) {
        let path = self.service.file_path(file);
        let external = self.service.is_external_library(file);
        if let Ok(relative) = path.strip_prefix(&self.project_info.root_dir) {
            return (Some(strip_known_extension(relative)), external);
        }
        for dependent in &self.dependents {
            if let Ok(relative) = path.strip_prefix(&dependent.out_dir) {
                return (Some(strip_known_extension(relative)), true);
            }
        }
        (None, external)
    }

    /// End of a traversed document: drain it, bracket it, and queue its
    /// project link.
    pub fn document_processed(
        &mut self,
        writer: &mut GraphWriter<'_>,
        file: FileId,
        diagnostics: Vec<Diagnostic>,
        folding_ranges: Vec<FoldingRange>,
        document_symbols: Vec<RangeBasedDocumentSymbol>,
    ) -> Result<()> {
        let slot = self.documents.get_mut(&file).unwrap_or_else(|| {
            panic!(
                "document {} was processed without document data",
                self.service.file_path(file).display()
            )
        });
        let mut data = match std::mem::replace(slot, DocumentSlot::Processed) {
            DocumentSlot::Live(data) => data,
            DocumentSlot::Processed => panic!(
                "document {} has already been processed",
                self.service.file_path(file).display()
            ),
        };
        data.diagnostics = diagnostics;
        data.folding_ranges = folding_ranges;
        data.document_symbols = document_symbols;
        let document = data.document();
        data.end(writer)?;
        writer.end_event(EventScope::Document, document)?;
        self.project_data.add_document(writer, document)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Symbols
    // ------------------------------------------------------------------

    /// Symbol data for a raw symbol, creating it through the matching
    /// resolver strategy on first lookup.
    ///
    /// Creation emits the result set, runs variant begin work, attaches the
    /// moniker, and records a definition for every declaration the strategy
    /// reports, including declarations in files the visitor never walks.
    pub fn get_or_create_symbol_data(
        &mut self,
        writer: &mut GraphWriter<'_>,
        symbols: &mut Symbols<'_>,
        symbol: SymbolRef,
        location: Option<NodeId>,
    ) -> Result<SymbolIndex> {
        let id = self.service.symbol_id(symbol);
        match self.symbols.get(&id) {
            Some(SymbolSlot::Live(index)) => return Ok(*index),
            Some(SymbolSlot::Cleared) => panic!("symbol {id} has been cleared"),
            None => {}
        }

        let kind = ResolverKind::select(self.service.symbol_flags(symbol));
        let files = kind.source_files(self.service, symbol, location);
        if kind.requires_source_file() && files.is_empty() {
            panic!("symbol {id} requires a source file but none was found");
        }

        let variant = self.resolve_variant(writer, symbols, symbol, location, kind, &files)?;
        for file in &files {
            self.get_or_create_document_data(writer, *file)?;
        }

        let scope = self.service.symbol_scope(symbol);
        let index = self.store.next_index();
        let data = SymbolData::new(writer, id.clone(), index, scope, variant)?;
        self.store.insert(data);
        self.symbols.insert(id, SymbolSlot::Live(index));
        self.stats.symbols += 1;

        self.with_symbol(writer, index, |data, writer, store, ctx| {
            data.begin(writer, store, ctx)
        })?;
        self.attach_moniker(writer, symbols, index, symbol, &files)?;
        self.record_declarations(writer, index, symbol, kind, location)?;
        Ok(index)
    }

    fn resolve_variant(
        &mut self,
        writer: &mut GraphWriter<'_>,
        symbols: &mut Symbols<'_>,
        symbol: SymbolRef,
        location: Option<NodeId>,
        kind: ResolverKind,
        files: &[FileId],
    ) -> Result<SymbolVariant> {
        match kind {
            ResolverKind::Standard => Ok(SymbolVariant::Standard),
            ResolverKind::TypeAlias => match self.service.aliased_symbol(symbol) {
                Some(target_symbol) => {
                    let target =
                        self.get_or_create_symbol_data(writer, symbols, target_symbol, location)?;
                    let rename =
                        self.service.symbol_name(symbol) != self.service.symbol_name(target_symbol);
                    Ok(SymbolVariant::Aliased { target, rename })
                }
                None => Ok(SymbolVariant::Standard),
            },
            ResolverKind::Method => {
                let partition_file = ResolverKind::partition_scope(files);
                let name = self.service.symbol_name(symbol);
                let members = match self.service.symbol_parent(symbol) {
                    Some(parent) => symbols.find_base_members(parent, &name),
                    None => None,
                };
                let bases = match members {
                    Some(members) => {
                        let mut indices = Vec::with_capacity(members.len());
                        for member in members {
                            indices.push(
                                self.get_or_create_symbol_data(writer, symbols, member, location)?,
                            );
                        }
                        Some(indices)
                    }
                    None => None,
                };
                Ok(SymbolVariant::Method {
                    bases,
                    partition_file,
                })
            }
            ResolverKind::Transient => {
                let location = location.unwrap_or_else(|| {
                    panic!(
                        "transient symbol {} looked up without a location",
                        self.service.symbol_id(symbol)
                    )
                });
                let partition_file = ResolverKind::partition_scope(files);
                let name = self.service.symbol_name(symbol);
                let elements: Vec<SymbolRef> = self
                    .service
                    .type_at(location)
                    .and_then(|ty| self.service.union_or_intersection_parts(ty))
                    .map(|parts| {
                        parts
                            .into_iter()
                            .filter_map(|part| self.service.type_property(part, &name))
                            .collect()
                    })
                    .unwrap_or_default();
                if elements.is_empty() {
                    return Ok(SymbolVariant::Standard);
                }
                let mut indices = Vec::with_capacity(elements.len());
                for element in elements {
                    indices
                        .push(self.get_or_create_symbol_data(writer, symbols, element, None)?);
                }
                Ok(SymbolVariant::UnionOrIntersection {
                    elements: indices,
                    partition_file,
                })
            }
        }
    }

    /// Intersect the moniker paths of the declaring documents; agreement
    /// yields the path, disagreement or any path-less document yields no
    /// moniker. The identifier needs an export path as well.
    fn attach_moniker(
        &mut self,
        writer: &mut GraphWriter<'_>,
        symbols: &mut Symbols<'_>,
        index: SymbolIndex,
        symbol: SymbolRef,
        files: &[FileId],
    ) -> Result<()> {
        if files.is_empty() {
            return Ok(());
        }
        let mut moniker_path: Option<String> = None;
        let mut external = false;
        for file in files {
            let Some(DocumentSlot::Live(data)) = self.documents.get(file) else {
                return Ok(());
            };
            match data.moniker_path() {
                Some(path) => match &moniker_path {
                    Some(existing) if existing != path => return Ok(()),
                    Some(_) => {}
                    None => moniker_path = Some(path.to_string()),
                },
                None => return Ok(()),
            }
            external |= data.is_external_library();
        }
        let Some(path) = moniker_path else {
            return Ok(());
        };
        let Some(export_path) = symbols.export_path(symbol) else {
            return Ok(());
        };
        let identifier = if export_path.is_empty() {
            path
        } else {
            format!("{path}.{export_path}")
        };
        let kind = if external {
            MonikerKind::Import
        } else {
            MonikerKind::Export
        };
        self.with_symbol(writer, index, |data, writer, _, _| {
            data.add_moniker(writer, kind, identifier)
        })
    }

    fn record_declarations(
        &mut self,
        writer: &mut GraphWriter<'_>,
        index: SymbolIndex,
        symbol: SymbolRef,
        kind: ResolverKind,
        location: Option<NodeId>,
    ) -> Result<()> {
        for declaration in kind.declaration_nodes(self.service, symbol, location) {
            let Some(name_node) = identifier_of(self.service, declaration) else {
                continue;
            };
            self.record_definition(writer, index, declaration, name_node)?;
            if let Some(contents) = self.service.quick_info(name_node) {
                let hover = Hover {
                    contents: HoverContents::Markup(MarkupContent {
                        kind: MarkupKind::Markdown,
                        value: contents,
                    }),
                    range: None,
                };
                self.with_symbol(writer, index, |data, writer, _, _| {
                    data.add_hover(writer, hover)
                })?;
            }
        }
        Ok(())
    }

    /// Emit a definition-tagged range at the declaration's name node, attach
    /// it to its document, and file it with the symbol.
    pub fn record_definition(
        &mut self,
        writer: &mut GraphWriter<'_>,
        index: SymbolIndex,
        declaration: NodeId,
        name_node: NodeId,
    ) -> Result<Id> {
        let file = self.service.node_file(declaration);
        let name_range = self.service.node_range(name_node);
        let tag = RangeTag::Definition(DefinitionTag {
            text: self.service.node_text(name_node),
            kind: lsp_symbol_kind(self.service.node_kind(declaration)),
            full_range: self.service.node_range(declaration),
        });
        let range_id = writer.range(name_range, Some(tag))?;
        match self.documents.get_mut(&file) {
            Some(DocumentSlot::Live(data)) => data.add_range(range_id),
            _ => panic!(
                "no live document data for {} while recording a definition",
                self.service.file_path(file).display()
            ),
        }
        self.with_symbol(writer, index, |data, writer, store, ctx| {
            data.add_definition(writer, store, ctx, file, range_id, name_range)?;
            data.record_definition_info(DefinitionInfo {
                file,
                range: name_range,
            });
            Ok::<_, anyhow::Error>(())
        })?;
        Ok(range_id)
    }

    /// Emit a reference-tagged range, attach it to its document, and route it
    /// through the symbol's variant.
    pub fn record_reference(
        &mut self,
        writer: &mut GraphWriter<'_>,
        index: SymbolIndex,
        file: FileId,
        range: Range,
        text: String,
    ) -> Result<()> {
        let tag = RangeTag::Reference(ReferenceTag { text });
        let range_id = writer.range(range, Some(tag))?;
        match self.documents.get_mut(&file) {
            Some(DocumentSlot::Live(data)) => data.add_range(range_id),
            _ => panic!(
                "no live document data for {} while recording a reference",
                self.service.file_path(file).display()
            ),
        }
        self.with_symbol(writer, index, |data, writer, store, ctx| {
            data.add_reference(
                writer,
                store,
                ctx,
                file,
                range_id,
                ItemProperty::References,
            )
        })
    }

    pub fn has_definition_info(&self, index: SymbolIndex, file: FileId, range: &Range) -> bool {
        self.store
            .get(index)
            .borrow()
            .has_definition_info(file, range)
    }

    pub fn find_definition(&self, index: SymbolIndex, file: FileId, range: &Range) -> Option<Id> {
        self.store
            .get(index)
            .borrow()
            .find_definition(&self.store, file, range)
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Consult every symbol registered on this node. Exhausted symbols are
    /// tombstoned.
    pub fn node_processed(&mut self, writer: &mut GraphWriter<'_>, node: NodeId) -> Result<()> {
        let Some(indices) = self.clear_on_node.remove(&node) else {
            return Ok(());
        };
        let source_file = (self.service.node_kind(node) == NodeKind::SourceFile)
            .then(|| self.service.node_file(node));
        for index in indices {
            let exhausted = self.with_symbol(writer, index, |data, writer, _, _| {
                data.node_processed(writer, node, source_file)
            })?;
            if exhausted {
                let id = self.store.get(index).borrow().symbol_id().clone();
                self.symbols.insert(id, SymbolSlot::Cleared);
            }
        }
        Ok(())
    }

    /// Project end: flush still-live symbols, then still-live documents,
    /// then the project.
    pub fn project_processed(&mut self, writer: &mut GraphWriter<'_>) -> Result<()> {
        let mut live_symbols: Vec<SymbolIndex> = self
            .symbols
            .values()
            .filter_map(|slot| match slot {
                SymbolSlot::Live(index) => Some(*index),
                SymbolSlot::Cleared => None,
            })
            .collect();
        live_symbols.sort_by_key(|index| index.0);
        for index in live_symbols {
            self.with_symbol(writer, index, |data, writer, _, _| data.end(writer))?;
            let id = self.store.get(index).borrow().symbol_id().clone();
            self.symbols.insert(id, SymbolSlot::Cleared);
        }

        let mut live_documents: Vec<FileId> = self
            .documents
            .iter()
            .filter_map(|(file, slot)| match slot {
                DocumentSlot::Live(_) => Some(*file),
                DocumentSlot::Processed => None,
            })
            .collect();
        live_documents.sort_by_key(|file| file.0);
        for file in live_documents {
            let slot = self.documents.get_mut(&file).unwrap_or_else(|| {
                unreachable!("live document {} disappeared", file.0)
            });
            let data = match std::mem::replace(slot, DocumentSlot::Processed) {
                DocumentSlot::Live(data) => data,
                DocumentSlot::Processed => unreachable!(),
            };
            let document = data.document();
            data.end(writer)?;
            writer.end_event(EventScope::Document, document)?;
            self.project_data.add_document(writer, document)?;
        }

        self.project_data.flush(writer)?;
        writer.end_event(EventScope::Project, self.project_data.project)?;
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// The identifier that names a declaration. Identifier nodes name
/// themselves; everything else defers to its name child.
pub(crate) fn identifier_of(service: &dyn LanguageService, node: NodeId) -> Option<NodeId> {
    if service.node_kind(node) == NodeKind::Identifier {
        Some(node)
    } else {
        service.name_node(node)
    }
}

pub(crate) fn lsp_symbol_kind(kind: NodeKind) -> SymbolKind {
    match kind {
        NodeKind::SourceFile | NodeKind::ModuleDeclaration => SymbolKind::MODULE,
        NodeKind::ClassDeclaration | NodeKind::ClassExpression => SymbolKind::CLASS,
        NodeKind::InterfaceDeclaration => SymbolKind::INTERFACE,
        NodeKind::MethodDeclaration | NodeKind::MethodSignature => SymbolKind::METHOD,
        NodeKind::FunctionDeclaration => SymbolKind::FUNCTION,
        NodeKind::TypeParameterDeclaration => SymbolKind::TYPE_PARAMETER,
        NodeKind::ParameterDeclaration
        | NodeKind::Identifier
        | NodeKind::Block
        | NodeKind::Other => SymbolKind::VARIABLE,
    }
}

fn language_id(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "jsx" | "mjs" | "cjs") => "javascript",
        _ => "typescript",
    }
}

/// Moniker paths drop the compiled extension so a source and its declaration
/// file agree on identity.
fn strip_known_extension(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    for extension in [".d.ts", ".tsx", ".ts", ".jsx", ".js"] {
        if let Some(stripped) = text.strip_suffix(extension) {
            return stripped.to_string();
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moniker_paths_drop_compiled_extensions() {
        assert_eq!(strip_known_extension(Path::new("src/a.ts")), "src/a");
        assert_eq!(strip_known_extension(Path::new("lib/a.d.ts")), "lib/a");
        assert_eq!(strip_known_extension(Path::new("src/view.tsx")), "src/view");
        assert_eq!(strip_known_extension(Path::new("README.md")), "README.md");
    }

    #[test]
    fn language_id_follows_extension() {
        assert_eq!(language_id(Path::new("/p/a.ts")), "typescript");
        assert_eq!(language_id(Path::new("/p/a.js")), "javascript");
        assert_eq!(language_id(Path::new("/p/a.d.ts")), "typescript");
    }
}
