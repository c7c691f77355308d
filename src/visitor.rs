//! The indexing driver.
//!
//! Walks the syntax tree of every source file depth-first, creating document
//! and symbol data on demand, recording definitions at declaration names and
//! references at identifier occurrences, and emitting the document-scoped
//! results (diagnostics, folding ranges, document symbols) when a file ends.
//!
//! [`index_program`] is the crate's entry point: it resolves the project's
//! root/out directories, emits the metadata vertex, and drives one visitor
//! over the whole program.

use crate::emit::{Emitter, GraphWriter};
use crate::manager::{DataManager, identifier_of};
use crate::protocol::{Id, RangeBasedDocumentSymbol};
use crate::semantic::{
    DiagnosticLevel, LanguageService, NodeKind, OutliningSpan, OutliningSpanKind, RawDiagnostic,
};
use crate::symbols::Symbols;
use crate::types::{DependentProject, FileId, IndexerOptions, NodeId, ProjectInfo};
use anyhow::{Result, anyhow};
use lsp_types::{
    Diagnostic, DiagnosticSeverity, FoldingRange, FoldingRangeKind, NumberOrString, Position,
    Range, Url,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Index a compiled program into an LSIF stream.
///
/// Returns the resolved root and out directory of the visited project.
pub fn index_program(
    service: &dyn LanguageService,
    options: &IndexerOptions,
    dependents: &[DependentProject],
    emitter: &mut dyn Emitter,
) -> Result<ProjectInfo> {
    tracing::info!(root = %options.project_root.display(), "Indexing project");

    let project_info = resolve_project_info(service, options);
    let dependents = resolve_dependents(options, dependents);

    let mut writer = GraphWriter::new(emitter, !options.no_contents);
    let root_uri = Url::from_directory_path(&options.project_root).map_err(|()| {
        anyhow!(
            "project root {} is not an absolute directory path",
            options.project_root.display()
        )
    })?;
    writer.meta_data(root_uri, crate::TOOL_NAME, crate::TOOL_VERSION)?;

    let manager = DataManager::begin(service, &mut writer, project_info.clone(), dependents)?;
    let mut visitor = Visitor {
        service,
        symbols: Symbols::new(service),
        manager,
        writer,
        symbol_stack: Vec::new(),
        current_file: None,
    };
    visitor.visit_program()?;

    Ok(project_info)
}

/// One level of the document-symbol tree under construction. The root frame
/// of a file has no range of its own.
struct DocumentSymbolFrame {
    id: Option<Id>,
    children: Vec<RangeBasedDocumentSymbol>,
}

struct Visitor<'a, 'e> {
    service: &'a dyn LanguageService,
    symbols: Symbols<'a>,
    manager: DataManager<'a>,
    writer: GraphWriter<'e>,
    symbol_stack: Vec<DocumentSymbolFrame>,
    current_file: Option<FileId>,
}

impl Visitor<'_, '_> {
    fn visit_program(&mut self) -> Result<()> {
        for file in self.service.source_files() {
            let path = self.service.file_path(file);
            if skip_source_file(path, self.service.is_declaration_file(file)) {
                tracing::debug!(path = %path.display(), "skipping file");
                continue;
            }
            self.visit_source_file(file)?;
        }
        self.manager.project_processed(&mut self.writer)?;

        let stats = self.manager.stats();
        tracing::info!(
            documents = stats.documents,
            symbols = stats.symbols,
            "Indexing complete"
        );
        Ok(())
    }

    fn visit_source_file(&mut self, file: FileId) -> Result<()> {
        let root = self.service.root_node(file);
        tracing::debug!(path = %self.service.file_path(file).display(), "indexing file");

        self.manager
            .get_or_create_document_data(&mut self.writer, file)?;
        self.current_file = Some(file);
        self.symbol_stack.push(DocumentSymbolFrame {
            id: None,
            children: Vec::new(),
        });

        for child in self.service.node_children(root) {
            self.visit(child)?;
        }

        // Flush the per-file shards of unscoped symbols before the document
        // results go out.
        self.manager.node_processed(&mut self.writer, root)?;

        let diagnostics = self.collect_diagnostics(file);
        let folding_ranges = self.collect_folding_ranges(file);
        let frame = self
            .symbol_stack
            .pop()
            .expect("document symbol stack is empty at file end");
        if !self.symbol_stack.is_empty() {
            panic!(
                "document symbol stack is unbalanced at end of {}",
                self.service.file_path(file).display()
            );
        }
        self.manager.document_processed(
            &mut self.writer,
            file,
            diagnostics,
            folding_ranges,
            frame.children,
        )?;
        self.current_file = None;
        Ok(())
    }

    fn visit(&mut self, node: NodeId) -> Result<()> {
        match self.service.node_kind(node) {
            NodeKind::ModuleDeclaration
            | NodeKind::ClassDeclaration
            | NodeKind::InterfaceDeclaration
            | NodeKind::MethodDeclaration
            | NodeKind::MethodSignature
            | NodeKind::FunctionDeclaration => self.visit_declaration(node, true),
            NodeKind::ParameterDeclaration | NodeKind::TypeParameterDeclaration => {
                self.visit_declaration(node, false)
            }
            // Suspected bug: class expressions take the identifier path and
            // are never descended into, which produces nothing for most of
            // them. Kept because existing dump shapes depend on it.
            NodeKind::ClassExpression | NodeKind::Identifier => self.visit_identifier(node),
            NodeKind::SourceFile | NodeKind::Block | NodeKind::Other => self.visit_generic(node),
        }
    }

    fn visit_generic(&mut self, node: NodeId) -> Result<()> {
        for child in self.service.node_children(node) {
            self.visit(child)?;
        }
        self.manager.node_processed(&mut self.writer, node)
    }

    fn visit_declaration(&mut self, node: NodeId, container: bool) -> Result<()> {
        let file = self
            .current_file
            .expect("declaration visited outside a source file");

        let mut declared: Option<Id> = None;
        if let Some(symbol) = self.service.symbol_at(node) {
            let index = self.manager.get_or_create_symbol_data(
                &mut self.writer,
                &mut self.symbols,
                symbol,
                Some(node),
            )?;
            if let Some(name_node) = identifier_of(self.service, node) {
                let name_range = self.service.node_range(name_node);
                declared = Some(match self.manager.find_definition(index, file, &name_range) {
                    Some(existing) => existing,
                    None => {
                        self.manager
                            .record_definition(&mut self.writer, index, node, name_node)?
                    }
                });
            }
        }

        match declared {
            Some(id) if container => {
                self.symbol_stack.push(DocumentSymbolFrame {
                    id: Some(id),
                    children: Vec::new(),
                });
                for child in self.service.node_children(node) {
                    self.visit(child)?;
                }
                let frame = self
                    .symbol_stack
                    .pop()
                    .expect("document symbol stack is empty at declaration end");
                let parent = self
                    .symbol_stack
                    .last_mut()
                    .expect("document symbol stack is unbalanced at declaration end");
                parent.children.push(RangeBasedDocumentSymbol {
                    id: frame.id.expect("container frame lost its range"),
                    children: frame.children,
                });
            }
            Some(id) => {
                let parent = self
                    .symbol_stack
                    .last_mut()
                    .expect("document symbol stack is empty at declaration");
                parent.children.push(RangeBasedDocumentSymbol {
                    id,
                    children: Vec::new(),
                });
                for child in self.service.node_children(node) {
                    self.visit(child)?;
                }
            }
            None => {
                for child in self.service.node_children(node) {
                    self.visit(child)?;
                }
            }
        }

        self.manager.node_processed(&mut self.writer, node)
    }

    fn visit_identifier(&mut self, node: NodeId) -> Result<()> {
        let Some(symbol) = self.service.symbol_at(node) else {
            return Ok(());
        };
        let file = self
            .current_file
            .expect("identifier visited outside a source file");
        let range = self.service.node_range(node);
        let index = self.manager.get_or_create_symbol_data(
            &mut self.writer,
            &mut self.symbols,
            symbol,
            Some(node),
        )?;
        // References sitting on a declaration name are folded into the
        // definition record.
        if self.manager.has_definition_info(index, file, &range) {
            return Ok(());
        }
        let text = self.service.node_text(node);
        self.manager
            .record_reference(&mut self.writer, index, file, range, text)
    }

    // ------------------------------------------------------------------
    // Document-scoped results
    // ------------------------------------------------------------------

    fn collect_diagnostics(&self, file: FileId) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for raw in self.service.syntactic_diagnostics(file) {
            out.push(convert_diagnostic(raw));
        }
        for raw in self.service.semantic_diagnostics(file) {
            // Semantic diagnostics without a resolvable location are dropped.
            if raw.range.is_some() {
                out.push(convert_diagnostic(raw));
            }
        }
        out
    }

    fn collect_folding_ranges(&self, file: FileId) -> Vec<FoldingRange> {
        self.service
            .outlining_spans(file)
            .into_iter()
            .map(folding_range)
            .collect()
    }
}

// ============================================================================
// Conversions
// ============================================================================

fn convert_diagnostic(raw: RawDiagnostic) -> Diagnostic {
    Diagnostic {
        range: raw
            .range
            .unwrap_or_else(|| Range::new(Position::new(0, 0), Position::new(0, 0))),
        severity: Some(match raw.severity {
            DiagnosticLevel::Error => DiagnosticSeverity::ERROR,
            DiagnosticLevel::Warning => DiagnosticSeverity::WARNING,
            DiagnosticLevel::Suggestion => DiagnosticSeverity::HINT,
            DiagnosticLevel::Message => DiagnosticSeverity::INFORMATION,
        }),
        code: raw.code.map(NumberOrString::Number),
        message: raw.message,
        ..Default::default()
    }
}

fn folding_range(span: OutliningSpan) -> FoldingRange {
    FoldingRange {
        start_line: span.range.start.line,
        start_character: Some(span.range.start.character),
        end_line: span.range.end.line,
        end_character: Some(span.range.end.character),
        kind: match span.kind {
            OutliningSpanKind::Comment => Some(FoldingRangeKind::Comment),
            OutliningSpanKind::Imports => Some(FoldingRangeKind::Imports),
            OutliningSpanKind::Region => Some(FoldingRangeKind::Region),
            OutliningSpanKind::Code => None,
        },
        collapsed_text: None,
    }
}

/// Declaration files never drive traversal, and JavaScript files pulled out
/// of a `node_modules` tree are skipped unless they are a literal `index.js`.
fn skip_source_file(path: &Path, declaration_file: bool) -> bool {
    if declaration_file {
        return true;
    }
    if path.extension() != Some(OsStr::new("js")) {
        return false;
    }
    if path.file_name() == Some(OsStr::new("index.js")) {
        return false;
    }
    path.components()
        .any(|component| component.as_os_str() == OsStr::new("node_modules"))
}

// ============================================================================
// Project resolution
// ============================================================================

/// Resolve the project's root and out directories from compiler options,
/// falling back to the common directory prefix of the input files when
/// `rootDir` is not configured.
fn resolve_project_info(service: &dyn LanguageService, options: &IndexerOptions) -> ProjectInfo {
    let compiler_options = service.compiler_options();
    let base = options
        .config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| options.project_root.clone());

    let root_dir = match compiler_options.root_dir {
        Some(dir) => resolve_dir(&base, dir),
        None => common_source_prefix(service).unwrap_or_else(|| options.project_root.clone()),
    };
    let out_dir = match compiler_options.out_dir {
        Some(dir) => resolve_dir(&base, dir),
        None => root_dir.clone(),
    };
    ProjectInfo { root_dir, out_dir }
}

fn resolve_dependents(
    options: &IndexerOptions,
    dependents: &[DependentProject],
) -> Vec<DependentProject> {
    let base = options
        .config_file
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| options.project_root.clone());
    dependents
        .iter()
        .map(|dependent| DependentProject {
            root_dir: resolve_dir(&base, dependent.root_dir.clone()),
            out_dir: resolve_dir(&base, dependent.out_dir.clone()),
        })
        .collect()
}

fn resolve_dir(base: &Path, dir: PathBuf) -> PathBuf {
    if dir.is_absolute() { dir } else { base.join(dir) }
}

fn common_source_prefix(service: &dyn LanguageService) -> Option<PathBuf> {
    let mut prefix: Option<PathBuf> = None;
    for file in service.source_files() {
        if service.is_declaration_file(file) {
            continue;
        }
        let Some(dir) = service.file_path(file).parent() else {
            continue;
        };
        prefix = Some(match prefix {
            None => dir.to_path_buf(),
            Some(current) => common_prefix(&current, dir),
        });
    }
    prefix
}

fn common_prefix(a: &Path, b: &Path) -> PathBuf {
    a.components()
        .zip(b.components())
        .take_while(|(left, right)| left == right)
        .map(|(component, _)| component.as_os_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_files_are_skipped() {
        assert!(skip_source_file(Path::new("/p/lib/a.d.ts"), true));
        assert!(!skip_source_file(Path::new("/p/src/a.ts"), false));
    }

    #[test]
    fn node_modules_javascript_is_skipped_except_index() {
        assert!(skip_source_file(
            Path::new("/p/node_modules/foo/bar.js"),
            false
        ));
        assert!(!skip_source_file(
            Path::new("/p/node_modules/foo/index.js"),
            false
        ));
        assert!(!skip_source_file(Path::new("/p/src/bar.js"), false));
        // only .js participates in the node_modules rule
        assert!(!skip_source_file(
            Path::new("/p/node_modules/foo/bar.ts"),
            false
        ));
    }

    #[test]
    fn common_prefix_stops_at_divergence() {
        assert_eq!(
            common_prefix(Path::new("/p/src/a"), Path::new("/p/src/b")),
            PathBuf::from("/p/src")
        );
        assert_eq!(
            common_prefix(Path::new("/p/src"), Path::new("/q/src")),
            PathBuf::from("/")
        );
    }

    #[test]
    fn code_spans_fold_without_a_kind() {
        let folded = folding_range(OutliningSpan {
            range: Range::new(Position::new(1, 0), Position::new(4, 1)),
            kind: OutliningSpanKind::Code,
        });
        assert_eq!(folded.start_line, 1);
        assert_eq!(folded.end_line, 4);
        assert_eq!(folded.kind, None);
        let comment = folding_range(OutliningSpan {
            range: Range::new(Position::new(0, 0), Position::new(0, 20)),
            kind: OutliningSpanKind::Comment,
        });
        assert_eq!(comment.kind, Some(FoldingRangeKind::Comment));
    }
}
