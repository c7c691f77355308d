//! Emission layer: id generation, record construction, and output sinks.
//!
//! The engine never serializes by hand; it asks the [`GraphWriter`] for a
//! well-formed vertex or edge, which assigns the next id, hands the entry to
//! the configured [`Emitter`], and returns the id. Ids are sequential, so
//! emission order and id order always agree.

use crate::protocol::{
    Document, Edge, EdgeData, EdgeDataMultiIn, Encoding, Entry, Event, EventKind, EventScope, Id,
    Item, ItemProperty, MetaData, Project, RangeBasedDocumentSymbol, RangeTag, ToolInfo, Vertex,
};
use anyhow::{Context, Result};
use lsp_types::{Diagnostic, FoldingRange, Hover, Moniker, MonikerKind, Range, UniquenessLevel, Url};
use std::io::Write;

/// Moniker scheme shared by all dumps of this tool family.
pub const MONIKER_SCHEME: &str = "tsc";

/// Sink for the linearized vertex/edge stream.
///
/// Emission is synchronous; implementations may buffer internally but must
/// preserve order.
pub trait Emitter {
    fn emit(&mut self, entry: &Entry) -> Result<()>;
}

/// Writes one JSON object per line.
pub struct JsonLineEmitter<W: Write> {
    out: W,
}

impl<W: Write> JsonLineEmitter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Flush the underlying writer and hand it back.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().context("Failed to flush LSIF output")?;
        Ok(self.out)
    }
}

impl<W: Write> Emitter for JsonLineEmitter<W> {
    fn emit(&mut self, entry: &Entry) -> Result<()> {
        serde_json::to_writer(&mut self.out, entry)
            .with_context(|| format!("Failed to serialize LSIF entry {}", entry.id))?;
        self.out
            .write_all(b"\n")
            .context("Failed to write LSIF output")?;
        Ok(())
    }
}

/// Captures the stream in memory. Used by tests and by consumers that
/// post-process the graph before writing it out.
#[derive(Debug, Default)]
pub struct MemoryEmitter {
    entries: Vec<Entry>,
}

impl MemoryEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

impl Emitter for MemoryEmitter {
    fn emit(&mut self, entry: &Entry) -> Result<()> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

/// Sequential id factory. Any total order satisfies the protocol; sequential
/// integers also make dumps diffable.
#[derive(Debug)]
struct IdFactory {
    next: Id,
}

impl IdFactory {
    fn new() -> Self {
        Self { next: 1 }
    }

    fn next(&mut self) -> Id {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Constructs well-formed records and pushes them to the emitter.
pub struct GraphWriter<'e> {
    ids: IdFactory,
    emitter: &'e mut dyn Emitter,
    emit_source: bool,
}

impl<'e> GraphWriter<'e> {
    /// `emit_source` controls whether document vertices embed file contents.
    pub fn new(emitter: &'e mut dyn Emitter, emit_source: bool) -> Self {
        Self {
            ids: IdFactory::new(),
            emitter,
            emit_source,
        }
    }

    fn vertex(&mut self, vertex: Vertex) -> Result<Id> {
        let id = self.ids.next();
        self.emitter.emit(&Entry::vertex(id, vertex))?;
        Ok(id)
    }

    fn edge(&mut self, edge: Edge) -> Result<Id> {
        let id = self.ids.next();
        self.emitter.emit(&Entry::edge(id, edge))?;
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Vertices
    // ------------------------------------------------------------------

    pub fn meta_data(&mut self, project_root: Url, tool_name: &str, tool_version: &str) -> Result<Id> {
        self.vertex(Vertex::MetaData(MetaData {
            version: "0.6.0".to_string(),
            project_root,
            position_encoding: Encoding::Utf16,
            tool_info: Some(ToolInfo {
                name: tool_name.to_string(),
                version: Some(tool_version.to_string()),
            }),
        }))
    }

    pub fn project(&mut self, kind: &str, resource: Option<Url>) -> Result<Id> {
        self.vertex(Vertex::Project(Project {
            kind: kind.to_string(),
            resource,
        }))
    }

    pub fn document(&mut self, uri: Url, language_id: &str, contents: Option<String>) -> Result<Id> {
        self.vertex(Vertex::Document(Document {
            uri,
            language_id: language_id.to_string(),
            contents: if self.emit_source { contents } else { None },
        }))
    }

    pub fn range(&mut self, range: Range, tag: Option<RangeTag>) -> Result<Id> {
        self.vertex(Vertex::Range { range, tag })
    }

    pub fn result_set(&mut self) -> Result<Id> {
        self.vertex(Vertex::ResultSet)
    }

    pub fn definition_result(&mut self) -> Result<Id> {
        self.vertex(Vertex::DefinitionResult)
    }

    pub fn reference_result(&mut self) -> Result<Id> {
        self.vertex(Vertex::ReferenceResult)
    }

    pub fn hover_result(&mut self, result: Hover) -> Result<Id> {
        self.vertex(Vertex::HoverResult { result })
    }

    pub fn folding_range_result(&mut self, result: Vec<FoldingRange>) -> Result<Id> {
        self.vertex(Vertex::FoldingRangeResult { result })
    }

    pub fn document_symbol_result(&mut self, result: Vec<RangeBasedDocumentSymbol>) -> Result<Id> {
        self.vertex(Vertex::DocumentSymbolResult { result })
    }

    pub fn diagnostic_result(&mut self, result: Vec<Diagnostic>) -> Result<Id> {
        self.vertex(Vertex::DiagnosticResult { result })
    }

    pub fn moniker(&mut self, kind: MonikerKind, identifier: String) -> Result<Id> {
        self.vertex(Vertex::Moniker(Moniker {
            scheme: MONIKER_SCHEME.to_string(),
            identifier,
            unique: UniquenessLevel::Group,
            kind: Some(kind),
        }))
    }

    pub fn begin_event(&mut self, scope: EventScope, data: Id) -> Result<Id> {
        self.vertex(Vertex::Event(Event {
            kind: EventKind::Begin,
            scope,
            data,
        }))
    }

    pub fn end_event(&mut self, scope: EventScope, data: Id) -> Result<Id> {
        self.vertex(Vertex::Event(Event {
            kind: EventKind::End,
            scope,
            data,
        }))
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    pub fn contains(&mut self, out_v: Id, in_vs: Vec<Id>) -> Result<Id> {
        self.edge(Edge::Contains(EdgeDataMultiIn { out_v, in_vs }))
    }

    pub fn next(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::Next(EdgeData { out_v, in_v }))
    }

    pub fn moniker_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::Moniker(EdgeData { out_v, in_v }))
    }

    pub fn item(
        &mut self,
        out_v: Id,
        in_vs: Vec<Id>,
        document: Id,
        property: Option<ItemProperty>,
    ) -> Result<Id> {
        self.edge(Edge::Item(Item {
            document,
            property,
            edge_data: EdgeDataMultiIn { out_v, in_vs },
        }))
    }

    pub fn definition_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::Definition(EdgeData { out_v, in_v }))
    }

    pub fn references_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::References(EdgeData { out_v, in_v }))
    }

    pub fn hover_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::Hover(EdgeData { out_v, in_v }))
    }

    pub fn folding_range_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::FoldingRange(EdgeData { out_v, in_v }))
    }

    pub fn document_symbol_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::DocumentSymbol(EdgeData { out_v, in_v }))
    }

    pub fn diagnostic_edge(&mut self, out_v: Id, in_v: Id) -> Result<Id> {
        self.edge(Edge::Diagnostic(EdgeData { out_v, in_v }))
    }
}
