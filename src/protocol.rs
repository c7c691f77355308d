//! LSIF graph records.
//!
//! Vertices and edges of the Language Server Index Format, shaped for the
//! 0.6 specification: one `Entry` per emitted line, internally tagged with
//! `type` (vertex/edge) and `label`. Position-level payloads reuse the
//! `lsp-types` definitions so a dump round-trips against standard tooling.

use lsp_types::{Diagnostic, FoldingRange, Hover, Moniker, Range, SymbolKind, Url};
use serde::{Deserialize, Serialize};

/// Identifier of a vertex or edge. Strictly increasing in emission order.
pub type Id = u64;

/// One element of the dump: a unique id plus the vertex or edge payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Id,
    #[serde(flatten)]
    pub data: Element,
}

impl Entry {
    pub fn vertex(id: Id, vertex: Vertex) -> Self {
        Self {
            id,
            data: Element::Vertex(vertex),
        }
    }

    pub fn edge(id: Id, edge: Edge) -> Self {
        Self {
            id,
            data: Element::Edge(edge),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
#[allow(clippy::large_enum_variant)]
pub enum Element {
    Vertex(Vertex),
    Edge(Edge),
}

// ============================================================================
// Vertices
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "label")]
pub enum Vertex {
    MetaData(MetaData),
    Project(Project),
    Document(Document),
    Range {
        #[serde(flatten)]
        range: Range,
        #[serde(skip_serializing_if = "Option::is_none")]
        tag: Option<RangeTag>,
    },
    ResultSet,
    Moniker(Moniker),
    #[serde(rename = "$event")]
    Event(Event),
    DefinitionResult,
    ReferenceResult,
    HoverResult {
        result: Hover,
    },
    FoldingRangeResult {
        result: Vec<FoldingRange>,
    },
    DocumentSymbolResult {
        result: Vec<RangeBasedDocumentSymbol>,
    },
    DiagnosticResult {
        result: Vec<Diagnostic>,
    },
}

/// Tag attached to a `range` vertex, classifying the occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "type")]
pub enum RangeTag {
    Definition(DefinitionTag),
    Reference(ReferenceTag),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinitionTag {
    /// The text covered by the range.
    pub text: String,
    /// The symbol kind of the declared entity.
    pub kind: SymbolKind,
    /// The full range of the definition, including body; must enclose the
    /// name range.
    pub full_range: Range,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTag {
    /// The text covered by the range.
    pub text: String,
}

/// Document symbols in the range-based form: a tree of definition range ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeBasedDocumentSymbol {
    pub id: Id,
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RangeBasedDocumentSymbol>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Begin,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventScope {
    Document,
    Project,
}

/// Lifecycle marker bracketing all emissions that mention `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub scope: EventScope,
    pub data: Id,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Encoding {
    #[serde(rename = "utf-16")]
    Utf16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaData {
    /// LSIF format version, semver.
    pub version: String,
    /// The project root used to compute this dump, as a URI.
    pub project_root: Url,
    pub position_encoding: Encoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_info: Option<ToolInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub uri: Url,
    pub language_id: String,
    /// Source text, present unless contents are suppressed for the run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

// ============================================================================
// Edges
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(tag = "label")]
pub enum Edge {
    Contains(EdgeDataMultiIn),
    Moniker(EdgeData),
    Next(EdgeData),
    Item(Item),
    #[serde(rename = "textDocument/definition")]
    Definition(EdgeData),
    #[serde(rename = "textDocument/references")]
    References(EdgeData),
    #[serde(rename = "textDocument/hover")]
    Hover(EdgeData),
    #[serde(rename = "textDocument/foldingRange")]
    FoldingRange(EdgeData),
    #[serde(rename = "textDocument/documentSymbol")]
    DocumentSymbol(EdgeData),
    #[serde(rename = "textDocument/diagnostic")]
    Diagnostic(EdgeData),
}

/// 1:1 edge payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeData {
    pub out_v: Id,
    pub in_v: Id,
}

/// 1:n edge payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDataMultiIn {
    pub out_v: Id,
    pub in_vs: Vec<Id>,
}

/// Property of an `item` edge: which list of the target result the ranges
/// belong to. Absent when the edge attaches reference results rather than
/// ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemProperty {
    Declarations,
    Definitions,
    References,
}

/// An `item` edge: attaches ranges (or reference results) to a definition or
/// reference result, scoped to one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub document: Id,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<ItemProperty>,
    #[serde(flatten)]
    pub edge_data: EdgeDataMultiIn,
}

impl Edge {
    /// The ids this edge refers to, `outV` first.
    pub fn referenced_ids(&self) -> Vec<Id> {
        match self {
            Edge::Contains(data) => {
                let mut ids = vec![data.out_v];
                ids.extend(&data.in_vs);
                ids
            }
            Edge::Item(item) => {
                let mut ids = vec![item.edge_data.out_v, item.document];
                ids.extend(&item.edge_data.in_vs);
                ids
            }
            Edge::Moniker(data)
            | Edge::Next(data)
            | Edge::Definition(data)
            | Edge::References(data)
            | Edge::Hover(data)
            | Edge::FoldingRange(data)
            | Edge::DocumentSymbol(data)
            | Edge::Diagnostic(data) => vec![data.out_v, data.in_v],
        }
    }
}
