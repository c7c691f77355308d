//! Shared helpers for the integration suites: run the indexer over a
//! snapshot in memory and query the emitted stream.

#![allow(dead_code)]

use lsif_index::emit::MemoryEmitter;
use lsif_index::protocol::{
    Edge, Element, Entry, EventKind, EventScope, Id, Item, RangeTag, Vertex,
};
use lsif_index::snapshot::ProgramSnapshot;
use lsif_index::types::{DependentProject, IndexerOptions};
use lsif_index::visitor::index_program;
use lsp_types::{Position, Range};
use std::path::PathBuf;

/// Build a half-open range on one line.
pub fn span(line: u32, start: u32, end: u32) -> Range {
    Range::new(Position::new(line, start), Position::new(line, end))
}

pub fn range(start: (u32, u32), end: (u32, u32)) -> Range {
    Range::new(Position::new(start.0, start.1), Position::new(end.0, end.1))
}

/// The emitted stream plus queries over it.
pub struct Dump {
    pub entries: Vec<Entry>,
}

impl Dump {
    /// Index `snapshot` with default options rooted at `project_root`.
    pub fn index(snapshot: &ProgramSnapshot, project_root: &str) -> Self {
        Self::index_with(
            snapshot,
            IndexerOptions {
                project_root: PathBuf::from(project_root),
                no_contents: false,
                config_file: None,
            },
            &[],
        )
    }

    pub fn index_with(
        snapshot: &ProgramSnapshot,
        options: IndexerOptions,
        dependents: &[DependentProject],
    ) -> Self {
        let mut emitter = MemoryEmitter::new();
        index_program(snapshot, &options, dependents, &mut emitter).expect("indexing succeeds");
        Self {
            entries: emitter.into_entries(),
        }
    }

    pub fn vertices(&self) -> impl Iterator<Item = (Id, &Vertex)> {
        self.entries.iter().filter_map(|entry| match &entry.data {
            Element::Vertex(vertex) => Some((entry.id, vertex)),
            Element::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = (Id, &Edge)> {
        self.entries.iter().filter_map(|entry| match &entry.data {
            Element::Edge(edge) => Some((entry.id, edge)),
            Element::Vertex(_) => None,
        })
    }

    pub fn count_vertices(&self, predicate: impl Fn(&Vertex) -> bool) -> usize {
        self.vertices().filter(|(_, vertex)| predicate(vertex)).count()
    }

    /// Ids of all document vertices, with their URIs.
    pub fn documents(&self) -> Vec<(Id, String)> {
        self.vertices()
            .filter_map(|(id, vertex)| match vertex {
                Vertex::Document(document) => Some((id, document.uri.to_string())),
                _ => None,
            })
            .collect()
    }

    /// The moniker vertex with this identifier.
    pub fn moniker(&self, identifier: &str) -> Option<Id> {
        self.vertices().find_map(|(id, vertex)| match vertex {
            Vertex::Moniker(moniker) if moniker.identifier == identifier => Some(id),
            _ => None,
        })
    }

    /// The result set a moniker is attached to.
    pub fn result_set_of_moniker(&self, identifier: &str) -> Id {
        let moniker = self
            .moniker(identifier)
            .unwrap_or_else(|| panic!("no moniker {identifier}"));
        self.edges()
            .find_map(|(_, edge)| match edge {
                Edge::Moniker(data) if data.in_v == moniker => Some(data.out_v),
                _ => None,
            })
            .unwrap_or_else(|| panic!("moniker {identifier} is not attached"))
    }

    /// A range vertex by exact span. `definition` selects the tag variant.
    pub fn range_id(&self, at: Range, definition: bool) -> Option<Id> {
        self.vertices().find_map(|(id, vertex)| match vertex {
            Vertex::Range {
                range,
                tag: Some(tag),
            } if *range == at => match (tag, definition) {
                (RangeTag::Definition(_), true) | (RangeTag::Reference(_), false) => Some(id),
                _ => None,
            },
            _ => None,
        })
    }

    /// Target of the `next` edge leaving `out`.
    pub fn next_target(&self, out: Id) -> Option<Id> {
        self.edges().find_map(|(_, edge)| match edge {
            Edge::Next(data) if data.out_v == out => Some(data.in_v),
            _ => None,
        })
    }

    pub fn definition_result_of(&self, result_set: Id) -> Option<Id> {
        self.edges().find_map(|(_, edge)| match edge {
            Edge::Definition(data) if data.out_v == result_set => Some(data.in_v),
            _ => None,
        })
    }

    pub fn reference_result_of(&self, result_set: Id) -> Option<Id> {
        self.edges().find_map(|(_, edge)| match edge {
            Edge::References(data) if data.out_v == result_set => Some(data.in_v),
            _ => None,
        })
    }

    /// All `item` edges leaving a result vertex.
    pub fn items_of(&self, out_v: Id) -> Vec<&Item> {
        self.edges()
            .filter_map(|(_, edge)| match edge {
                Edge::Item(item) if item.edge_data.out_v == out_v => Some(item),
                _ => None,
            })
            .collect()
    }

    /// Entry ids of the `item` edges leaving a result vertex.
    pub fn item_ids_of(&self, out_v: Id) -> Vec<Id> {
        self.edges()
            .filter_map(|(id, edge)| match edge {
                Edge::Item(item) if item.edge_data.out_v == out_v => Some(id),
                _ => None,
            })
            .collect()
    }

    /// Position of an event in the stream.
    pub fn event_index(&self, kind: EventKind, scope: EventScope, data: Id) -> Option<usize> {
        self.entries.iter().position(|entry| {
            matches!(
                &entry.data,
                Element::Vertex(Vertex::Event(event))
                    if event.kind == kind && event.scope == scope && event.data == data
            )
        })
    }

    /// Stream position of the entry with this id.
    pub fn position_of(&self, id: Id) -> usize {
        self.entries
            .iter()
            .position(|entry| entry.id == id)
            .unwrap_or_else(|| panic!("no entry with id {id}"))
    }
}
