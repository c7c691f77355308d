//! Whole-stream invariants: id ordering, reference-before-use, document
//! bracketing, contains uniqueness, result cardinality, and the consumer
//! round-trip.

mod support;

use lsif_index::protocol::{
    Edge, Element, Entry, EventKind, EventScope, Id, Vertex,
};
use lsif_index::semantic::{DiagnosticLevel, NodeKind, OutliningSpan, OutliningSpanKind, RawDiagnostic};
use lsif_index::snapshot::{ProgramSnapshot, SnapshotBuilder};
use lsif_index::types::{DependentProject, IndexerOptions};
use lsif_index::SymbolFlags;
use petgraph::graph::DiGraph;
use pretty_assertions::assert_eq;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use support::{Dump, range, span};

/// A program that exercises every emission path: a class hierarchy across
/// files, a renamed alias, a block-scoped local, an external declaration
/// file, diagnostics, and outlining spans.
fn sample_program() -> ProgramSnapshot {
    let mut b = SnapshotBuilder::new();

    // --- a.ts: base class, block-scoped local -------------------------
    let a = b.file(
        "/proj/src/a.ts",
        "export class C {\n  m() {}\n}\nfunction f() {\n  let x;\n  x;\n}\n",
    );
    let root_a = b.root(a);
    let c_decl = b.node(a, root_a, NodeKind::ClassDeclaration, range((0, 7), (2, 1)), "class C");
    let c_name = b.node(a, c_decl, NodeKind::Identifier, span(0, 13, 14), "C");
    b.set_name(c_decl, c_name);
    let cm_decl = b.node(a, c_decl, NodeKind::MethodDeclaration, span(1, 2, 8), "m() {}");
    let cm_name = b.node(a, cm_decl, NodeKind::Identifier, span(1, 2, 3), "m");
    b.set_name(cm_decl, cm_name);
    let f_decl = b.node(a, root_a, NodeKind::FunctionDeclaration, range((3, 0), (6, 1)), "function f()");
    let f_name = b.node(a, f_decl, NodeKind::Identifier, span(3, 9, 10), "f");
    b.set_name(f_decl, f_name);
    let block = b.node(a, f_decl, NodeKind::Block, range((3, 13), (6, 1)), "{ ... }");
    let var_stmt = b.node(a, block, NodeKind::Other, span(4, 2, 8), "let x;");
    let x_name = b.node(a, var_stmt, NodeKind::Identifier, span(4, 6, 7), "x");
    b.set_name(var_stmt, x_name);
    let use_stmt = b.node(a, block, NodeKind::Other, span(5, 2, 4), "x;");
    let x_use = b.node(a, use_stmt, NodeKind::Identifier, span(5, 2, 3), "x");

    b.add_outlining_span(
        a,
        OutliningSpan {
            range: range((0, 15), (2, 1)),
            kind: OutliningSpanKind::Code,
        },
    );
    b.add_outlining_span(
        a,
        OutliningSpan {
            range: range((3, 13), (6, 1)),
            kind: OutliningSpanKind::Comment,
        },
    );
    b.add_syntactic_diagnostic(
        a,
        RawDiagnostic {
            range: Some(span(4, 2, 8)),
            severity: DiagnosticLevel::Error,
            code: Some(1005),
            message: "';' expected.".to_string(),
        },
    );
    b.add_semantic_diagnostic(
        a,
        RawDiagnostic {
            range: Some(span(5, 2, 3)),
            severity: DiagnosticLevel::Warning,
            code: Some(6133),
            message: "'x' is declared but its value is never read.".to_string(),
        },
    );
    // no resolvable location: must be dropped
    b.add_semantic_diagnostic(
        a,
        RawDiagnostic {
            range: None,
            severity: DiagnosticLevel::Message,
            code: None,
            message: "global program message".to_string(),
        },
    );

    // --- b.ts: override, alias, external call -------------------------
    let f2 = b.file(
        "/proj/src/b.ts",
        "export class D extends C {\n    m() {}\n}\nd.m();\nexport { D as E };\next();\n",
    );
    let root_b = b.root(f2);
    let d_decl = b.node(f2, root_b, NodeKind::ClassDeclaration, range((0, 7), (2, 1)), "class D");
    let d_name = b.node(f2, d_decl, NodeKind::Identifier, span(0, 13, 14), "D");
    b.set_name(d_decl, d_name);
    let d_heritage = b.node(f2, d_decl, NodeKind::Identifier, span(0, 23, 24), "C");
    b.set_heritage(d_decl, vec![d_heritage]);
    let dm_decl = b.node(f2, d_decl, NodeKind::MethodDeclaration, span(1, 4, 10), "m() {}");
    let dm_name = b.node(f2, dm_decl, NodeKind::Identifier, span(1, 4, 5), "m");
    b.set_name(dm_decl, dm_name);
    let call_stmt = b.node(f2, root_b, NodeKind::Other, span(3, 0, 6), "d.m();");
    let call = b.node(f2, call_stmt, NodeKind::Identifier, span(3, 2, 3), "m");
    let export_stmt = b.node(f2, root_b, NodeKind::Other, span(4, 0, 18), "export { D as E };");
    let spec = b.node(f2, export_stmt, NodeKind::Other, span(4, 9, 15), "D as E");
    let d_ref = b.node(f2, spec, NodeKind::Identifier, span(4, 9, 10), "D");
    let e_name = b.node(f2, spec, NodeKind::Identifier, span(4, 14, 15), "E");
    b.set_name(spec, e_name);
    let ext_stmt = b.node(f2, root_b, NodeKind::Other, span(5, 0, 6), "ext();");
    let ext_call = b.node(f2, ext_stmt, NodeKind::Identifier, span(5, 0, 3), "ext");

    // --- external declaration file ------------------------------------
    let dts = b.file("/deps/lib/index.d.ts", "export declare function ext(): void;\n");
    let root_dts = b.root(dts);
    b.mark_declaration_file(dts);
    b.mark_external_library(dts);
    let ext_decl = b.node(
        dts,
        root_dts,
        NodeKind::FunctionDeclaration,
        range((0, 0), (0, 36)),
        "export declare function ext(): void;",
    );
    let ext_name = b.node(dts, ext_decl, NodeKind::Identifier, span(0, 24, 27), "ext");
    b.set_name(ext_decl, ext_name);

    // --- symbols -------------------------------------------------------
    let module_a = b.symbol("a", "\"/proj/src/a\"", SymbolFlags::SOURCE_FILE);
    b.declare(module_a, root_a);
    let module_b = b.symbol("b", "\"/proj/src/b\"", SymbolFlags::SOURCE_FILE);
    b.declare(module_b, root_b);
    let module_dts = b.symbol("lib", "\"/deps/lib/index\"", SymbolFlags::SOURCE_FILE);
    b.declare(module_dts, root_dts);

    let class_c = b.symbol("a.C", "C", SymbolFlags::CLASS);
    b.declare(class_c, c_decl);
    b.set_parent(class_c, module_a);
    b.add_export(module_a, "C", class_c);
    let method_cm = b.symbol("a.C.m", "m", SymbolFlags::METHOD);
    b.declare(method_cm, cm_decl);
    b.set_parent(method_cm, class_c);
    b.add_member(class_c, "m", method_cm);

    let f_sym = b.symbol("a.f", "f", SymbolFlags::FUNCTION);
    b.declare(f_sym, f_decl);
    b.set_parent(f_sym, module_a);
    let x_sym = b.symbol("a.f.x", "x", SymbolFlags::VARIABLE);
    b.declare(x_sym, var_stmt);
    b.set_scope(x_sym, block);
    b.bind(x_use, x_sym);

    let class_d = b.symbol("b.D", "D", SymbolFlags::CLASS);
    b.declare(class_d, d_decl);
    b.set_parent(class_d, module_b);
    b.add_export(module_b, "D", class_d);
    let method_dm = b.symbol("b.D.m", "m", SymbolFlags::METHOD);
    b.declare(method_dm, dm_decl);
    b.set_parent(method_dm, class_d);
    b.add_member(class_d, "m", method_dm);
    let alias_e = b.symbol("b.E", "E", SymbolFlags::ALIAS);
    b.declare(alias_e, spec);
    b.set_parent(alias_e, module_b);
    b.set_alias(alias_e, class_d);
    b.add_export(module_b, "E", alias_e);

    let ext_sym = b.symbol("lib.ext", "ext", SymbolFlags::FUNCTION);
    b.declare(ext_sym, ext_decl);
    b.set_parent(ext_sym, module_dts);
    b.add_export(module_dts, "ext", ext_sym);

    b.bind(d_heritage, class_c);
    b.bind(call, method_dm);
    b.bind(d_ref, class_d);
    b.bind(ext_call, ext_sym);
    b.build()
}

fn sample_dump() -> Dump {
    Dump::index_with(
        &sample_program(),
        IndexerOptions {
            project_root: PathBuf::from("/proj"),
            no_contents: false,
            config_file: None,
        },
        &[DependentProject {
            root_dir: PathBuf::from("/deps/lib-src"),
            out_dir: PathBuf::from("/deps/lib"),
        }],
    )
}

#[test]
fn ids_are_strictly_increasing() {
    let dump = sample_dump();
    for pair in dump.entries.windows(2) {
        assert!(pair[0].id < pair[1].id, "ids must increase in stream order");
    }
}

#[test]
fn edges_only_reference_already_emitted_vertices() {
    let dump = sample_dump();
    let mut seen: HashSet<Id> = HashSet::new();
    for entry in &dump.entries {
        match &entry.data {
            Element::Vertex(_) => {
                seen.insert(entry.id);
            }
            Element::Edge(edge) => {
                for id in edge.referenced_ids() {
                    assert!(
                        seen.contains(&id),
                        "edge {} references {} before it was emitted",
                        entry.id,
                        id
                    );
                }
            }
        }
    }
}

#[test]
fn document_emissions_are_bracketed_by_events() {
    let dump = sample_dump();
    for (document, uri) in dump.documents() {
        let begin = dump
            .event_index(EventKind::Begin, EventScope::Document, document)
            .unwrap_or_else(|| panic!("no begin event for {uri}"));
        let end = dump
            .event_index(EventKind::End, EventScope::Document, document)
            .unwrap_or_else(|| panic!("no end event for {uri}"));
        assert!(begin < end);

        for (position, entry) in dump.entries.iter().enumerate() {
            match &entry.data {
                Element::Edge(Edge::Item(item)) if item.document == document => {
                    assert!(
                        begin < position && position < end,
                        "item edge {} for {uri} escapes its document bracket",
                        entry.id
                    );
                }
                Element::Edge(Edge::Contains(data)) if data.out_v == document => {
                    assert!(
                        begin < position && position < end,
                        "contains edge {} for {uri} escapes its document bracket",
                        entry.id
                    );
                }
                _ => {}
            }
        }
    }

    // project events bracket every document event
    let project = dump
        .vertices()
        .find_map(|(id, vertex)| match vertex {
            Vertex::Project(_) => Some(id),
            _ => None,
        })
        .expect("project vertex");
    let project_begin = dump
        .event_index(EventKind::Begin, EventScope::Project, project)
        .expect("project begin");
    let project_end = dump
        .event_index(EventKind::End, EventScope::Project, project)
        .expect("project end");
    for (document, _) in dump.documents() {
        let begin = dump
            .event_index(EventKind::Begin, EventScope::Document, document)
            .unwrap();
        let end = dump
            .event_index(EventKind::End, EventScope::Document, document)
            .unwrap();
        assert!(project_begin < begin && end < project_end);
    }
}

#[test]
fn every_range_is_contained_exactly_once() {
    let dump = sample_dump();
    let documents: HashSet<Id> = dump.documents().into_iter().map(|(id, _)| id).collect();
    let ranges: HashSet<Id> = dump
        .vertices()
        .filter_map(|(id, vertex)| match vertex {
            Vertex::Range { .. } => Some(id),
            _ => None,
        })
        .collect();

    let mut containment_counts: HashMap<Id, usize> = HashMap::new();
    for (_, edge) in dump.edges() {
        if let Edge::Contains(data) = edge {
            if documents.contains(&data.out_v) {
                for id in &data.in_vs {
                    *containment_counts.entry(*id).or_default() += 1;
                }
            }
        }
    }

    for range in &ranges {
        assert_eq!(
            containment_counts.get(range),
            Some(&1),
            "range {range} must be contained exactly once"
        );
    }
}

#[test]
fn results_are_unique_per_symbol() {
    let dump = sample_dump();
    let mut definition_edges: HashMap<Id, usize> = HashMap::new();
    let mut reference_edges: HashMap<Id, usize> = HashMap::new();
    for (_, edge) in dump.edges() {
        match edge {
            Edge::Definition(data) => *definition_edges.entry(data.out_v).or_default() += 1,
            Edge::References(data) => *reference_edges.entry(data.out_v).or_default() += 1,
            _ => {}
        }
    }
    for (result_set, count) in definition_edges.iter().chain(&reference_edges) {
        assert_eq!(
            *count, 1,
            "result set {result_set} must own at most one result per kind"
        );
    }

    // every definition/reference result vertex is attached to exactly one set
    let definition_results = dump.count_vertices(|v| matches!(v, Vertex::DefinitionResult));
    let reference_results = dump.count_vertices(|v| matches!(v, Vertex::ReferenceResult));
    assert_eq!(definition_edges.values().sum::<usize>(), definition_results);
    assert_eq!(reference_edges.values().sum::<usize>(), reference_results);
}

#[test]
fn external_symbols_get_import_monikers() {
    let dump = sample_dump();
    let moniker = dump
        .vertices()
        .find_map(|(_, vertex)| match vertex {
            Vertex::Moniker(m) if m.identifier == "index.ext" => Some(m.clone()),
            _ => None,
        })
        .expect("moniker for the external function");
    assert_eq!(moniker.kind, Some(lsp_types::MonikerKind::Import));
    assert_eq!(moniker.scheme, "tsc");
}

#[test]
fn dropped_diagnostics_and_folding_results() {
    let dump = sample_dump();
    let diagnostics = dump
        .vertices()
        .find_map(|(_, vertex)| match vertex {
            Vertex::DiagnosticResult { result } => Some(result.clone()),
            _ => None,
        })
        .expect("diagnostic result for a.ts");
    // one syntactic + one located semantic; the location-less one is dropped
    assert_eq!(diagnostics.len(), 2);

    let folding = dump
        .vertices()
        .find_map(|(_, vertex)| match vertex {
            Vertex::FoldingRangeResult { result } => Some(result.clone()),
            _ => None,
        })
        .expect("folding result for a.ts");
    assert_eq!(folding.len(), 2);
}

#[test]
fn stream_round_trips_and_topology_is_reconstructible() {
    let dump = sample_dump();

    // serialize and re-read the full stream
    let lines: Vec<String> = dump
        .entries
        .iter()
        .map(|entry| serde_json::to_string(entry).unwrap())
        .collect();
    let reparsed: Vec<Entry> = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(reparsed, dump.entries);

    // rebuild the graph a visualizer would: vertices as nodes, edges between
    let build_graph = |entries: &[Entry]| {
        let mut graph: DiGraph<Id, &'static str> = DiGraph::new();
        let mut nodes = HashMap::new();
        for entry in entries {
            if let Element::Vertex(_) = entry.data {
                nodes.insert(entry.id, graph.add_node(entry.id));
            }
        }
        for entry in entries {
            if let Element::Edge(edge) = &entry.data {
                let ids = edge.referenced_ids();
                let (out, ins) = ids.split_first().unwrap();
                for target in ins {
                    graph.add_edge(nodes[out], nodes[target], "");
                }
            }
        }
        graph
    };
    let original = build_graph(&dump.entries);
    let rebuilt = build_graph(&reparsed);
    assert_eq!(original.node_count(), rebuilt.node_count());
    assert_eq!(original.edge_count(), rebuilt.edge_count());

    // document -> range and range -> result set maps must be recoverable
    let documents: HashSet<Id> = dump.documents().into_iter().map(|(id, _)| id).collect();
    let mut document_ranges: HashMap<Id, Vec<Id>> = HashMap::new();
    let mut range_result_sets: HashMap<Id, Id> = HashMap::new();
    for (_, edge) in dump.edges() {
        match edge {
            Edge::Contains(data) if documents.contains(&data.out_v) => {
                document_ranges
                    .entry(data.out_v)
                    .or_default()
                    .extend(&data.in_vs);
            }
            Edge::Next(data) => {
                range_result_sets.insert(data.out_v, data.in_v);
            }
            _ => {}
        }
    }
    assert!(!document_ranges.is_empty());
    assert!(!range_result_sets.is_empty());
}
