//! Per-symbol accumulators and their per-document partitions.
//!
//! Every indexed symbol owns one [`SymbolData`]: a result-set header plus a
//! map of per-file [`SymbolDataPartition`] shards that buffer definition and
//! reference ranges until the right lifecycle boundary. The four behavioral
//! variants (standard, aliased, method-with-bases, union/intersection) form a
//! closed set and are dispatched as a tagged sum.
//!
//! Symbol datas live in a [`SymbolStore`] arena and refer to each other by
//! [`SymbolIndex`], never by pointer; cross-symbol routing (aliases and
//! method overrides forwarding ranges into other symbols' partitions) borrows
//! the target through the store.
//!
//! Lifecycle is strict: a partition flushes exactly once, and a flushed
//! partition or cleared symbol that is asked to accept more data is a
//! programming error and panics.

use crate::emit::GraphWriter;
use crate::protocol::{Id, ItemProperty};
use crate::types::{FileId, NodeId, SymbolId};
use anyhow::Result;
use lsp_types::{Hover, MonikerKind, Range};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Index of a symbol data within the run's [`SymbolStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolIndex(pub u32);

/// Append-only arena of symbol datas.
///
/// Interior mutability lets one symbol route ranges into another while both
/// are reachable from the same map; a double borrow of the same symbol is a
/// programming error and panics.
#[derive(Default)]
pub struct SymbolStore {
    datas: Vec<RefCell<SymbolData>>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The index the next inserted symbol data will get.
    pub fn next_index(&self) -> SymbolIndex {
        SymbolIndex(self.datas.len() as u32)
    }

    pub fn insert(&mut self, data: SymbolData) -> SymbolIndex {
        let index = self.next_index();
        debug_assert_eq!(index, data.index);
        self.datas.push(RefCell::new(data));
        index
    }

    pub fn get(&self, index: SymbolIndex) -> &RefCell<SymbolData> {
        &self.datas[index.0 as usize]
    }
}

/// Narrow capability symbol datas use to reach back into their context: the
/// live document registry and the lifecycle trigger map.
pub trait SymbolContext {
    /// Vertex id of the live document wrapping `file`, if one exists.
    fn document_id(&self, file: FileId) -> Option<Id>;

    /// Root syntax node of `file`, used as the flush trigger for partitions
    /// of unscoped symbols.
    fn source_file_root(&self, file: FileId) -> NodeId;

    /// Register `symbol` to be consulted when `node` is processed.
    fn manage_lifecycle(&mut self, node: NodeId, symbol: SymbolIndex);
}

/// A definition the symbol already represents; identifiers sitting exactly on
/// such a range do not produce reference ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionInfo {
    pub file: FileId,
    pub range: Range,
}

/// Behavioral variant of a symbol data.
#[derive(Debug, Clone)]
pub enum SymbolVariant {
    Standard,
    /// Import/type aliases. `rename` is true when the alias introduces a
    /// different name than its target.
    Aliased { target: SymbolIndex, rename: bool },
    /// Methods. `bases` holds the overridden methods up the hierarchy; an
    /// empty list is normalized to `None` at construction.
    Method {
        bases: Option<Vec<SymbolIndex>>,
        partition_file: FileId,
    },
    /// Transient members synthesized on union/intersection types.
    UnionOrIntersection {
        elements: Vec<SymbolIndex>,
        partition_file: FileId,
    },
}

#[derive(Debug)]
enum Partitions {
    Live(BTreeMap<FileId, PartitionSlot>),
    /// The scoped symbol has been flushed as a whole; any reopen is an error.
    Cleared,
}

#[derive(Debug)]
enum PartitionSlot {
    Live(SymbolDataPartition),
    /// This shard has been flushed; distinct from absent.
    Flushed,
}

/// Accumulator for one symbol's graph contribution.
pub struct SymbolData {
    id: SymbolId,
    index: SymbolIndex,
    variant: SymbolVariant,
    result_set: Id,
    /// Flush trigger for locally visible symbols.
    scope: Option<NodeId>,
    declaration_info: Vec<DefinitionInfo>,
    definition_result: Option<Id>,
    reference_result: Option<Id>,
    hover: Option<Id>,
    partitions: Partitions,
}

impl SymbolData {
    /// Emits the result-set vertex and constructs the accumulator. Callers
    /// must insert the value into the store at `index` and then run
    /// [`SymbolData::begin`].
    pub fn new(
        writer: &mut GraphWriter<'_>,
        id: SymbolId,
        index: SymbolIndex,
        scope: Option<NodeId>,
        variant: SymbolVariant,
    ) -> Result<Self> {
        let result_set = writer.result_set()?;
        Ok(Self {
            id,
            index,
            variant,
            result_set,
            scope,
            declaration_info: Vec::new(),
            definition_result: None,
            reference_result: None,
            hover: None,
            partitions: Partitions::Live(BTreeMap::new()),
        })
    }

    pub fn symbol_id(&self) -> &SymbolId {
        &self.id
    }

    pub fn result_set(&self) -> Id {
        self.result_set
    }

    /// Variant-specific begin work: aliases link their result set to the
    /// target's, methods and union/intersection symbols seed their partition
    /// with the reference results they forward to.
    pub fn begin(
        &mut self,
        writer: &mut GraphWriter<'_>,
        store: &SymbolStore,
        ctx: &mut dyn SymbolContext,
    ) -> Result<()> {
        match self.variant.clone() {
            SymbolVariant::Standard => Ok(()),
            SymbolVariant::Aliased { target, .. } => {
                let aliased_result_set = store.get(target).borrow().result_set();
                writer.next(self.result_set, aliased_result_set)?;
                Ok(())
            }
            SymbolVariant::Method {
                bases,
                partition_file,
            } => {
                let Some(bases) = bases else {
                    return Ok(());
                };
                for base in bases {
                    let reference_result =
                        store.get(base).borrow_mut().ensure_reference_result(writer)?;
                    self.get_or_create_partition(ctx, partition_file)
                        .add_reference_result(reference_result);
                }
                Ok(())
            }
            SymbolVariant::UnionOrIntersection {
                elements,
                partition_file,
            } => {
                for element in elements {
                    let reference_result = store
                        .get(element)
                        .borrow_mut()
                        .ensure_reference_result(writer)?;
                    self.get_or_create_partition(ctx, partition_file)
                        .add_reference_result(reference_result);
                }
                Ok(())
            }
        }
    }

    // ------------------------------------------------------------------
    // Definitions
    // ------------------------------------------------------------------

    /// Record a definition-tagged range that has already been emitted and
    /// attached to its document.
    pub fn add_definition(
        &mut self,
        writer: &mut GraphWriter<'_>,
        store: &SymbolStore,
        ctx: &mut dyn SymbolContext,
        file: FileId,
        range_id: Id,
        range: Range,
    ) -> Result<()> {
        match self.variant.clone() {
            SymbolVariant::Standard => {
                self.add_definition_standard(writer, ctx, file, range_id, range, true)
            }
            SymbolVariant::Aliased { target, rename } => {
                if rename {
                    // The alias has its own identity; keep the definition
                    // local but out of the reference buckets.
                    self.add_definition_standard(writer, ctx, file, range_id, range, false)
                } else {
                    writer.next(range_id, self.result_set)?;
                    store.get(target).borrow_mut().partition_add_reference(
                        ctx,
                        file,
                        range_id,
                        ItemProperty::References,
                    );
                    Ok(())
                }
            }
            SymbolVariant::Method { bases, .. } => {
                // With bases, the range is counted in the base's definitions
                // bucket instead of the local one.
                self.add_definition_standard(writer, ctx, file, range_id, range, bases.is_none())?;
                for base in bases.into_iter().flatten() {
                    store.get(base).borrow_mut().partition_add_reference(
                        ctx,
                        file,
                        range_id,
                        ItemProperty::Definitions,
                    );
                }
                Ok(())
            }
            // Definitions of transient union/intersection pseudo-symbols are
            // not meaningful.
            SymbolVariant::UnionOrIntersection { .. } => Ok(()),
        }
    }

    fn add_definition_standard(
        &mut self,
        writer: &mut GraphWriter<'_>,
        ctx: &mut dyn SymbolContext,
        file: FileId,
        range_id: Id,
        range: Range,
        record_as_reference: bool,
    ) -> Result<()> {
        writer.next(range_id, self.result_set)?;
        let partition = self.get_or_create_partition(ctx, file);
        partition.add_definition(range_id, range);
        if record_as_reference {
            partition.add_reference_range(range_id, ItemProperty::Definitions);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// Record a reference-tagged range that has already been emitted and
    /// attached to its document.
    pub fn add_reference(
        &mut self,
        writer: &mut GraphWriter<'_>,
        store: &SymbolStore,
        ctx: &mut dyn SymbolContext,
        file: FileId,
        range_id: Id,
        property: ItemProperty,
    ) -> Result<()> {
        match self.variant.clone() {
            SymbolVariant::Standard => {
                writer.next(range_id, self.result_set)?;
                self.partition_add_reference(ctx, file, range_id, property);
                Ok(())
            }
            SymbolVariant::Aliased { target, .. } => {
                writer.next(range_id, self.result_set)?;
                store
                    .get(target)
                    .borrow_mut()
                    .partition_add_reference(ctx, file, range_id, property);
                Ok(())
            }
            SymbolVariant::Method { bases, .. } => match bases {
                Some(bases) => {
                    writer.next(range_id, self.result_set)?;
                    for base in bases {
                        store.get(base).borrow_mut().partition_add_reference(
                            ctx,
                            file,
                            range_id,
                            property,
                        );
                    }
                    Ok(())
                }
                None => {
                    writer.next(range_id, self.result_set)?;
                    self.partition_add_reference(ctx, file, range_id, property);
                    Ok(())
                }
            },
            SymbolVariant::UnionOrIntersection { elements, .. } => {
                writer.next(range_id, self.result_set)?;
                for element in elements {
                    store.get(element).borrow_mut().partition_add_reference(
                        ctx,
                        file,
                        range_id,
                        property,
                    );
                }
                Ok(())
            }
        }
    }

    /// Partition-level insertion, bypassing variant dispatch. Used when
    /// another symbol routes an already-linked range into this one.
    fn partition_add_reference(
        &mut self,
        ctx: &mut dyn SymbolContext,
        file: FileId,
        range_id: Id,
        property: ItemProperty,
    ) {
        self.get_or_create_partition(ctx, file)
            .add_reference_range(range_id, property);
    }

    // ------------------------------------------------------------------
    // Declaration memory
    // ------------------------------------------------------------------

    pub fn record_definition_info(&mut self, info: DefinitionInfo) {
        if matches!(self.variant, SymbolVariant::UnionOrIntersection { .. }) {
            return;
        }
        self.declaration_info.push(info);
    }

    /// True when an identifier at exactly this range sits on a declaration
    /// name this symbol already represents.
    pub fn has_definition_info(&self, file: FileId, range: &Range) -> bool {
        self.declaration_info
            .iter()
            .any(|info| info.file == file && info.range == *range)
    }

    /// Already-recorded definition range with exactly this span, if any.
    pub fn find_definition(
        &self,
        store: &SymbolStore,
        file: FileId,
        range: &Range,
    ) -> Option<Id> {
        if let SymbolVariant::Aliased {
            target,
            rename: false,
        } = self.variant
        {
            return store.get(target).borrow().find_definition(store, file, range);
        }
        match &self.partitions {
            Partitions::Live(map) => match map.get(&file) {
                Some(PartitionSlot::Live(partition)) => partition.find_definition(range),
                _ => None,
            },
            Partitions::Cleared => None,
        }
    }

    // ------------------------------------------------------------------
    // Result vertices
    // ------------------------------------------------------------------

    pub fn ensure_definition_result(&mut self, writer: &mut GraphWriter<'_>) -> Result<Id> {
        if let Some(id) = self.definition_result {
            return Ok(id);
        }
        let id = writer.definition_result()?;
        writer.definition_edge(self.result_set, id)?;
        self.definition_result = Some(id);
        Ok(id)
    }

    pub fn ensure_reference_result(&mut self, writer: &mut GraphWriter<'_>) -> Result<Id> {
        if matches!(self.variant, SymbolVariant::Aliased { .. }) {
            panic!(
                "alias symbol {} must resolve references through its target",
                self.id
            );
        }
        if let Some(id) = self.reference_result {
            return Ok(id);
        }
        let id = writer.reference_result()?;
        writer.references_edge(self.result_set, id)?;
        self.reference_result = Some(id);
        Ok(id)
    }

    // ------------------------------------------------------------------
    // Hover and monikers
    // ------------------------------------------------------------------

    pub fn add_hover(&mut self, writer: &mut GraphWriter<'_>, hover: Hover) -> Result<()> {
        if self.hover.is_some() {
            return Ok(());
        }
        let id = writer.hover_result(hover)?;
        writer.hover_edge(self.result_set, id)?;
        self.hover = Some(id);
        Ok(())
    }

    pub fn add_moniker(
        &mut self,
        writer: &mut GraphWriter<'_>,
        kind: MonikerKind,
        identifier: String,
    ) -> Result<()> {
        let id = writer.moniker(kind, identifier)?;
        writer.moniker_edge(self.result_set, id)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    fn get_or_create_partition(
        &mut self,
        ctx: &mut dyn SymbolContext,
        file: FileId,
    ) -> &mut SymbolDataPartition {
        let scope = self.scope;
        let index = self.index;
        let map = match &mut self.partitions {
            Partitions::Live(map) => map,
            Partitions::Cleared => panic!("symbol {} has been cleared", self.id),
        };
        match map.entry(file) {
            Entry::Occupied(slot) => match slot.into_mut() {
                PartitionSlot::Live(partition) => partition,
                PartitionSlot::Flushed => panic!(
                    "partition of symbol {} for file {} has already been flushed",
                    self.id, file.0
                ),
            },
            Entry::Vacant(slot) => {
                let document = ctx.document_id(file).unwrap_or_else(|| {
                    panic!(
                        "no live document data for file {} while opening a partition of symbol {}",
                        file.0, self.id
                    )
                });
                let trigger = scope.unwrap_or_else(|| ctx.source_file_root(file));
                ctx.manage_lifecycle(trigger, index);
                let partition = SymbolDataPartition::new(file, document);
                partition.begin();
                match slot.insert(PartitionSlot::Live(partition)) {
                    PartitionSlot::Live(partition) => partition,
                    PartitionSlot::Flushed => unreachable!(),
                }
            }
        }
    }

    /// Consulted when a node this symbol registered on has been processed.
    ///
    /// Returns true when the symbol itself is exhausted (its scope ended);
    /// false when only a per-file shard was flushed.
    pub fn node_processed(
        &mut self,
        writer: &mut GraphWriter<'_>,
        node: NodeId,
        source_file: Option<FileId>,
    ) -> Result<bool> {
        if self.scope == Some(node) {
            let map = match std::mem::replace(&mut self.partitions, Partitions::Cleared) {
                Partitions::Live(map) => map,
                Partitions::Cleared => panic!("symbol {} has been cleared", self.id),
            };
            for slot in map.into_values() {
                if let PartitionSlot::Live(partition) = slot {
                    self.flush_partition(writer, partition)?;
                }
            }
            return Ok(true);
        }
        if let Some(file) = source_file {
            let taken = {
                let map = match &mut self.partitions {
                    Partitions::Live(map) => map,
                    Partitions::Cleared => panic!("symbol {} has been cleared", self.id),
                };
                let slot = map.get_mut(&file).unwrap_or_else(|| {
                    panic!(
                        "symbol {} was consulted for file {} without a partition",
                        self.id, file.0
                    )
                });
                std::mem::replace(slot, PartitionSlot::Flushed)
            };
            match taken {
                PartitionSlot::Live(partition) => self.flush_partition(writer, partition)?,
                PartitionSlot::Flushed => panic!(
                    "partition of symbol {} for file {} has already been flushed",
                    self.id, file.0
                ),
            }
            return Ok(false);
        }
        panic!(
            "symbol {} was consulted on a node that is neither its scope nor a source file",
            self.id
        );
    }

    /// Flush all remaining shards at project end.
    pub fn end(&mut self, writer: &mut GraphWriter<'_>) -> Result<()> {
        let map = match std::mem::replace(&mut self.partitions, Partitions::Cleared) {
            Partitions::Live(map) => map,
            Partitions::Cleared => return Ok(()),
        };
        for slot in map.into_values() {
            if let PartitionSlot::Live(partition) = slot {
                self.flush_partition(writer, partition)?;
            }
        }
        Ok(())
    }

    fn flush_partition(
        &mut self,
        writer: &mut GraphWriter<'_>,
        partition: SymbolDataPartition,
    ) -> Result<()> {
        let SymbolDataPartition {
            document,
            definitions,
            references,
            reference_results,
            ..
        } = partition;

        if !definitions.is_empty() {
            let definition_result = self.ensure_definition_result(writer)?;
            let ids = definitions.iter().map(|(id, _)| *id).collect();
            writer.item(definition_result, ids, document, None)?;
        }
        for (property, ids) in references {
            if ids.is_empty() {
                continue;
            }
            let reference_result = self.ensure_reference_result(writer)?;
            writer.item(reference_result, ids, document, Some(property))?;
        }
        if !reference_results.is_empty() {
            let reference_result = self.ensure_reference_result(writer)?;
            writer.item(reference_result, reference_results, document, None)?;
        }
        Ok(())
    }
}

// ============================================================================
// Partition
// ============================================================================

/// Per-(symbol, document) shard of definitions and references. Flushed as
/// `item` edges exactly once, at shard end.
#[derive(Debug)]
pub struct SymbolDataPartition {
    #[allow(dead_code)]
    file: FileId,
    document: Id,
    definitions: Vec<(Id, Range)>,
    references: BTreeMap<ItemProperty, Vec<Id>>,
    /// Reference results this shard forwards to (method overrides,
    /// union/intersection elements).
    reference_results: Vec<Id>,
}

impl SymbolDataPartition {
    fn new(file: FileId, document: Id) -> Self {
        Self {
            file,
            document,
            definitions: Vec::new(),
            references: BTreeMap::new(),
            reference_results: Vec::new(),
        }
    }

    fn begin(&self) {
        tracing::trace!(file = self.file.0, document = self.document, "partition begin");
    }

    fn add_definition(&mut self, range_id: Id, range: Range) {
        self.definitions.push((range_id, range));
    }

    fn add_reference_range(&mut self, range_id: Id, property: ItemProperty) {
        self.references.entry(property).or_default().push(range_id);
    }

    fn add_reference_result(&mut self, reference_result: Id) {
        self.reference_results.push(reference_result);
    }

    /// Exact `[start, end)` match against recorded definition ranges.
    fn find_definition(&self, range: &Range) -> Option<Id> {
        self.definitions
            .iter()
            .find(|(_, recorded)| recorded == range)
            .map(|(id, _)| *id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::MemoryEmitter;
    use crate::protocol::{Edge, Element, Vertex};
    use lsp_types::Position;
    use std::collections::HashMap;

    struct TestContext {
        documents: HashMap<FileId, Id>,
        roots: HashMap<FileId, NodeId>,
        registrations: Vec<(NodeId, SymbolIndex)>,
    }

    impl TestContext {
        fn new(documents: &[(FileId, Id, NodeId)]) -> Self {
            Self {
                documents: documents.iter().map(|(f, d, _)| (*f, *d)).collect(),
                roots: documents.iter().map(|(f, _, r)| (*f, *r)).collect(),
                registrations: Vec::new(),
            }
        }
    }

    impl SymbolContext for TestContext {
        fn document_id(&self, file: FileId) -> Option<Id> {
            self.documents.get(&file).copied()
        }

        fn source_file_root(&self, file: FileId) -> NodeId {
            self.roots[&file]
        }

        fn manage_lifecycle(&mut self, node: NodeId, symbol: SymbolIndex) {
            self.registrations.push((node, symbol));
        }
    }

    fn range(line: u32, start: u32, end: u32) -> Range {
        Range::new(Position::new(line, start), Position::new(line, end))
    }

    fn symbol_id(name: &str) -> SymbolId {
        SymbolId(name.to_string())
    }

    #[test]
    fn standard_flush_emits_definition_and_reference_items() {
        let file = FileId(0);
        let root = NodeId(0);
        let mut sink = MemoryEmitter::new();
        let mut writer = GraphWriter::new(&mut sink, true);
        let mut ctx = TestContext::new(&[(file, 1, root)]);
        let store = SymbolStore::new();

        let mut data = SymbolData::new(
            &mut writer,
            symbol_id("foo"),
            SymbolIndex(0),
            None,
            SymbolVariant::Standard,
        )
        .unwrap();

        let def_range = range(0, 16, 19);
        let def_id = writer.range(def_range, None).unwrap();
        data.add_definition(&mut writer, &store, &mut ctx, file, def_id, def_range)
            .unwrap();
        let ref_id = writer.range(range(3, 0, 3), None).unwrap();
        data.add_reference(
            &mut writer,
            &store,
            &mut ctx,
            file,
            ref_id,
            ItemProperty::References,
        )
        .unwrap();

        let exhausted = data
            .node_processed(&mut writer, root, Some(file))
            .unwrap();
        assert!(!exhausted, "unscoped symbols survive file end");

        let entries = sink.entries();
        let items: Vec<_> = entries
            .iter()
            .filter_map(|e| match &e.data {
                Element::Edge(Edge::Item(item)) => Some(item.clone()),
                _ => None,
            })
            .collect();
        // one definition item, one definitions bucket, one references bucket
        assert_eq!(items.len(), 3);
        assert!(items.iter().all(|item| item.document == 1));
        assert_eq!(
            items
                .iter()
                .filter(|item| item.property == Some(ItemProperty::References))
                .count(),
            1
        );
        assert_eq!(
            entries
                .iter()
                .filter(|e| matches!(e.data, Element::Vertex(Vertex::DefinitionResult)))
                .count(),
            1
        );
        assert_eq!(
            entries
                .iter()
                .filter(|e| matches!(e.data, Element::Vertex(Vertex::ReferenceResult)))
                .count(),
            1
        );
    }

    #[test]
    fn scoped_symbol_is_exhausted_at_scope_end() {
        let file = FileId(0);
        let root = NodeId(0);
        let block = NodeId(7);
        let mut sink = MemoryEmitter::new();
        let mut writer = GraphWriter::new(&mut sink, true);
        let mut ctx = TestContext::new(&[(file, 1, root)]);
        let store = SymbolStore::new();

        let mut data = SymbolData::new(
            &mut writer,
            symbol_id("local"),
            SymbolIndex(0),
            Some(block),
            SymbolVariant::Standard,
        )
        .unwrap();

        let def_range = range(2, 8, 9);
        let def_id = writer.range(def_range, None).unwrap();
        data.add_definition(&mut writer, &store, &mut ctx, file, def_id, def_range)
            .unwrap();
        assert_eq!(ctx.registrations, vec![(block, SymbolIndex(0))]);

        let exhausted = data.node_processed(&mut writer, block, None).unwrap();
        assert!(exhausted);
    }

    #[test]
    #[should_panic(expected = "has been cleared")]
    fn cleared_symbol_rejects_new_ranges() {
        let file = FileId(0);
        let block = NodeId(7);
        let mut sink = MemoryEmitter::new();
        let mut writer = GraphWriter::new(&mut sink, true);
        let mut ctx = TestContext::new(&[(file, 1, NodeId(0))]);
        let store = SymbolStore::new();

        let mut data = SymbolData::new(
            &mut writer,
            symbol_id("local"),
            SymbolIndex(0),
            Some(block),
            SymbolVariant::Standard,
        )
        .unwrap();
        let def_range = range(2, 8, 9);
        let def_id = writer.range(def_range, None).unwrap();
        data.add_definition(&mut writer, &store, &mut ctx, file, def_id, def_range)
            .unwrap();
        data.node_processed(&mut writer, block, None).unwrap();

        let ref_id = writer.range(range(3, 0, 1), None).unwrap();
        let _ = data.add_reference(
            &mut writer,
            &store,
            &mut ctx,
            file,
            ref_id,
            ItemProperty::References,
        );
    }

    #[test]
    #[should_panic(expected = "must resolve references through its target")]
    fn alias_never_owns_a_reference_result() {
        let mut sink = MemoryEmitter::new();
        let mut writer = GraphWriter::new(&mut sink, true);
        let mut store = SymbolStore::new();
        let target = SymbolData::new(
            &mut writer,
            symbol_id("x"),
            SymbolIndex(0),
            None,
            SymbolVariant::Standard,
        )
        .unwrap();
        let target_index = store.insert(target);

        let mut alias = SymbolData::new(
            &mut writer,
            symbol_id("y"),
            SymbolIndex(1),
            None,
            SymbolVariant::Aliased {
                target: target_index,
                rename: true,
            },
        )
        .unwrap();
        let _ = alias.ensure_reference_result(&mut writer);
    }
}
