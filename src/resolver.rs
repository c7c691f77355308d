//! Resolver strategies: how a raw symbol maps onto a symbol-data variant.
//!
//! Selection is keyed on a single property of the symbol. The strategies also
//! answer where a symbol's declarations live, which files own it, and which
//! file its partition is scoped to.

use crate::semantic::{LanguageService, SymbolFlags};
use crate::types::{FileId, NodeId, SymbolRef};

/// The four closed strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverKind {
    Standard,
    TypeAlias,
    Method,
    Transient,
}

impl ResolverKind {
    /// Select the strategy for a raw symbol.
    pub fn select(flags: SymbolFlags) -> Self {
        if flags.contains(SymbolFlags::ALIAS) {
            Self::TypeAlias
        } else if flags.contains(SymbolFlags::METHOD) {
            Self::Method
        } else if flags.contains(SymbolFlags::TRANSIENT) {
            Self::Transient
        } else {
            Self::Standard
        }
    }

    /// Whether the strategy cannot operate without an owning source file.
    pub fn requires_source_file(self) -> bool {
        matches!(self, Self::Method | Self::Transient)
    }

    /// Declaration nodes of the symbol. Transient symbols have no persistent
    /// declarations; the lookup location stands in for them.
    pub fn declaration_nodes(
        self,
        service: &dyn LanguageService,
        symbol: SymbolRef,
        location: Option<NodeId>,
    ) -> Vec<NodeId> {
        match self {
            Self::Transient => location.into_iter().collect(),
            _ => service.symbol_declarations(symbol),
        }
    }

    /// Unique owning files of the symbol, in declaration order.
    pub fn source_files(
        self,
        service: &dyn LanguageService,
        symbol: SymbolRef,
        location: Option<NodeId>,
    ) -> Vec<FileId> {
        let mut files = Vec::new();
        for node in self.declaration_nodes(service, symbol, location) {
            let file = service.node_file(node);
            if !files.contains(&file) {
                files.push(file);
            }
        }
        files
    }

    /// The file a multi-file symbol's partition is scoped to. Pinning it to
    /// the first owning file keeps dumps stable across re-indexing.
    pub fn partition_scope(files: &[FileId]) -> FileId {
        files[0]
    }
}
