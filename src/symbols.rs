//! Memoized queries over the semantic oracle.
//!
//! Base-class lookups and export-path computation are pure functions of the
//! checker state, so they are cached. The caches are bounded to cap memory on
//! large programs; sizing is a tuning parameter, not a contract.

use crate::semantic::{LanguageService, SymbolFlags};
use crate::types::{SymbolId, SymbolRef};
use lru::LruCache;
use std::num::NonZeroUsize;

const CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(2048).unwrap();
const MEMBER_CACHE_CAPACITY: NonZeroUsize = NonZeroUsize::new(64).unwrap();

/// Cached symbol-level queries shared by the resolver strategies and the
/// moniker assignment.
pub struct Symbols<'a> {
    service: &'a dyn LanguageService,
    base_symbols: LruCache<SymbolId, Option<Vec<SymbolRef>>>,
    /// Outer key: symbol; inner key: member name. Negative results are
    /// cached as empty lists and exposed as absent.
    base_members: LruCache<SymbolId, LruCache<String, Vec<SymbolRef>>>,
    export_paths: LruCache<SymbolId, Option<String>>,
}

impl<'a> Symbols<'a> {
    pub fn new(service: &'a dyn LanguageService) -> Self {
        Self {
            service,
            base_symbols: LruCache::new(CACHE_CAPACITY),
            base_members: LruCache::new(CACHE_CAPACITY),
            export_paths: LruCache::new(CACHE_CAPACITY),
        }
    }

    // ------------------------------------------------------------------
    // Base symbols
    // ------------------------------------------------------------------

    /// Direct base symbols of a class or interface.
    ///
    /// Absent for type literals, for symbols without declarations, and when
    /// there are no bases; the distinction between absent and empty drives
    /// the method resolver.
    pub fn base_symbols(&mut self, symbol: SymbolRef) -> Option<Vec<SymbolRef>> {
        let key = self.service.symbol_id(symbol);
        if let Some(cached) = self.base_symbols.get(&key) {
            return cached.clone();
        }
        let computed = self.compute_base_symbols(symbol);
        self.base_symbols.put(key, computed.clone());
        computed
    }

    fn compute_base_symbols(&mut self, symbol: SymbolRef) -> Option<Vec<SymbolRef>> {
        let flags = self.service.symbol_flags(symbol);
        if flags.contains(SymbolFlags::TYPE_LITERAL) {
            return None;
        }
        let declarations = self.service.symbol_declarations(symbol);
        if declarations.is_empty() {
            return None;
        }
        let bases: Vec<SymbolRef> = if flags.contains(SymbolFlags::INTERFACE) {
            self.service
                .declared_base_types(symbol)
                .into_iter()
                .filter_map(|ty| self.service.type_symbol(ty))
                .collect()
        } else if flags.contains(SymbolFlags::CLASS) {
            declarations
                .iter()
                .flat_map(|decl| self.service.heritage_nodes(*decl))
                .filter_map(|node| self.service.symbol_at(node))
                .collect()
        } else {
            return None;
        };
        if bases.is_empty() { None } else { Some(bases) }
    }

    // ------------------------------------------------------------------
    // Base members
    // ------------------------------------------------------------------

    /// All members named `name` found in the transitive bases of `symbol`.
    ///
    /// A base that declares the member contributes it; one that does not is
    /// searched deeper.
    pub fn find_base_members(&mut self, symbol: SymbolRef, name: &str) -> Option<Vec<SymbolRef>> {
        let key = self.service.symbol_id(symbol);
        if let Some(inner) = self.base_members.get_mut(&key) {
            if let Some(members) = inner.get(name) {
                return if members.is_empty() {
                    None
                } else {
                    Some(members.clone())
                };
            }
        }

        let mut members = Vec::new();
        self.collect_base_members(symbol, name, &mut members);

        let inner = self
            .base_members
            .get_or_insert_mut(key, || LruCache::new(MEMBER_CACHE_CAPACITY));
        inner.put(name.to_string(), members.clone());

        if members.is_empty() { None } else { Some(members) }
    }

    fn collect_base_members(&mut self, symbol: SymbolRef, name: &str, out: &mut Vec<SymbolRef>) {
        let Some(bases) = self.base_symbols(symbol) else {
            return;
        };
        for base in bases {
            match self.service.symbol_member(base, name) {
                Some(member) => out.push(member),
                None => self.collect_base_members(base, name, out),
            }
        }
    }

    // ------------------------------------------------------------------
    // Export paths
    // ------------------------------------------------------------------

    /// Dotted export path of the symbol, rooted at its source-file module.
    ///
    /// `Some("")` for the source-file module symbol itself, `None` when the
    /// symbol is not reachable through exports.
    pub fn export_path(&mut self, symbol: SymbolRef) -> Option<String> {
        let key = self.service.symbol_id(symbol);
        if let Some(cached) = self.export_paths.get(&key) {
            return cached.clone();
        }
        let computed = self.compute_export_path(symbol);
        self.export_paths.put(key, computed.clone());
        computed
    }

    fn compute_export_path(&mut self, symbol: SymbolRef) -> Option<String> {
        let flags = self.service.symbol_flags(symbol);
        if flags.contains(SymbolFlags::SOURCE_FILE) {
            return Some(String::new());
        }
        let parent = self.service.symbol_parent(symbol)?;
        let parent_path = self.export_path(parent)?;
        let name = self.service.symbol_name(symbol);
        let parent_flags = self.service.symbol_flags(parent);
        let exported = parent_flags.intersects(SymbolFlags::CLASS | SymbolFlags::INTERFACE)
            || self.service.symbol_export(parent, &name) == Some(symbol);
        if !exported {
            return None;
        }
        if parent_path.is_empty() {
            Some(name)
        } else {
            Some(format!("{parent_path}.{name}"))
        }
    }
}
