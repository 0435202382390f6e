//! Catalogs resolve import declarations to shared symbol tables.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use super::shared::SharedSymbolTable;
use crate::error::{IonError, IonResult};

/// Source of shared symbol tables keyed by `(name, version)`.
pub trait Catalog: fmt::Debug + Send + Sync {
    /// The table with exactly this name and version.
    fn get_table(&self, name: &str, version: u32) -> Option<Arc<SharedSymbolTable>>;

    /// The exact version when present, otherwise the highest available
    /// version of `name`.
    fn get_best_match(&self, name: &str, version: u32) -> Option<Arc<SharedSymbolTable>>;
}

/// Catalog that knows no tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyCatalog;

impl Catalog for EmptyCatalog {
    fn get_table(&self, _name: &str, _version: u32) -> Option<Arc<SharedSymbolTable>> {
        None
    }

    fn get_best_match(&self, _name: &str, _version: u32) -> Option<Arc<SharedSymbolTable>> {
        None
    }
}

/// In-memory catalog.
#[derive(Debug, Clone, Default)]
pub struct SimpleCatalog {
    tables: HashMap<String, BTreeMap<u32, Arc<SharedSymbolTable>>>,
}

impl SimpleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table`, replacing any table with the same name and version.
    pub fn put_table(&mut self, table: impl Into<Arc<SharedSymbolTable>>) -> IonResult<()> {
        let table = table.into();
        if table.is_system() {
            return Err(IonError::IllegalArgument(
                "the system symbol table is implicit and cannot be registered".to_owned(),
            ));
        }
        self.tables
            .entry(table.name().to_owned())
            .or_default()
            .insert(table.version(), table);
        Ok(())
    }

    pub fn remove_table(&mut self, name: &str, version: u32) -> Option<Arc<SharedSymbolTable>> {
        let versions = self.tables.get_mut(name)?;
        let removed = versions.remove(&version);
        if versions.is_empty() {
            self.tables.remove(name);
        }
        removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<SharedSymbolTable>> + '_ {
        self.tables.values().flat_map(|versions| versions.values())
    }

    pub fn len(&self) -> usize {
        self.tables.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Catalog for SimpleCatalog {
    fn get_table(&self, name: &str, version: u32) -> Option<Arc<SharedSymbolTable>> {
        self.tables.get(name)?.get(&version).cloned()
    }

    fn get_best_match(&self, name: &str, version: u32) -> Option<Arc<SharedSymbolTable>> {
        let versions = self.tables.get(name)?;
        versions
            .get(&version)
            .or_else(|| versions.values().next_back())
            .cloned()
    }
}
