//! Local symbol tables.

use std::collections::HashMap;
use std::sync::Arc;

use super::imports::LocalSymbolTableImports;
use super::shared::SharedSymbolTable;
use super::table::SymbolTable;
use super::token::{Sid, SymbolToken};
use crate::error::{IonError, IonResult};

/// Stream-scoped symbol table: imports followed by locally declared symbols.
///
/// Local SIDs start at `imports.max_id() + 1`. Declared slots may be `None`
/// when the table was read from a stream with non-string or empty entries.
#[derive(Debug, Clone)]
pub struct LocalSymbolTable {
    imports: Arc<LocalSymbolTableImports>,
    symbols: Vec<Option<String>>,
    lookup: HashMap<String, Sid>,
    read_only: bool,
}

impl LocalSymbolTable {
    pub fn new(imports: impl Into<Arc<LocalSymbolTableImports>>) -> Self {
        Self::with_symbols(imports, Vec::new())
    }

    /// Local table over the default system table with no declared symbols.
    pub fn system() -> Self {
        Self::new(LocalSymbolTableImports::system_only(
            SharedSymbolTable::system(),
        ))
    }

    /// Builds a table with pre-declared slots. Empty text counts as a gap;
    /// for duplicate text the lowest SID wins. Slots past `Sid::MAX` are
    /// dropped.
    pub fn with_symbols(
        imports: impl Into<Arc<LocalSymbolTableImports>>,
        symbols: Vec<Option<String>>,
    ) -> Self {
        let imports = imports.into();
        let room = (Sid::MAX - imports.max_id()) as usize;
        if symbols.len() > room {
            log::warn!("dropping {} symbols past the SID space", symbols.len() - room);
        }
        let symbols: Vec<Option<String>> = symbols
            .into_iter()
            .take(room)
            .map(|slot| slot.filter(|text| !text.is_empty()))
            .collect();
        let mut lookup = HashMap::with_capacity(symbols.len());
        for (sid, slot) in (imports.max_id() + 1..).zip(symbols.iter()) {
            if let Some(text) = slot {
                lookup.entry(text.clone()).or_insert(sid);
            }
        }
        Self {
            imports,
            symbols,
            lookup,
            read_only: false,
        }
    }

    pub fn imports(&self) -> &Arc<LocalSymbolTableImports> {
        &self.imports
    }

    pub fn system_table(&self) -> &Arc<SharedSymbolTable> {
        self.imports.system_table()
    }

    pub fn imported_tables(&self) -> &[SymbolTable] {
        self.imports.imported_tables()
    }

    pub fn imported_max_id(&self) -> Sid {
        self.imports.max_id()
    }

    pub fn max_id(&self) -> Sid {
        self.imports
            .max_id()
            .saturating_add(Sid::try_from(self.symbols.len()).unwrap_or(Sid::MAX))
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn make_read_only(&mut self) {
        self.read_only = true;
    }

    /// Mutable copy sharing the same import list.
    pub fn make_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.read_only = false;
        copy
    }

    /// Locally declared slots in SID order, `None` for gaps.
    pub fn declared_symbols(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.symbols.iter().map(|slot| slot.as_deref())
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        if let Some(sid) = self.imports.find_symbol(text)? {
            return Ok(Some(sid));
        }
        Ok(self.lookup.get(text).copied())
    }

    pub fn find(&self, text: &str) -> IonResult<Option<SymbolToken>> {
        Ok(self
            .find_symbol(text)?
            .map(|sid| SymbolToken::new(text, sid)))
    }

    /// Lookup that ignores the system table; used when this table is imported.
    pub(crate) fn find_non_system_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        if let Some(sid) = self.imports.find_non_system_symbol(text)? {
            return Ok(Some(sid));
        }
        Ok(self.lookup.get(text).copied())
    }

    pub fn find_known_symbol(&self, sid: Sid) -> IonResult<Option<&str>> {
        if sid == 0 {
            return Err(IonError::InvalidSid(sid));
        }
        let imported = self.imports.max_id();
        if sid <= imported {
            return self.imports.find_known_symbol(sid);
        }
        Ok(self
            .symbols
            .get((sid - imported - 1) as usize)
            .and_then(|slot| slot.as_deref()))
    }

    /// Returns the existing SID for `text` or appends it as a new local symbol.
    pub fn intern(&mut self, text: &str) -> IonResult<SymbolToken> {
        let sid = self.intern_sid(text)?;
        Ok(SymbolToken::new(text, sid))
    }

    pub(crate) fn intern_sid(&mut self, text: &str) -> IonResult<Sid> {
        if !text.is_empty() {
            if let Some(sid) = self.find_symbol(text)? {
                return Ok(sid);
            }
        }
        if self.read_only {
            return Err(IonError::ReadOnly);
        }
        if text.is_empty() {
            return Err(IonError::EmptySymbolText);
        }
        let sid = self.max_id().checked_add(1).ok_or(IonError::SidOverflow)?;
        self.symbols.push(Some(text.to_owned()));
        self.lookup.insert(text.to_owned(), sid);
        log::trace!("interned {text:?} as ${sid}");
        Ok(sid)
    }

    /// Same import instances in the same order.
    pub fn equal_imports(&self, other: &LocalSymbolTable) -> bool {
        Arc::ptr_eq(&self.imports, &other.imports) || self.imports.equal_imports(&other.imports)
    }
}
