//! Import list of a local symbol table.
//!
//! Imported tables occupy contiguous SID ranges in declaration order, the
//! system table first. `base_sids[i]` is the SID just below table `i`'s range.

use std::sync::Arc;

use super::shared::SharedSymbolTable;
use super::table::SymbolTable;
use super::token::{Sid, SymbolToken};
use crate::error::{IonError, IonResult};

#[derive(Debug, Clone)]
pub struct LocalSymbolTableImports {
    system: Arc<SharedSymbolTable>,
    tables: Vec<SymbolTable>,
    base_sids: Vec<Sid>,
    max_id: Sid,
}

impl LocalSymbolTableImports {
    /// Builds the import list; `tables[0]` must be a system table.
    pub fn new(tables: Vec<SymbolTable>) -> IonResult<Self> {
        let system = match tables.first() {
            Some(SymbolTable::System(system)) => system.clone(),
            _ => {
                return Err(IonError::IllegalImport(
                    "the first import must be a system symbol table".to_owned(),
                ))
            }
        };
        let mut base_sids = Vec::with_capacity(tables.len());
        let mut max_id: Sid = 0;
        for (i, table) in tables.iter().enumerate() {
            if i > 0 && !table.is_importable() {
                return Err(IonError::IllegalImport(
                    "only non-system shared tables can be imported".to_owned(),
                ));
            }
            base_sids.push(max_id);
            max_id = max_id.checked_add(table.max_id()).ok_or_else(|| {
                IonError::MalformedImport(format!(
                    "imports declare more than {} symbols",
                    Sid::MAX
                ))
            })?;
        }
        Ok(Self {
            system,
            tables,
            base_sids,
            max_id,
        })
    }

    /// Builds the import list from `system` followed by `imports`.
    pub fn with_system(
        system: Arc<SharedSymbolTable>,
        imports: impl IntoIterator<Item = SymbolTable>,
    ) -> IonResult<Self> {
        let mut tables = vec![SymbolTable::System(system)];
        tables.extend(imports);
        Self::new(tables)
    }

    /// Import list holding only the system table.
    pub fn system_only(system: Arc<SharedSymbolTable>) -> Self {
        let max_id = system.max_id();
        Self {
            system: system.clone(),
            tables: vec![SymbolTable::System(system)],
            base_sids: vec![0],
            max_id,
        }
    }

    pub fn max_id(&self) -> Sid {
        self.max_id
    }

    pub fn system_table(&self) -> &Arc<SharedSymbolTable> {
        &self.system
    }

    /// All imports, system table included.
    pub fn tables(&self) -> &[SymbolTable] {
        &self.tables
    }

    /// Imports after the system table.
    pub fn imported_tables(&self) -> &[SymbolTable] {
        &self.tables[1..]
    }

    pub fn find_known_symbol(&self, sid: Sid) -> IonResult<Option<&str>> {
        if sid == 0 {
            return Err(IonError::InvalidSid(sid));
        }
        if sid > self.max_id {
            return Ok(None);
        }
        let i = self.base_sids.partition_point(|base| *base < sid) - 1;
        self.tables[i].find_known_symbol(sid - self.base_sids[i])
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        self.find_from(0, text)
    }

    pub fn find(&self, text: &str) -> IonResult<Option<SymbolToken>> {
        Ok(self
            .find_symbol(text)?
            .map(|sid| SymbolToken::new(text, sid)))
    }

    /// Like [`Self::find_symbol`] but skips the system table.
    pub(crate) fn find_non_system_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        self.find_from(1, text)
    }

    fn find_from(&self, start: usize, text: &str) -> IonResult<Option<Sid>> {
        if text.is_empty() {
            return Err(IonError::EmptySymbolText);
        }
        for (table, base) in self.tables.iter().zip(&self.base_sids).skip(start) {
            if let Some(sid) = table.find_symbol(text)? {
                return Ok(Some(base + sid));
            }
        }
        Ok(None)
    }

    /// Same length and the same table instances, position by position.
    pub fn equal_imports(&self, other: &LocalSymbolTableImports) -> bool {
        self.tables.len() == other.tables.len()
            && self
                .tables
                .iter()
                .zip(&other.tables)
                .all(|(a, b)| a.same_table(b))
    }
}
