//! [`SymbolTable`]: shared handle over every table variant.

use std::sync::Arc;

use super::adapter::LocalSymbolTableImportAdapter;
use super::local::LocalSymbolTable;
use super::shared::SharedSymbolTable;
use super::substitute::SubstituteSymbolTable;
use super::token::{Sid, SymbolToken};
use crate::error::{IonError, IonResult};

/// A symbol table of any kind.
///
/// Cloning is cheap: every variant holds its table behind an [`Arc`], so
/// imports, readers and writers share one instance. Interning into a
/// [`SymbolTable::Local`] copies the table first when other handles exist.
#[derive(Debug, Clone)]
pub enum SymbolTable {
    System(Arc<SharedSymbolTable>),
    Shared(Arc<SharedSymbolTable>),
    Substitute(Arc<SubstituteSymbolTable>),
    Local(Arc<LocalSymbolTable>),
    ImportedLocal(Arc<LocalSymbolTableImportAdapter>),
}

impl SymbolTable {
    pub fn system() -> Self {
        SymbolTable::System(SharedSymbolTable::system())
    }

    /// Wraps a shared table, classifying `$ion` as the system table.
    pub fn shared(table: Arc<SharedSymbolTable>) -> Self {
        if table.is_system() {
            SymbolTable::System(table)
        } else {
            SymbolTable::Shared(table)
        }
    }

    pub fn local(table: LocalSymbolTable) -> Self {
        SymbolTable::Local(Arc::new(table))
    }

    pub fn substitute(table: SubstituteSymbolTable) -> Self {
        SymbolTable::Substitute(Arc::new(table))
    }

    /// Wraps a snapshot of `table` so it can be imported by other local tables.
    pub fn imported_local(table: &LocalSymbolTable) -> Self {
        SymbolTable::ImportedLocal(Arc::new(LocalSymbolTableImportAdapter::of(table)))
    }

    pub fn is_system(&self) -> bool {
        matches!(self, SymbolTable::System(_))
    }

    pub fn is_local(&self) -> bool {
        matches!(self, SymbolTable::Local(_))
    }

    pub fn is_substitute(&self) -> bool {
        matches!(self, SymbolTable::Substitute(_))
    }

    /// Every variant but `Local` behaves as a shared table.
    pub fn is_shared(&self) -> bool {
        !self.is_local()
    }

    /// Only non-system shared tables may appear past the first import slot.
    pub fn is_importable(&self) -> bool {
        matches!(
            self,
            SymbolTable::Shared(_) | SymbolTable::Substitute(_) | SymbolTable::ImportedLocal(_)
        )
    }

    pub fn is_read_only(&self) -> bool {
        match self {
            SymbolTable::Local(table) => table.is_read_only(),
            _ => true,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => Some(t.name()),
            SymbolTable::Substitute(t) => Some(t.name()),
            SymbolTable::Local(_) | SymbolTable::ImportedLocal(_) => None,
        }
    }

    /// Version of a shared table; `0` for local tables.
    pub fn version(&self) -> u32 {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.version(),
            SymbolTable::Substitute(t) => t.version(),
            SymbolTable::Local(_) | SymbolTable::ImportedLocal(_) => 0,
        }
    }

    pub fn max_id(&self) -> Sid {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.max_id(),
            SymbolTable::Substitute(t) => t.max_id(),
            SymbolTable::Local(t) => t.max_id(),
            SymbolTable::ImportedLocal(t) => t.max_id(),
        }
    }

    /// Highest SID contributed by imports rather than local declarations.
    pub fn imported_max_id(&self) -> Sid {
        match self {
            SymbolTable::Local(t) => t.imported_max_id(),
            SymbolTable::ImportedLocal(t) => t.imported_max_id(),
            _ => 0,
        }
    }

    pub fn ion_version_id(&self) -> Option<&'static str> {
        match self {
            SymbolTable::System(t) => t.ion_version_id(),
            _ => None,
        }
    }

    /// The system table in effect; `None` for shared tables other than `$ion`.
    pub fn system_table(&self) -> Option<&Arc<SharedSymbolTable>> {
        match self {
            SymbolTable::System(t) => Some(t),
            SymbolTable::Local(t) => Some(t.system_table()),
            _ => None,
        }
    }

    /// Non-system imports, in declaration order.
    pub fn imported_tables(&self) -> &[SymbolTable] {
        match self {
            SymbolTable::Local(t) => t.imported_tables(),
            SymbolTable::ImportedLocal(t) => t.imported_tables(),
            _ => &[],
        }
    }

    pub fn as_local(&self) -> Option<&LocalSymbolTable> {
        match self {
            SymbolTable::Local(t) => Some(t),
            _ => None,
        }
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.find_symbol(text),
            SymbolTable::Substitute(t) => t.find_symbol(text),
            SymbolTable::Local(t) => t.find_symbol(text),
            SymbolTable::ImportedLocal(t) => t.find_symbol(text),
        }
    }

    pub fn find(&self, text: &str) -> IonResult<Option<SymbolToken>> {
        Ok(self
            .find_symbol(text)?
            .map(|sid| SymbolToken::new(text, sid)))
    }

    pub fn find_known_symbol(&self, sid: Sid) -> IonResult<Option<&str>> {
        match self {
            SymbolTable::System(t) | SymbolTable::Shared(t) => t.find_known_symbol(sid),
            SymbolTable::Substitute(t) => t.find_known_symbol(sid),
            SymbolTable::Local(t) => t.find_known_symbol(sid),
            SymbolTable::ImportedLocal(t) => t.find_known_symbol(sid),
        }
    }

    /// Returns the SID for `text`, adding it to a mutable local table.
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
        match self {
            SymbolTable::Local(table) => Arc::make_mut(table).intern_sid(text),
            _ => Err(IonError::ReadOnly),
        }
    }

    pub fn make_read_only(&mut self) {
        if let SymbolTable::Local(table) = self {
            if !table.is_read_only() {
                Arc::make_mut(table).make_read_only();
            }
        }
    }

    /// True when both handles point at the same table instance.
    pub fn same_table(&self, other: &SymbolTable) -> bool {
        match (self, other) {
            (SymbolTable::System(a), SymbolTable::System(b))
            | (SymbolTable::Shared(a), SymbolTable::Shared(b)) => Arc::ptr_eq(a, b),
            (SymbolTable::Substitute(a), SymbolTable::Substitute(b)) => Arc::ptr_eq(a, b),
            (SymbolTable::Local(a), SymbolTable::Local(b)) => Arc::ptr_eq(a, b),
            (SymbolTable::ImportedLocal(a), SymbolTable::ImportedLocal(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<LocalSymbolTable> for SymbolTable {
    fn from(table: LocalSymbolTable) -> Self {
        SymbolTable::local(table)
    }
}

impl From<Arc<SharedSymbolTable>> for SymbolTable {
    fn from(table: Arc<SharedSymbolTable>) -> Self {
        SymbolTable::shared(table)
    }
}

impl From<SharedSymbolTable> for SymbolTable {
    fn from(table: SharedSymbolTable) -> Self {
        SymbolTable::shared(Arc::new(table))
    }
}

impl From<SubstituteSymbolTable> for SymbolTable {
    fn from(table: SubstituteSymbolTable) -> Self {
        SymbolTable::substitute(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_copies_shared_local_tables() {
        let mut first = SymbolTable::local(LocalSymbolTable::system());
        first.intern("a").unwrap();
        let snapshot = first.clone();
        let token = first.intern("b").unwrap();
        assert_eq!(token.sid(), Some(11));
        assert_eq!(snapshot.max_id(), 10);
        assert_eq!(first.max_id(), 11);
        assert!(!first.same_table(&snapshot));
    }

    #[test]
    fn shared_variants_are_read_only() {
        let mut system = SymbolTable::system();
        assert_eq!(system.intern("name").unwrap().sid(), Some(4));
        assert_eq!(system.intern("zzz"), Err(IonError::ReadOnly));
        assert!(system.is_read_only());
        assert!(!system.is_importable());
    }

    #[test]
    fn classification() {
        let shared = SymbolTable::from(SharedSymbolTable::new("s", 1, None, ["x"]).unwrap());
        assert!(shared.is_shared() && shared.is_importable() && !shared.is_system());
        assert_eq!(shared.name(), Some("s"));
        let local = SymbolTable::local(LocalSymbolTable::system());
        assert!(local.is_local() && !local.is_shared());
        assert_eq!(local.version(), 0);
        assert_eq!(SymbolTable::system().ion_version_id(), Some("$ion_1_0"));
    }
}
