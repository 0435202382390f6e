use super::local::LocalSymbolTable;
use super::table::SymbolTable;
use super::token::{Sid, SymbolToken};
use crate::error::{IonError, IonResult};

/// A local table presented as an importable shared table.
///
/// The system range of the wrapped table is hidden: SID 1 of the adapter is
/// the first SID after the wrapped table's system symbols. The wrapped table
/// is a read-only snapshot taken at construction.
#[derive(Debug)]
pub struct LocalSymbolTableImportAdapter {
    delegate: LocalSymbolTable,
    system_max_id: Sid,
}

impl LocalSymbolTableImportAdapter {
    pub fn of(table: &LocalSymbolTable) -> Self {
        let mut delegate = table.clone();
        delegate.make_read_only();
        let system_max_id = delegate.system_table().max_id();
        Self {
            delegate,
            system_max_id,
        }
    }

    pub fn delegate(&self) -> &LocalSymbolTable {
        &self.delegate
    }

    pub fn max_id(&self) -> Sid {
        self.delegate.max_id() - self.system_max_id
    }

    pub fn imported_max_id(&self) -> Sid {
        self.delegate.imported_max_id() - self.system_max_id
    }

    pub fn imported_tables(&self) -> &[SymbolTable] {
        self.delegate.imported_tables()
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        Ok(self
            .delegate
            .find_non_system_symbol(text)?
            .map(|sid| sid - self.system_max_id))
    }

    pub fn find(&self, text: &str) -> IonResult<Option<SymbolToken>> {
        Ok(self
            .find_symbol(text)?
            .map(|sid| SymbolToken::new(text, sid)))
    }

    pub fn find_known_symbol(&self, sid: Sid) -> IonResult<Option<&str>> {
        if sid == 0 {
            return Err(IonError::InvalidSid(sid));
        }
        match sid.checked_add(self.system_max_id) {
            Some(sid) => self.delegate.find_known_symbol(sid),
            None => Ok(None),
        }
    }

    pub fn intern(&self, text: &str) -> IonResult<SymbolToken> {
        if text.is_empty() {
            return Err(IonError::ReadOnly);
        }
        self.find(text)?.ok_or(IonError::ReadOnly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_hide_the_system_range() {
        let mut table = LocalSymbolTable::system();
        table.intern("a").unwrap();
        table.intern("b").unwrap();
        let adapter = LocalSymbolTableImportAdapter::of(&table);
        assert_eq!(adapter.max_id(), 2);
        assert_eq!(adapter.find_known_symbol(1), Ok(Some("a")));
        assert_eq!(adapter.find_known_symbol(2), Ok(Some("b")));
        assert_eq!(adapter.find_known_symbol(3), Ok(None));
        assert_eq!(adapter.find_symbol("b"), Ok(Some(2)));
        assert_eq!(adapter.find_symbol("name"), Ok(None));
        assert_eq!(adapter.intern("c"), Err(IonError::ReadOnly));
    }

    #[test]
    fn adapter_is_a_snapshot() {
        let mut table = LocalSymbolTable::system();
        table.intern("a").unwrap();
        let adapter = LocalSymbolTableImportAdapter::of(&table);
        table.intern("later").unwrap();
        assert_eq!(adapter.max_id(), 1);
        assert_eq!(adapter.find_symbol("later"), Ok(None));
        assert!(!table.is_read_only());
        assert!(adapter.delegate().is_read_only());
    }
}
