use std::sync::Arc;

use super::shared::SharedSymbolTable;
use super::token::{Sid, SymbolToken};
use crate::error::{IonError, IonResult};

/// Placeholder for an import the catalog could not satisfy exactly.
///
/// Occupies exactly `max_id` SIDs. When a related table (another version or
/// a shorter/longer copy) was found it answers lookups for SIDs within the
/// declared range; everything else has unknown text.
#[derive(Debug)]
pub struct SubstituteSymbolTable {
    name: String,
    version: u32,
    max_id: Sid,
    original: Option<Arc<SharedSymbolTable>>,
}

impl SubstituteSymbolTable {
    /// Substitute with no backing table: every SID has unknown text.
    pub fn new(name: impl Into<String>, version: u32, max_id: Sid) -> Self {
        Self {
            name: name.into(),
            version,
            max_id,
            original: None,
        }
    }

    /// Substitute backed by a non-matching table, clamped to `max_id`.
    pub fn wrapping(original: Arc<SharedSymbolTable>, version: u32, max_id: Sid) -> Self {
        Self {
            name: original.name().to_owned(),
            version,
            max_id,
            original: Some(original),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn max_id(&self) -> Sid {
        self.max_id
    }

    pub fn original(&self) -> Option<&Arc<SharedSymbolTable>> {
        self.original.as_ref()
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        if text.is_empty() {
            return Err(IonError::EmptySymbolText);
        }
        let Some(original) = &self.original else {
            return Ok(None);
        };
        Ok(original
            .find_symbol(text)?
            .filter(|sid| *sid <= self.max_id))
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
        if sid > self.max_id {
            return Ok(None);
        }
        match &self.original {
            Some(original) => original.find_known_symbol(sid),
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
    fn without_original_everything_is_unknown() {
        let table = SubstituteSymbolTable::new("missing", 3, 5);
        assert_eq!(table.max_id(), 5);
        assert_eq!(table.find_known_symbol(1), Ok(None));
        assert_eq!(table.find_symbol("a"), Ok(None));
        assert_eq!(table.intern("a"), Err(IonError::ReadOnly));
    }

    #[test]
    fn original_is_clamped_to_declared_max_id() {
        let original =
            Arc::new(SharedSymbolTable::new("T", 2, None, ["a", "b", "c", "d"]).unwrap());
        let table = SubstituteSymbolTable::wrapping(original, 1, 2);
        assert_eq!(table.name(), "T");
        assert_eq!(table.version(), 1);
        assert_eq!(table.find_known_symbol(2), Ok(Some("b")));
        assert_eq!(table.find_known_symbol(3), Ok(None));
        assert_eq!(table.find_symbol("c"), Ok(None));
        assert_eq!(table.find_symbol("a"), Ok(Some(1)));
    }

    #[test]
    fn longer_declaration_pads_with_unknowns() {
        let original = Arc::new(SharedSymbolTable::new("T", 1, None, ["a"]).unwrap());
        let table = SubstituteSymbolTable::wrapping(original, 1, 4);
        assert_eq!(table.max_id(), 4);
        assert_eq!(table.find_known_symbol(1), Ok(Some("a")));
        assert_eq!(table.find_known_symbol(4), Ok(None));
    }
}
