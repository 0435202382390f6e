//! Shared symbol tables, including the Ion 1.0 system table.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use super::token::{Sid, SymbolToken};
use crate::constants::{ION, SYSTEM_SYMBOLS};
use crate::error::{IonError, IonResult};

/// Immutable, named, versioned symbol table.
///
/// Slots may be empty (`None`) when the table was read from a serialized
/// form containing non-string or empty entries; such SIDs have unknown text.
#[derive(Debug, PartialEq, Eq)]
pub struct SharedSymbolTable {
    name: String,
    version: u32,
    symbols: Vec<Option<String>>,
    lookup: HashMap<String, Sid>,
}

impl SharedSymbolTable {
    /// The process-wide Ion 1.0 system table (`$ion`, version 1).
    pub fn system() -> Arc<SharedSymbolTable> {
        static SYSTEM: OnceLock<Arc<SharedSymbolTable>> = OnceLock::new();
        SYSTEM
            .get_or_init(|| {
                let symbols = SYSTEM_SYMBOLS.iter().map(|s| Some((*s).to_owned()));
                Arc::new(Self::from_slots(ION.to_owned(), 1, symbols.collect()))
            })
            .clone()
    }

    /// Builds a shared table from optional prior version plus new symbols.
    ///
    /// The prior version's slots are copied first (gaps included); then each
    /// new symbol that is not empty and not already present is appended.
    pub fn new<I, S>(
        name: impl Into<String>,
        version: u32,
        prior: Option<&SharedSymbolTable>,
        symbols: I,
    ) -> IonResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        if name.is_empty() {
            return Err(IonError::IllegalArgument(
                "shared symbol table name must be non-empty".to_owned(),
            ));
        }
        if version < 1 {
            return Err(IonError::IllegalArgument(format!(
                "shared symbol table version must be at least 1, got {version}"
            )));
        }
        let mut slots = Vec::new();
        if let Some(prior) = prior {
            if prior.name != name {
                return Err(IonError::IllegalArgument(format!(
                    "prior table {:?} does not share the name {name:?}",
                    prior.name
                )));
            }
            if version <= prior.version {
                return Err(IonError::IllegalArgument(format!(
                    "version {version} must follow prior version {}",
                    prior.version
                )));
            }
            slots.extend(prior.symbols.iter().cloned());
        }
        let mut table = Self::from_slots(name, version, slots);
        for text in symbols {
            let text = text.as_ref();
            if text.is_empty() || table.lookup.contains_key(text) {
                continue;
            }
            table.push(text.to_owned());
        }
        Ok(table)
    }

    /// Builds a table from raw slots; the lowest SID wins for duplicate text.
    pub(crate) fn from_slots(name: String, version: u32, symbols: Vec<Option<String>>) -> Self {
        let mut lookup = HashMap::with_capacity(symbols.len());
        for (i, slot) in symbols.iter().enumerate() {
            if let Some(text) = slot {
                lookup.entry(text.clone()).or_insert(i as Sid + 1);
            }
        }
        Self {
            name,
            version,
            symbols,
            lookup,
        }
    }

    fn push(&mut self, text: String) {
        let sid = self.symbols.len() as Sid + 1;
        self.lookup.insert(text.clone(), sid);
        self.symbols.push(Some(text));
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn max_id(&self) -> Sid {
        self.symbols.len() as Sid
    }

    pub fn is_system(&self) -> bool {
        self.name == ION
    }

    /// `$ion_1_0` for the system table, `None` otherwise.
    pub fn ion_version_id(&self) -> Option<&'static str> {
        self.is_system().then_some(crate::constants::ION_1_0)
    }

    pub fn find_symbol(&self, text: &str) -> IonResult<Option<Sid>> {
        if text.is_empty() {
            return Err(IonError::EmptySymbolText);
        }
        Ok(self.lookup.get(text).copied())
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
        Ok(self
            .symbols
            .get(sid as usize - 1)
            .and_then(|slot| slot.as_deref()))
    }

    /// Shared tables never grow; a missing symbol fails with `ReadOnly`.
    pub fn intern(&self, text: &str) -> IonResult<SymbolToken> {
        if text.is_empty() {
            return Err(IonError::ReadOnly);
        }
        self.find(text)?.ok_or(IonError::ReadOnly)
    }

    /// Declared slots in SID order, `None` for gaps.
    pub fn declared_symbols(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.symbols.iter().map(|slot| slot.as_deref())
    }
}
