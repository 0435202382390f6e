//! Symbol tables as Ion values.
//!
//! A local table is written as `$ion_symbol_table::{imports: ..., symbols: [...]}`
//! and a shared table as `$ion_shared_symbol_table::{name, version, imports, symbols}`.
//! When a field repeats, its first non-null occurrence is used.

use std::sync::Arc;

use super::catalog::Catalog;
use super::imports::LocalSymbolTableImports;
use super::local::LocalSymbolTable;
use super::shared::SharedSymbolTable;
use super::substitute::SubstituteSymbolTable;
use super::table::SymbolTable;
use super::token::{Sid, SymbolToken};
use crate::constants::*;
use crate::element::{Element, IonType, Value};
use crate::error::{IonError, IonResult};

fn system_token(text: &'static str, sid: Sid) -> SymbolToken {
    SymbolToken::new(text, sid)
}

/// True when the first annotation is `$ion_symbol_table`.
pub fn is_local_table_image(element: &Element) -> bool {
    element.ion_type() == IonType::Struct
        && element
            .annotations
            .first()
            .is_some_and(|a| a.matches(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID))
}

/// First non-null value of the field `text` (SID `sid` when text is unknown).
fn field<'a>(fields: &'a [(SymbolToken, Element)], text: &str, sid: Sid) -> Option<&'a Element> {
    fields
        .iter()
        .find(|(name, value)| name.matches(text, sid) && !value.is_null())
        .map(|(_, value)| value)
}

fn symbol_slots(symbols: Option<&Element>) -> Vec<Option<String>> {
    match symbols.map(|element| &element.value) {
        Some(Value::List(items)) => items
            .iter()
            .map(|item| item.as_str().filter(|s| !s.is_empty()).map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    }
}

/// Builds the local table described by `image`.
///
/// `current` is the table in effect when the image was encountered; it
/// supplies the system table and, for `imports: $ion_symbol_table`, the
/// symbols being appended to.
pub fn local_table_from_element(
    image: &Element,
    current: &SymbolTable,
    catalog: &dyn Catalog,
) -> IonResult<LocalSymbolTable> {
    let fields = image.as_struct().ok_or_else(|| {
        IonError::IllegalArgument(format!(
            "a local symbol table must be a struct, found {}",
            image.ion_type()
        ))
    })?;
    let system = current
        .system_table()
        .cloned()
        .unwrap_or_else(SharedSymbolTable::system);

    let mut symbols = Vec::new();
    let imports = match field(fields, IMPORTS, IMPORTS_SID) {
        Some(value) if value.as_symbol().is_some_and(|s| s.matches(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID)) => {
            match current {
                SymbolTable::Local(previous) => {
                    symbols.extend(previous.declared_symbols().map(|s| s.map(str::to_owned)));
                    previous.imports().clone()
                }
                _ => Arc::new(LocalSymbolTableImports::system_only(system)),
            }
        }
        Some(Element {
            value: Value::List(items),
            ..
        }) => {
            let mut tables = Vec::with_capacity(items.len());
            for item in items {
                if let Some(table) = read_import(item, catalog)? {
                    tables.push(table);
                }
            }
            Arc::new(LocalSymbolTableImports::with_system(system, tables)?)
        }
        _ => Arc::new(LocalSymbolTableImports::system_only(system)),
    };
    symbols.extend(symbol_slots(field(fields, SYMBOLS, SYMBOLS_SID)));
    Ok(LocalSymbolTable::with_symbols(imports, symbols))
}

/// Resolves one import declaration against `catalog`.
///
/// Returns `None` for declarations that are ignored: non-structs, missing or
/// empty names, and `$ion`.
fn read_import(import: &Element, catalog: &dyn Catalog) -> IonResult<Option<SymbolTable>> {
    let Some(fields) = import.as_struct() else {
        return Ok(None);
    };
    let name = match field(fields, NAME, NAME_SID).and_then(Element::as_str) {
        Some(name) if !name.is_empty() && name != ION => name,
        _ => return Ok(None),
    };
    let version = field(fields, VERSION, VERSION_SID)
        .and_then(Element::as_i64)
        .filter(|v| *v >= 1)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));
    let max_id = field(fields, MAX_ID, MAX_ID_SID)
        .and_then(Element::as_i64)
        .filter(|m| *m >= 0)
        .map(|m| Sid::try_from(m).unwrap_or(Sid::MAX));

    let table = match (catalog.get_table(name, version), max_id) {
        (Some(exact), None) => SymbolTable::Shared(exact),
        (Some(exact), Some(max_id)) if exact.max_id() == max_id => SymbolTable::Shared(exact),
        (Some(exact), Some(max_id)) => {
            log::warn!(
                "import {name} version {version} declares max_id {max_id}, catalog has {}",
                exact.max_id()
            );
            SymbolTable::substitute(SubstituteSymbolTable::wrapping(exact, version, max_id))
        }
        (None, None) => {
            return Err(IonError::MalformedImport(format!(
                "import {name} version {version} is not in the catalog and declares no max_id"
            )))
        }
        (None, Some(max_id)) => match catalog.get_best_match(name, version) {
            Some(other) => {
                log::warn!(
                    "import {name} version {version} substituted by version {}",
                    other.version()
                );
                SymbolTable::substitute(SubstituteSymbolTable::wrapping(other, version, max_id))
            }
            None => {
                log::warn!("import {name} version {version} not found, {max_id} SIDs unknown");
                SymbolTable::substitute(SubstituteSymbolTable::new(name, version, max_id))
            }
        },
    };
    Ok(Some(table))
}

/// Builds a shared table from its serialized form.
pub fn shared_table_from_element(image: &Element) -> IonResult<SharedSymbolTable> {
    let fields = image.as_struct().ok_or_else(|| {
        IonError::MalformedSharedTable(format!("expected a struct, found {}", image.ion_type()))
    })?;
    let name = field(fields, NAME, NAME_SID)
        .and_then(Element::as_str)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| IonError::MalformedSharedTable("missing or empty name".to_owned()))?;
    let version = field(fields, VERSION, VERSION_SID)
        .and_then(Element::as_i64)
        .filter(|v| *v >= 1)
        .map_or(1, |v| u32::try_from(v).unwrap_or(u32::MAX));
    let symbols = symbol_slots(field(fields, SYMBOLS, SYMBOLS_SID));
    Ok(SharedSymbolTable::from_slots(name.to_owned(), version, symbols))
}

fn import_declaration(table: &SymbolTable) -> IonResult<Element> {
    let name = table.name().ok_or_else(|| {
        IonError::IllegalArgument(
            "an imported local symbol table has no name and cannot be serialized".to_owned(),
        )
    })?;
    Ok(Element::structure([
        (system_token(NAME, NAME_SID), Element::string(name)),
        (
            system_token(VERSION, VERSION_SID),
            Element::int(table.version().into()),
        ),
        (
            system_token(MAX_ID, MAX_ID_SID),
            Element::int(table.max_id().into()),
        ),
    ]))
}

fn symbols_list<'a>(symbols: impl Iterator<Item = Option<&'a str>>) -> Element {
    Element::list(
        symbols
            .map(|slot| match slot {
                Some(text) => Element::string(text),
                None => Element::new(Value::Null(IonType::String)),
            })
            .collect(),
    )
}

impl LocalSymbolTable {
    /// Serializes this table as a `$ion_symbol_table` struct.
    pub fn to_element(&self) -> IonResult<Element> {
        let mut fields = Vec::new();
        let imported = self.imported_tables();
        if !imported.is_empty() {
            let imports = imported
                .iter()
                .map(import_declaration)
                .collect::<IonResult<Vec<_>>>()?;
            fields.push((system_token(IMPORTS, IMPORTS_SID), Element::list(imports)));
        }
        if self.max_id() > self.imported_max_id() {
            fields.push((
                system_token(SYMBOLS, SYMBOLS_SID),
                symbols_list(self.declared_symbols()),
            ));
        }
        Ok(Element::annotated(
            vec![system_token(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID)],
            Value::Struct(fields),
        ))
    }

    /// `$ion_symbol_table::{imports: $ion_symbol_table, symbols: [...]}`
    /// declaring the symbols above `after`.
    pub(crate) fn append_element(&self, after: Sid) -> Element {
        let skip = after.saturating_sub(self.imported_max_id()) as usize;
        Element::annotated(
            vec![system_token(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID)],
            Value::Struct(vec![
                (
                    system_token(IMPORTS, IMPORTS_SID),
                    Element::symbol(system_token(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID)),
                ),
                (
                    system_token(SYMBOLS, SYMBOLS_SID),
                    symbols_list(self.declared_symbols().skip(skip)),
                ),
            ]),
        )
    }
}

impl SharedSymbolTable {
    /// Serializes this table as a `$ion_shared_symbol_table` struct.
    pub fn to_element(&self) -> Element {
        Element::annotated(
            vec![system_token(
                ION_SHARED_SYMBOL_TABLE,
                ION_SHARED_SYMBOL_TABLE_SID,
            )],
            Value::Struct(vec![
                (system_token(NAME, NAME_SID), Element::string(self.name())),
                (
                    system_token(VERSION, VERSION_SID),
                    Element::int(self.version().into()),
                ),
                (
                    system_token(SYMBOLS, SYMBOLS_SID),
                    symbols_list(self.declared_symbols()),
                ),
            ]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{EmptyCatalog, SimpleCatalog};

    fn import(name: &str, version: i64, max_id: Option<i64>) -> Element {
        let mut fields = vec![
            ("name", Element::string(name)),
            ("version", Element::int(version)),
        ];
        if let Some(max_id) = max_id {
            fields.push(("max_id", Element::int(max_id)));
        }
        Element::structure(fields)
    }

    fn image(fields: Vec<(&str, Element)>) -> Element {
        Element::structure(fields).with_annotation(ION_SYMBOL_TABLE)
    }

    fn catalog() -> SimpleCatalog {
        let mut catalog = SimpleCatalog::new();
        catalog
            .put_table(SharedSymbolTable::new("T", 1, None, ["a", "b"]).unwrap())
            .unwrap();
        catalog
            .put_table(SharedSymbolTable::new("T", 2, None, ["a", "b", "c"]).unwrap())
            .unwrap();
        catalog
    }

    #[test]
    fn parses_symbols_with_gaps() {
        let image = image(vec![(
            "symbols",
            Element::list(vec![
                Element::string("x"),
                Element::int(5),
                Element::string(""),
                Element::string("y"),
            ]),
        )]);
        assert!(is_local_table_image(&image));
        let table = local_table_from_element(&image, &SymbolTable::system(), &EmptyCatalog).unwrap();
        assert_eq!(table.max_id(), 13);
        assert_eq!(table.find_known_symbol(10), Ok(Some("x")));
        assert_eq!(table.find_known_symbol(11), Ok(None));
        assert_eq!(table.find_known_symbol(13), Ok(Some("y")));
    }

    #[test]
    fn resolves_imports_through_the_catalog() {
        let image = image(vec![
            ("imports", Element::list(vec![import("T", 1, Some(2))])),
            ("symbols", Element::list(vec![Element::string("z")])),
        ]);
        let table = local_table_from_element(&image, &SymbolTable::system(), &catalog()).unwrap();
        assert_eq!(table.imported_max_id(), 11);
        assert!(!table.imported_tables()[0].is_substitute());
        assert_eq!(table.find_symbol("z"), Ok(Some(12)));
    }

    #[test]
    fn substitutes_missing_or_mismatched_imports() {
        let image = image(vec![(
            "imports",
            Element::list(vec![
                import("T", 1, Some(3)),
                import("T", 5, Some(1)),
                import("Missing", 1, Some(4)),
            ]),
        )]);
        let table = local_table_from_element(&image, &SymbolTable::system(), &catalog()).unwrap();
        let imported = table.imported_tables();
        assert!(imported.iter().all(SymbolTable::is_substitute));
        assert_eq!(table.imported_max_id(), 9 + 3 + 1 + 4);
        assert_eq!(table.find_known_symbol(12), Ok(None));
        assert_eq!(table.find_known_symbol(13), Ok(Some("a")));
        assert_eq!(imported[1].version(), 5);
        assert_eq!(table.find_known_symbol(14), Ok(None));
    }

    #[test]
    fn missing_import_without_max_id_is_malformed() {
        let image = image(vec![(
            "imports",
            Element::list(vec![import("Missing", 1, None)]),
        )]);
        assert!(matches!(
            local_table_from_element(&image, &SymbolTable::system(), &EmptyCatalog),
            Err(IonError::MalformedImport(_))
        ));
    }

    #[test]
    fn ignores_unusable_import_declarations() {
        let image = image(vec![(
            "imports",
            Element::list(vec![
                import("$ion", 1, Some(9)),
                import("", 1, Some(3)),
                Element::int(3),
                import("T", 0, None),
            ]),
        )]);
        let table = local_table_from_element(&image, &SymbolTable::system(), &catalog()).unwrap();
        assert_eq!(table.imported_tables().len(), 1);
        assert_eq!(table.imported_tables()[0].version(), 1);
    }

    #[test]
    fn append_extends_the_current_table() {
        let mut first = LocalSymbolTable::system();
        first.intern("a").unwrap();
        let current = SymbolTable::local(first);
        let image = image(vec![
            ("imports", Element::symbol(ION_SYMBOL_TABLE)),
            ("symbols", Element::list(vec![Element::string("b")])),
        ]);
        let table = local_table_from_element(&image, &current, &EmptyCatalog).unwrap();
        assert_eq!(table.find_symbol("a"), Ok(Some(10)));
        assert_eq!(table.find_symbol("b"), Ok(Some(11)));
        assert!(table.equal_imports(current.as_local().unwrap()));

        let appended = local_table_from_element(&image, &SymbolTable::system(), &EmptyCatalog).unwrap();
        assert_eq!(appended.find_symbol("b"), Ok(Some(10)));
    }

    #[test]
    fn first_field_occurrence_wins() {
        let image = image(vec![
            ("symbols", Element::null()),
            ("symbols", Element::list(vec![Element::string("first")])),
            ("symbols", Element::list(vec![Element::string("second")])),
        ]);
        let table = local_table_from_element(&image, &SymbolTable::system(), &EmptyCatalog).unwrap();
        assert_eq!(table.max_id(), 10);
        assert_eq!(table.find_known_symbol(10), Ok(Some("first")));
    }

    #[test]
    fn serialization_round_trips() {
        let catalog = catalog();
        let mut table = LocalSymbolTable::new(
            LocalSymbolTableImports::with_system(
                SharedSymbolTable::system(),
                [SymbolTable::Shared(catalog.get_table("T", 2).unwrap())],
            )
            .unwrap(),
        );
        table.intern("local").unwrap();
        let element = table.to_element().unwrap();
        let parsed = local_table_from_element(&element, &SymbolTable::system(), &catalog).unwrap();
        assert_eq!(parsed.max_id(), table.max_id());
        assert_eq!(parsed.find_symbol("c"), Ok(Some(12)));
        assert_eq!(parsed.find_symbol("local"), Ok(Some(13)));
    }

    #[test]
    fn imported_local_tables_cannot_be_serialized() {
        let inner = LocalSymbolTable::system();
        let table = LocalSymbolTable::new(
            LocalSymbolTableImports::with_system(
                SharedSymbolTable::system(),
                [SymbolTable::imported_local(&inner)],
            )
            .unwrap(),
        );
        assert!(matches!(
            table.to_element(),
            Err(IonError::IllegalArgument(_))
        ));
    }

    #[test]
    fn shared_table_image() {
        let shared = SharedSymbolTable::new("S", 3, None, ["p", "q"]).unwrap();
        let parsed = shared_table_from_element(&shared.to_element()).unwrap();
        assert_eq!(parsed, shared);
        let nameless = Element::structure([("version", Element::int(2))]);
        assert!(matches!(
            shared_table_from_element(&nameless),
            Err(IonError::MalformedSharedTable(_))
        ));
        let defaulted = shared_table_from_element(&Element::structure([
            ("name", Element::string("S")),
            ("symbols", Element::list(vec![Element::null(), Element::string("p")])),
        ]))
        .unwrap();
        assert_eq!(defaulted.version(), 1);
        assert_eq!(defaulted.find_symbol("p"), Ok(Some(2)));
    }
}
