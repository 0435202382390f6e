//! Symbol-table-aware reader.
//!
//! [`IonReader`] sits on top of any [`RawReader`]. At the top level it
//! consumes version markers and local symbol table structs, keeps the
//! current [`SymbolTable`] up to date and resolves SIDs against it. Nested
//! values are never treated as system values.

use std::sync::Arc;

use crate::binary::BinaryReader;
use crate::constants::{version_marker, ION_1_0_SID, ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID};
use crate::element::{Element, IonType, Value};
use crate::error::{not_positioned, IonError, IonResult};
use crate::pending::PendingTableStack;
use crate::raw::{Capabilities, RawReader};
use crate::symbols::{local_table_from_element, Catalog, EmptyCatalog, SymbolTable, SymbolToken};
use crate::text::TextReader;
use crate::tree::TreeReader;

/// Whether system values are hidden from iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReaderMode {
    /// Version markers and local symbol tables are consumed silently.
    #[default]
    User,
    /// System values are processed and also returned by `next()`.
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableState {
    NoCurrentTable,
    SystemTable,
    LocalTable,
}

#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Resolves imports declared by local symbol tables.
    pub catalog: Arc<dyn Catalog>,
    pub mode: ReaderMode,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            catalog: Arc::new(EmptyCatalog),
            mode: ReaderMode::User,
        }
    }
}

impl ReaderOptions {
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_mode(mut self, mode: ReaderMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Position of a top-level value plus the table needed to decode it.
#[derive(Debug, Clone)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub symbol_table: SymbolTable,
}

pub struct IonReader<R> {
    raw: R,
    options: ReaderOptions,
    current: SymbolTable,
    state: TableState,
    pending: PendingTableStack,
}

impl IonReader<BinaryReader> {
    pub fn binary(data: impl Into<Vec<u8>>) -> Self {
        Self::new(BinaryReader::from_bytes(data))
    }
}

impl IonReader<TextReader> {
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(TextReader::from_text(text))
    }
}

impl IonReader<TreeReader> {
    pub fn tree(elements: Vec<Element>) -> Self {
        Self::new(TreeReader::from_elements(elements))
    }
}

impl<R: RawReader> IonReader<R> {
    pub fn new(raw: R) -> Self {
        Self::with_options(raw, ReaderOptions::default())
    }

    pub fn with_options(raw: R, options: ReaderOptions) -> Self {
        Self {
            raw,
            options,
            current: SymbolTable::system(),
            state: TableState::NoCurrentTable,
            pending: PendingTableStack::new(),
        }
    }

    pub fn raw(&self) -> &R {
        &self.raw
    }

    pub fn into_raw(self) -> R {
        self.raw
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.current
    }

    pub fn mode(&self) -> ReaderMode {
        self.options.mode
    }

    pub fn table_state(&self) -> TableState {
        self.state
    }

    /// Advances to the next user value at the current depth.
    pub fn next(&mut self) -> IonResult<Option<IonType>> {
        if self.raw.depth() > 0 {
            return self.raw.next();
        }
        self.pending.clear();
        loop {
            let Some(ion_type) = self.raw.next()? else {
                return Ok(None);
            };
            let system_value = self.process_system_value(ion_type)?;
            if system_value && self.options.mode == ReaderMode::User {
                continue;
            }
            return Ok(Some(ion_type));
        }
    }

    /// Handles a version marker or local symbol table at the top level.
    fn process_system_value(&mut self, ion_type: IonType) -> IonResult<bool> {
        if self.raw.is_null() {
            return Ok(false);
        }
        match ion_type {
            IonType::Symbol if self.raw.annotations().is_empty() => {
                let token = self.raw.read_symbol()?;
                let is_marker = match token.text_opt() {
                    Some(text) => match version_marker(text) {
                        Some(Some((1, 0))) => true,
                        Some(_) => return Err(IonError::UnsupportedVersion(text.to_owned())),
                        None => false,
                    },
                    None => token.sid() == Some(ION_1_0_SID),
                };
                if is_marker {
                    self.install(SymbolTable::system(), TableState::SystemTable);
                }
                Ok(is_marker)
            }
            IonType::Struct
                if self
                    .raw
                    .annotations()
                    .first()
                    .is_some_and(|a| a.matches(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID)) =>
            {
                let image = self.read_element()?;
                let table = local_table_from_element(
                    &image,
                    &self.current,
                    self.options.catalog.as_ref(),
                )?;
                self.install(SymbolTable::local(table), TableState::LocalTable);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn install(&mut self, table: SymbolTable, state: TableState) {
        log::debug!(
            "reader symbol table {:?} -> {:?} (max_id {})",
            self.state,
            state,
            table.max_id()
        );
        self.current = table.clone();
        self.state = state;
        self.pending.push(table);
    }

    /// Pops the most recent table passed since the last user value.
    pub fn pop_passed_symbol_table(&mut self) -> Option<SymbolTable> {
        self.pending.pop()
    }

    /// Fills in whatever the current table knows about `token`.
    fn resolve(&self, token: &SymbolToken) -> SymbolToken {
        match (token.text_opt(), token.sid()) {
            (Some(text), None) => {
                let sid = self.current.find_symbol(text).ok().flatten();
                SymbolToken::from_parts(Some(text.to_owned()), sid)
            }
            (None, Some(sid)) if sid > 0 => {
                let text = self
                    .current
                    .find_known_symbol(sid)
                    .ok()
                    .flatten()
                    .map(str::to_owned);
                SymbolToken::from_parts(text, Some(sid))
            }
            _ => token.clone(),
        }
    }

    pub fn ion_type(&self) -> Option<IonType> {
        self.raw.ion_type()
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub fn depth(&self) -> usize {
        self.raw.depth()
    }

    pub fn step_in(&mut self) -> IonResult<()> {
        self.raw.step_in()
    }

    pub fn step_out(&mut self) -> IonResult<()> {
        self.raw.step_out()
    }

    pub fn field_name(&self) -> Option<SymbolToken> {
        self.raw.field_name().map(|name| self.resolve(name))
    }

    pub fn annotations(&self) -> Vec<SymbolToken> {
        self.raw
            .annotations()
            .iter()
            .map(|a| self.resolve(a))
            .collect()
    }

    pub fn has_annotation(&self, text: &str) -> bool {
        self.annotations()
            .iter()
            .any(|a| a.text_opt() == Some(text))
    }

    /// The current symbol value. Its text is `None` when the SID is a gap,
    /// belongs to a substitute, or lies beyond the current table.
    pub fn symbol_value(&self) -> IonResult<SymbolToken> {
        Ok(self.resolve(self.raw.read_symbol()?))
    }

    pub fn read_bool(&self) -> IonResult<bool> {
        self.raw.read_bool()
    }

    pub fn read_i64(&self) -> IonResult<i64> {
        self.raw.read_i64()
    }

    pub fn read_f64(&self) -> IonResult<f64> {
        self.raw.read_f64()
    }

    pub fn read_str(&self) -> IonResult<&str> {
        self.raw.read_str()
    }

    pub fn read_blob(&self) -> IonResult<&[u8]> {
        self.raw.read_blob()
    }

    /// Materializes the current value, resolving every symbol.
    pub fn read_element(&mut self) -> IonResult<Element> {
        let ion_type = self.raw.ion_type().ok_or_else(not_positioned)?;
        let annotations = self.annotations();
        if self.raw.is_null() {
            return Ok(Element::annotated(annotations, Value::Null(ion_type)));
        }
        let value = match ion_type {
            IonType::Null => Value::Null(IonType::Null),
            IonType::Bool => Value::Bool(self.raw.read_bool()?),
            IonType::Int => Value::Int(self.raw.read_i64()?),
            IonType::Float => Value::Float(self.raw.read_f64()?),
            IonType::String => Value::String(self.raw.read_str()?.to_owned()),
            IonType::Symbol => Value::Symbol(self.symbol_value()?),
            IonType::Blob => Value::Blob(self.raw.read_blob()?.to_vec()),
            IonType::List | IonType::SExp => {
                let mut items = Vec::new();
                self.raw.step_in()?;
                while self.raw.next()?.is_some() {
                    items.push(self.read_element()?);
                }
                self.raw.step_out()?;
                if ion_type == IonType::List {
                    Value::List(items)
                } else {
                    Value::SExp(items)
                }
            }
            IonType::Struct => {
                let mut fields = Vec::new();
                self.raw.step_in()?;
                while self.raw.next()?.is_some() {
                    let name = self
                        .field_name()
                        .unwrap_or_else(|| SymbolToken::with_sid(0));
                    fields.push((name, self.read_element()?));
                }
                self.raw.step_out()?;
                Value::Struct(fields)
            }
        };
        Ok(Element::annotated(annotations, value))
    }

    pub fn capabilities(&self) -> Capabilities {
        self.raw.capabilities()
    }

    /// Span of the current top-level value, with the table in effect.
    pub fn current_span(&self) -> IonResult<Span> {
        if !self.capabilities().span_provider {
            return Err(IonError::Unsupported("spans"));
        }
        let range = self.raw.span().ok_or_else(|| {
            IonError::IllegalState("spans are only available for top-level values".to_owned())
        })?;
        Ok(Span {
            start: range.start,
            end: range.end,
            symbol_table: self.current.clone(),
        })
    }

    /// Hoists the reader to `span`: the next `next()` yields that value,
    /// decoded with the span's table, and then the stream ends.
    pub fn seek(&mut self, span: &Span) -> IonResult<()> {
        if !self.capabilities().seekable {
            return Err(IonError::Unsupported("seek"));
        }
        self.raw.seek(span.start..span.end)?;
        self.current = span.symbol_table.clone();
        self.state = match &self.current {
            SymbolTable::Local(_) => TableState::LocalTable,
            _ => TableState::SystemTable,
        };
        self.pending.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_reader_skips_system_values() {
        let mut reader = IonReader::text(
            "$ion_1_0 $ion_symbol_table::{symbols:[\"a\",\"b\"]} a b $12 c",
        );
        let mut seen = Vec::new();
        while reader.next().unwrap().is_some() {
            seen.push(reader.symbol_value().unwrap());
        }
        assert_eq!(reader.table_state(), TableState::LocalTable);
        assert_eq!(seen[0], SymbolToken::new("a", 10));
        assert_eq!(seen[0].sid(), Some(10));
        assert_eq!(seen[1].sid(), Some(11));
        assert_eq!(seen[2].text(), Err(IonError::UnknownSymbol(12)));
        assert_eq!(seen[3].text_opt(), Some("c"));
        assert_eq!(seen[3].sid(), None);
    }

    #[test]
    fn system_mode_surfaces_system_values() {
        let options = ReaderOptions {
            mode: ReaderMode::System,
            ..ReaderOptions::default()
        };
        let mut reader = IonReader::with_options(
            TextReader::from_text("$ion_1_0 $ion_symbol_table::{symbols:[\"a\"]} $10"),
            options,
        );
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.table_state(), TableState::SystemTable);
        assert_eq!(reader.next().unwrap(), Some(IonType::Struct));
        assert_eq!(reader.table_state(), TableState::LocalTable);
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.symbol_value().unwrap().text_opt(), Some("a"));
    }

    #[test]
    fn unsupported_version_is_fatal() {
        let mut reader = IonReader::text("$ion_2_0 a");
        assert_eq!(
            reader.next(),
            Err(IonError::UnsupportedVersion("$ion_2_0".to_owned()))
        );
        let mut reader = IonReader::text("$ion_99999999999_0 a");
        assert_eq!(
            reader.next(),
            Err(IonError::UnsupportedVersion("$ion_99999999999_0".to_owned()))
        );
    }

    #[test]
    fn nested_and_annotated_markers_are_ordinary() {
        let mut reader = IonReader::text("[$ion_1_0] x::$ion_1_0 [$ion_symbol_table::{}]");
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        reader.step_in().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        reader.step_out().unwrap();
        assert_eq!(reader.next().unwrap(), Some(IonType::Symbol));
        assert_eq!(reader.next().unwrap(), Some(IonType::List));
        assert_eq!(reader.table_state(), TableState::NoCurrentTable);
    }
}
