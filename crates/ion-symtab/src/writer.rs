//! Symbol-table-aware writer.
//!
//! [`IonWriter`] drives a [`RawWriter`] and owns the symbol-table context of
//! the output: it decides when version markers are emitted, interns symbol
//! text that the current table does not know, and collects user-written
//! `$ion_symbol_table` structs into new local tables.
//!
//! Top-level values are buffered in a block forked from the output sink. The
//! block is committed (local table first, then the values) whenever the
//! context changes, on [`IonWriter::flush`] and on [`IonWriter::finish`].

use std::sync::Arc;

use crate::binary::BinaryWriter;
use crate::constants::{version_marker, ION_1_0_SID, ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID};
use crate::element::{Element, IonType, Value};
use crate::error::{not_positioned, IonError, IonResult};
use crate::raw::{write_element, RawReader, RawWriter};
use crate::reader::{IonReader, ReaderMode};
use crate::symbols::{
    local_table_from_element, Catalog, EmptyCatalog, LocalSymbolTable, LocalSymbolTableImports,
    SharedSymbolTable, Sid, SymbolTable, SymbolToken,
};
use crate::text::TextWriter;
use crate::tree::TreeWriter;

/// When an explicit version marker request actually reaches the output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IvmPolicy {
    /// Every request is emitted.
    #[default]
    Ensure,
    /// Only the first marker of the stream is emitted.
    Suppress,
    /// Emitted unless the previous top-level value was a marker.
    Adjacent,
    /// Emitted only while nothing has been written.
    Distant,
}

#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Resolves imports of collected `$ion_symbol_table` structs.
    pub catalog: Arc<dyn Catalog>,
    pub ivm_policy: IvmPolicy,
    /// Emit a version marker before the first top-level value.
    pub initial_ivm: bool,
    /// Shared tables imported by every local table the writer injects.
    pub imports: Vec<SymbolTable>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            catalog: Arc::new(EmptyCatalog),
            ivm_policy: IvmPolicy::Ensure,
            initial_ivm: true,
            imports: Vec::new(),
        }
    }
}

impl WriterOptions {
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_ivm_policy(mut self, ivm_policy: IvmPolicy) -> Self {
        self.ivm_policy = ivm_policy;
        self
    }

    pub fn with_initial_ivm(mut self, initial_ivm: bool) -> Self {
        self.initial_ivm = initial_ivm;
        self
    }

    pub fn with_imports(mut self, imports: Vec<SymbolTable>) -> Self {
        self.imports = imports;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    Direct,
    DivertedToLocalTableCollector,
}

pub struct IonWriter<W: RawWriter> {
    out: W,
    block: W,
    diversion: Option<TreeWriter>,
    options: WriterOptions,
    injected_imports: Arc<LocalSymbolTableImports>,
    current: SymbolTable,
    /// Highest SID already declared in `out` for the current local table.
    committed_max_id: Option<Sid>,
    block_values: usize,
    initial_ivm_pending: bool,
    previous_value_was_ivm: bool,
    anything_written: bool,
    ivm_written: bool,
    field_name: Option<SymbolToken>,
    annotations: Vec<SymbolToken>,
}

impl IonWriter<BinaryWriter> {
    pub fn binary() -> Self {
        Self::new(BinaryWriter::new())
    }

    pub fn into_bytes(self) -> IonResult<Vec<u8>> {
        self.into_inner()?.into_bytes()
    }
}

impl IonWriter<TextWriter> {
    pub fn text() -> Self {
        Self::new(TextWriter::new())
    }

    pub fn into_string(self) -> IonResult<String> {
        self.into_inner()?.into_string()
    }
}

impl IonWriter<TreeWriter> {
    pub fn tree() -> Self {
        Self::new(TreeWriter::new())
    }

    pub fn into_elements(self) -> IonResult<Vec<Element>> {
        Ok(self.into_inner()?.into_elements())
    }
}

impl<W: RawWriter> IonWriter<W> {
    pub fn new(out: W) -> Self {
        let options = WriterOptions::default();
        let injected_imports = Arc::new(LocalSymbolTableImports::system_only(
            SharedSymbolTable::system(),
        ));
        Self::build(out, options, injected_imports)
    }

    /// Fails with `IllegalImport` when `options.imports` holds a table that
    /// cannot be imported.
    pub fn with_options(out: W, options: WriterOptions) -> IonResult<Self> {
        let injected_imports = Arc::new(LocalSymbolTableImports::with_system(
            SharedSymbolTable::system(),
            options.imports.iter().cloned(),
        )?);
        Ok(Self::build(out, options, injected_imports))
    }

    fn build(out: W, options: WriterOptions, injected_imports: Arc<LocalSymbolTableImports>) -> Self {
        let block = out.fork();
        Self {
            out,
            block,
            diversion: None,
            initial_ivm_pending: options.initial_ivm,
            options,
            injected_imports,
            current: SymbolTable::system(),
            committed_max_id: None,
            block_values: 0,
            previous_value_was_ivm: false,
            anything_written: false,
            ivm_written: false,
            field_name: None,
            annotations: Vec::new(),
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.current
    }

    pub fn state(&self) -> WriterState {
        match self.diversion {
            Some(_) => WriterState::DivertedToLocalTableCollector,
            None => WriterState::Direct,
        }
    }

    pub fn depth(&self) -> usize {
        match &self.diversion {
            Some(collector) => collector.depth(),
            None => self.block.depth(),
        }
    }

    /// Everything committed to the sink so far.
    pub fn output(&self) -> &W {
        &self.out
    }

    fn at_top_level(&self) -> IonResult<()> {
        if self.diversion.is_some() || self.block.depth() > 0 {
            return Err(IonError::IllegalState(
                "the writer is not at the top level".to_owned(),
            ));
        }
        Ok(())
    }

    fn sink(&mut self) -> &mut dyn RawWriter {
        match self.diversion.as_mut() {
            Some(collector) => collector,
            None => &mut self.block,
        }
    }

    pub fn set_field_name(&mut self, name: impl Into<SymbolToken>) {
        self.field_name = Some(name.into());
    }

    pub fn set_annotations<T: Into<SymbolToken>>(&mut self, annotations: impl IntoIterator<Item = T>) {
        self.annotations = annotations.into_iter().map(Into::into).collect();
    }

    pub fn add_annotation(&mut self, annotation: impl Into<SymbolToken>) {
        self.annotations.push(annotation.into());
    }

    fn should_write_ivm(&self) -> bool {
        match self.options.ivm_policy {
            IvmPolicy::Ensure => true,
            IvmPolicy::Suppress => !self.ivm_written,
            IvmPolicy::Adjacent => !self.previous_value_was_ivm,
            IvmPolicy::Distant => !self.anything_written,
        }
    }

    /// Requests a version marker, subject to the IVM policy. Resets the
    /// context to the system table either way.
    pub fn write_ivm(&mut self) -> IonResult<()> {
        self.at_top_level()?;
        self.commit_block()?;
        if self.should_write_ivm() {
            self.out.write_ivm()?;
            self.ivm_written = true;
            self.anything_written = true;
        }
        self.previous_value_was_ivm = true;
        self.initial_ivm_pending = false;
        self.field_name = None;
        self.annotations.clear();
        if !self.current.is_system() {
            log::debug!("writer symbol table reset to the system table");
        }
        self.current = SymbolTable::system();
        self.committed_max_id = None;
        Ok(())
    }

    /// Installs a local table, or resets to the system table via a marker.
    pub fn set_symbol_table(&mut self, table: SymbolTable) -> IonResult<()> {
        if !table.is_local() && !table.is_system() {
            return Err(IonError::IllegalArgument(
                "only local or system symbol tables can be installed".to_owned(),
            ));
        }
        self.at_top_level()?;
        if table.is_system() {
            return self.write_ivm();
        }
        self.commit_block()?;
        log::debug!(
            "writer installed local symbol table (max_id {})",
            table.max_id()
        );
        self.current = table;
        self.committed_max_id = None;
        Ok(())
    }

    fn inject_local_table(&mut self) {
        log::debug!("writer injected a local symbol table");
        self.current = SymbolTable::local(LocalSymbolTable::new(self.injected_imports.clone()));
        self.committed_max_id = None;
    }

    fn intern(&mut self, text: &str) -> IonResult<Sid> {
        if let Some(sid) = self.current.find_symbol(text)? {
            return Ok(sid);
        }
        if !self.current.is_local() {
            self.inject_local_table();
        }
        self.current.intern_sid(text)
    }

    /// Gives `token` what the sink needs: a SID for binary, text when known
    /// otherwise.
    fn resolve(&mut self, token: SymbolToken) -> IonResult<SymbolToken> {
        match (token.text_opt(), token.sid()) {
            (Some(text), _) if self.block.symbol_ids_required() => {
                let sid = self.intern(text)?;
                Ok(SymbolToken::new(text, sid))
            }
            (Some(_), _) | (None, None) | (None, Some(0)) => Ok(token),
            (None, Some(sid)) => {
                if sid > self.current.max_id() {
                    return Err(IonError::UnknownSymbol(sid));
                }
                let text = self.current.find_known_symbol(sid)?.map(str::to_owned);
                Ok(SymbolToken::from_parts(text, Some(sid)))
            }
        }
    }

    /// Moves the pending field name and annotations onto the sink.
    fn start_value(&mut self) -> IonResult<()> {
        let field_name = self.field_name.take();
        let annotations = std::mem::take(&mut self.annotations);
        if let Some(collector) = self.diversion.as_mut() {
            if let Some(name) = field_name {
                collector.set_field_name(name);
            }
            collector.set_annotations(annotations);
            return Ok(());
        }
        if self.block.depth() == 0 && self.initial_ivm_pending {
            self.out.write_ivm()?;
            self.initial_ivm_pending = false;
            self.ivm_written = true;
        }
        if self.block.depth() > 0 {
            if let Some(name) = field_name {
                let name = self.resolve(name)?;
                self.block.set_field_name(name);
            }
        }
        let annotations = annotations
            .into_iter()
            .map(|a| self.resolve(a))
            .collect::<IonResult<Vec<_>>>()?;
        self.block.set_annotations(annotations);
        Ok(())
    }

    fn end_value(&mut self) {
        if self.diversion.is_none() && self.block.depth() == 0 {
            self.previous_value_was_ivm = false;
            self.anything_written = true;
            self.block_values += 1;
        }
    }

    fn write_scalar(
        &mut self,
        write: impl FnOnce(&mut dyn RawWriter) -> IonResult<()>,
    ) -> IonResult<()> {
        self.start_value()?;
        write(self.sink())?;
        self.end_value();
        Ok(())
    }

    pub fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_null(ion_type))
    }

    pub fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_bool(value))
    }

    pub fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_i64(value))
    }

    pub fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_f64(value))
    }

    pub fn write_string(&mut self, value: &str) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_string(value))
    }

    pub fn write_blob(&mut self, value: &[u8]) -> IonResult<()> {
        self.write_scalar(|sink| sink.write_blob(value))
    }

    /// Writes a symbol value. An unannotated top-level `$ion_1_0` is a
    /// version marker request.
    pub fn write_symbol(&mut self, value: impl Into<SymbolToken>) -> IonResult<()> {
        let value = value.into();
        if self.diversion.is_none() && self.block.depth() == 0 && self.annotations.is_empty() {
            match value.text_opt() {
                Some(text) => match version_marker(text) {
                    Some(Some((1, 0))) => return self.write_ivm(),
                    Some(_) => return Err(IonError::UnsupportedVersion(text.to_owned())),
                    None => {}
                },
                None if value.sid() == Some(ION_1_0_SID) => return self.write_ivm(),
                None => {}
            }
        }
        self.start_value()?;
        let value = match self.diversion {
            Some(_) => value,
            None => self.resolve(value)?,
        };
        self.sink().write_symbol(value)?;
        self.end_value();
        Ok(())
    }

    pub fn step_in(&mut self, ion_type: IonType) -> IonResult<()> {
        let opens_local_table = self.diversion.is_none()
            && self.block.depth() == 0
            && ion_type == IonType::Struct
            && self
                .annotations
                .first()
                .is_some_and(|a| a.matches(ION_SYMBOL_TABLE, ION_SYMBOL_TABLE_SID));
        if opens_local_table {
            let mut collector = TreeWriter::new();
            collector.set_annotations(std::mem::take(&mut self.annotations));
            self.field_name = None;
            collector.step_in(IonType::Struct)?;
            log::debug!("writer diverted into the local symbol table collector");
            self.diversion = Some(collector);
            return Ok(());
        }
        self.start_value()?;
        self.sink().step_in(ion_type)
    }

    pub fn step_out(&mut self) -> IonResult<()> {
        if let Some(collector) = self.diversion.as_mut() {
            collector.step_out()?;
            if collector.depth() > 0 {
                return Ok(());
            }
            if let Some(collector) = self.diversion.take() {
                self.close_diversion(collector)?;
            }
            return Ok(());
        }
        self.block.step_out()?;
        self.end_value();
        Ok(())
    }

    fn close_diversion(&mut self, collector: TreeWriter) -> IonResult<()> {
        let image = collector.into_elements().pop().ok_or_else(|| {
            IonError::IllegalState("the local symbol table collector is empty".to_owned())
        })?;
        let table =
            local_table_from_element(&image, &self.current, self.options.catalog.as_ref())?;
        log::debug!(
            "writer collected a local symbol table with {} symbols",
            table.max_id() - table.imported_max_id()
        );
        self.set_symbol_table(SymbolTable::local(table))
    }

    /// Writes `element` through the writer's own value methods.
    pub fn write_element(&mut self, element: &Element) -> IonResult<()> {
        self.annotations = element.annotations.clone();
        match &element.value {
            Value::Null(ion_type) => self.write_null(*ion_type),
            Value::Bool(b) => self.write_bool(*b),
            Value::Int(i) => self.write_i64(*i),
            Value::Float(f) => self.write_f64(*f),
            Value::String(s) => self.write_string(s),
            Value::Symbol(token) => self.write_symbol(token.clone()),
            Value::Blob(bytes) => self.write_blob(bytes),
            Value::List(items) | Value::SExp(items) => {
                self.step_in(element.ion_type())?;
                for item in items {
                    self.write_element(item)?;
                }
                self.step_out()
            }
            Value::Struct(fields) => {
                self.step_in(IonType::Struct)?;
                for (name, value) in fields {
                    self.set_field_name(name.clone());
                    self.write_element(value)?;
                }
                self.step_out()
            }
        }
    }

    /// Copies the reader's current value, recursing into containers.
    pub fn write_value<R: RawReader>(&mut self, reader: &mut IonReader<R>) -> IonResult<()> {
        let ion_type = reader.ion_type().ok_or_else(not_positioned)?;
        if let Some(name) = reader.field_name() {
            self.field_name = Some(name);
        }
        self.annotations = reader.annotations();
        if reader.is_null() {
            return self.write_null(ion_type);
        }
        match ion_type {
            IonType::Null => self.write_null(IonType::Null),
            IonType::Bool => self.write_bool(reader.read_bool()?),
            IonType::Int => self.write_i64(reader.read_i64()?),
            IonType::Float => self.write_f64(reader.read_f64()?),
            IonType::String => {
                let value = reader.read_str()?.to_owned();
                self.write_string(&value)
            }
            IonType::Symbol => self.write_symbol(reader.symbol_value()?),
            IonType::Blob => {
                let value = reader.read_blob()?.to_vec();
                self.write_blob(&value)
            }
            IonType::List | IonType::SExp | IonType::Struct => {
                self.step_in(ion_type)?;
                reader.step_in()?;
                while reader.next()?.is_some() {
                    self.write_value(reader)?;
                }
                reader.step_out()?;
                self.step_out()
            }
        }
    }

    /// Copies every remaining value of `reader`. At the top level the
    /// symbol tables the reader passed are replayed in the order it met them.
    pub fn write_values<R: RawReader>(&mut self, reader: &mut IonReader<R>) -> IonResult<()> {
        let top_level = reader.depth() == 0;
        if reader.ion_type().is_none() {
            reader.next()?;
        }
        while reader.ion_type().is_some() {
            if top_level {
                self.replay_passed_tables(reader)?;
            }
            self.write_value(reader)?;
            reader.next()?;
        }
        if top_level {
            self.replay_passed_tables(reader)?;
        }
        Ok(())
    }

    fn replay_passed_tables<R: RawReader>(&mut self, reader: &mut IonReader<R>) -> IonResult<()> {
        if reader.mode() == ReaderMode::System {
            return Ok(());
        }
        let mut passed = Vec::new();
        while let Some(table) = reader.pop_passed_symbol_table() {
            passed.push(table);
        }
        for table in passed.into_iter().rev() {
            self.set_symbol_table(table)?;
        }
        Ok(())
    }

    fn commit_block(&mut self) -> IonResult<()> {
        if self.block_values == 0 {
            return Ok(());
        }
        if let SymbolTable::Local(table) = &self.current {
            let max_id = table.max_id();
            match self.committed_max_id {
                None => write_element(&mut self.out, &table.to_element()?)?,
                Some(committed) if committed < max_id => {
                    write_element(&mut self.out, &table.append_element(committed))?
                }
                Some(_) => {}
            }
            self.committed_max_id = Some(max_id);
        }
        let block = std::mem::replace(&mut self.block, self.out.fork());
        self.out.append(block)?;
        self.block_values = 0;
        Ok(())
    }

    /// Commits buffered values to the sink.
    pub fn flush(&mut self) -> IonResult<()> {
        self.at_top_level()?;
        self.commit_block()
    }

    /// Commits everything and resets to the system table; the next value
    /// starts a fresh stream segment.
    pub fn finish(&mut self) -> IonResult<()> {
        self.at_top_level()?;
        self.commit_block()?;
        self.previous_value_was_ivm = false;
        self.initial_ivm_pending = self.options.initial_ivm;
        self.current = SymbolTable::system();
        self.committed_max_id = None;
        Ok(())
    }

    pub fn into_inner(mut self) -> IonResult<W> {
        self.finish()?;
        Ok(self.out)
    }
}
