//! Raw (symbol-table-unaware) reader and writer interfaces.
//!
//! Raw readers report symbols exactly as encoded: binary sources yield
//! SID-only tokens, text sources yield text (or `$n` as SID-only). An Ion
//! version marker surfaces as an unannotated top-level symbol `$ion_M_m`.
//!
//! Every raw reader here is a [`CursorReader`]: its source parses one
//! top-level value at a time and the cursor walks the parsed tree.

use std::ops::Range;

use crate::element::{Element, IonType, Value};
use crate::error::{not_positioned, IonError, IonResult};
use crate::symbols::SymbolToken;

/// Optional facets a reader may support.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Top-level values report byte (or index) spans.
    pub span_provider: bool,
    /// The reader can be repositioned to a previously reported span.
    pub seekable: bool,
}

pub trait RawReader {
    /// Advances to the next value at the current depth.
    fn next(&mut self) -> IonResult<Option<IonType>>;
    fn ion_type(&self) -> Option<IonType>;
    fn is_null(&self) -> bool;
    fn depth(&self) -> usize;
    fn field_name(&self) -> Option<&SymbolToken>;
    fn annotations(&self) -> &[SymbolToken];
    fn step_in(&mut self) -> IonResult<()>;
    fn step_out(&mut self) -> IonResult<()>;
    fn read_bool(&self) -> IonResult<bool>;
    fn read_i64(&self) -> IonResult<i64>;
    fn read_f64(&self) -> IonResult<f64>;
    fn read_str(&self) -> IonResult<&str>;
    fn read_symbol(&self) -> IonResult<&SymbolToken>;
    fn read_blob(&self) -> IonResult<&[u8]>;

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    /// Span of the current top-level value.
    fn span(&self) -> Option<Range<usize>> {
        None
    }

    /// Repositions so the next top-level `next()` yields the value at `span`,
    /// after which the reader reports end of stream.
    fn seek(&mut self, _span: Range<usize>) -> IonResult<()> {
        Err(IonError::Unsupported("seek"))
    }
}

pub trait RawWriter {
    /// Binary sinks need SIDs for every symbol; text and tree sinks take text.
    fn symbol_ids_required(&self) -> bool;
    fn depth(&self) -> usize;
    fn write_ivm(&mut self) -> IonResult<()>;
    fn set_field_name(&mut self, name: SymbolToken);
    fn set_annotations(&mut self, annotations: Vec<SymbolToken>);
    fn write_null(&mut self, ion_type: IonType) -> IonResult<()>;
    fn write_bool(&mut self, value: bool) -> IonResult<()>;
    fn write_i64(&mut self, value: i64) -> IonResult<()>;
    fn write_f64(&mut self, value: f64) -> IonResult<()>;
    fn write_string(&mut self, value: &str) -> IonResult<()>;
    fn write_symbol(&mut self, value: SymbolToken) -> IonResult<()>;
    fn write_blob(&mut self, value: &[u8]) -> IonResult<()>;
    fn step_in(&mut self, ion_type: IonType) -> IonResult<()>;
    fn step_out(&mut self) -> IonResult<()>;

    /// A new, empty writer of the same kind.
    fn fork(&self) -> Self
    where
        Self: Sized;

    /// Appends everything `other` wrote at the top level.
    fn append(&mut self, other: Self) -> IonResult<()>
    where
        Self: Sized;
}

/// Writes `element` and its children to `writer` as-is.
pub fn write_element(writer: &mut dyn RawWriter, element: &Element) -> IonResult<()> {
    writer.set_annotations(element.annotations.clone());
    match &element.value {
        Value::Null(ion_type) => writer.write_null(*ion_type),
        Value::Bool(b) => writer.write_bool(*b),
        Value::Int(i) => writer.write_i64(*i),
        Value::Float(f) => writer.write_f64(*f),
        Value::String(s) => writer.write_string(s),
        Value::Symbol(token) => writer.write_symbol(token.clone()),
        Value::Blob(bytes) => writer.write_blob(bytes),
        Value::List(items) | Value::SExp(items) => {
            writer.step_in(element.ion_type())?;
            for item in items {
                write_element(writer, item)?;
            }
            writer.step_out()
        }
        Value::Struct(fields) => {
            writer.step_in(IonType::Struct)?;
            for (name, value) in fields {
                writer.set_field_name(name.clone());
                write_element(writer, value)?;
            }
            writer.step_out()
        }
    }
}

/// Produces top-level values one at a time.
pub trait TopLevelSource {
    /// Parses the next top-level value and its span.
    fn next_value(&mut self) -> IonResult<Option<(Element, Range<usize>)>>;

    /// Current read offset, in the same unit as spans.
    fn position(&self) -> usize;

    fn capabilities(&self) -> Capabilities;

    fn seek(&mut self, _offset: usize) -> IonResult<()> {
        Err(IonError::Unsupported("seek"))
    }
}

fn child(container: &Element, index: usize) -> Option<(Option<&SymbolToken>, &Element)> {
    match &container.value {
        Value::List(items) | Value::SExp(items) => items.get(index).map(|e| (None, e)),
        Value::Struct(fields) => fields.get(index).map(|(n, e)| (Some(n), e)),
        _ => None,
    }
}

/// Position inside one parsed top-level value.
///
/// `frames[k]` is the index of the current child of the `k`-th container
/// stepped into (`None` before the first `next()`).
#[derive(Debug, Default)]
struct Cursor {
    root: Option<Element>,
    on_root: bool,
    frames: Vec<Option<usize>>,
}

impl Cursor {
    fn load(&mut self, root: Element) {
        self.root = Some(root);
        self.on_root = true;
        self.frames.clear();
    }

    fn clear(&mut self) {
        self.root = None;
        self.on_root = false;
        self.frames.clear();
    }

    fn position(&self) -> Option<(Option<&SymbolToken>, &Element)> {
        let root = self.root.as_ref()?;
        let Some((last, parents)) = self.frames.split_last() else {
            return self.on_root.then_some((None, root));
        };
        let mut container = root;
        for index in parents {
            container = child(container, (*index)?)?.1;
        }
        child(container, (*last)?)
    }

    fn current(&self) -> Option<&Element> {
        self.position().map(|(_, element)| element)
    }

    fn next_child(&mut self) -> Option<IonType> {
        let frame = self.frames.last_mut()?;
        *frame = Some(frame.map_or(0, |i| i + 1));
        self.current().map(Element::ion_type)
    }
}

/// [`RawReader`] over any [`TopLevelSource`].
#[derive(Debug)]
pub struct CursorReader<S> {
    source: S,
    cursor: Cursor,
    span: Option<Range<usize>>,
    limit: Option<usize>,
}

impl<S: TopLevelSource> CursorReader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cursor: Cursor::default(),
            span: None,
            limit: None,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The whole current value, if positioned on one.
    pub fn current_element(&self) -> Option<&Element> {
        self.cursor.current()
    }

    fn expect_current(&self) -> IonResult<&Element> {
        self.cursor.current().ok_or_else(not_positioned)
    }

    fn mismatch(&self, expected: IonType) -> IonError {
        match self.cursor.current() {
            Some(element) => IonError::TypeMismatch {
                expected,
                found: element.ion_type(),
            },
            None => not_positioned(),
        }
    }
}

impl<S: TopLevelSource> RawReader for CursorReader<S> {
    fn next(&mut self) -> IonResult<Option<IonType>> {
        if !self.cursor.frames.is_empty() {
            return Ok(self.cursor.next_child());
        }
        if self.limit.is_some_and(|limit| self.source.position() >= limit) {
            self.cursor.clear();
            self.span = None;
            return Ok(None);
        }
        match self.source.next_value()? {
            Some((element, span)) => {
                let ion_type = element.ion_type();
                self.cursor.load(element);
                self.span = Some(span);
                Ok(Some(ion_type))
            }
            None => {
                self.cursor.clear();
                self.span = None;
                Ok(None)
            }
        }
    }

    fn ion_type(&self) -> Option<IonType> {
        self.cursor.current().map(Element::ion_type)
    }

    fn is_null(&self) -> bool {
        self.cursor.current().is_some_and(Element::is_null)
    }

    fn depth(&self) -> usize {
        self.cursor.frames.len()
    }

    fn field_name(&self) -> Option<&SymbolToken> {
        self.cursor.position().and_then(|(name, _)| name)
    }

    fn annotations(&self) -> &[SymbolToken] {
        self.cursor
            .current()
            .map(|element| element.annotations.as_slice())
            .unwrap_or(&[])
    }

    fn step_in(&mut self) -> IonResult<()> {
        let element = self.expect_current()?;
        if !element.ion_type().is_container() || element.is_null() {
            return Err(IonError::IllegalState(format!(
                "cannot step into a {} value",
                if element.is_null() { "null" } else { element.ion_type().as_str() }
            )));
        }
        self.cursor.frames.push(None);
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        if self.cursor.frames.pop().is_none() {
            return Err(IonError::IllegalState(
                "cannot step out of the top level".to_owned(),
            ));
        }
        Ok(())
    }

    fn read_bool(&self) -> IonResult<bool> {
        match self.expect_current()?.value {
            Value::Bool(b) => Ok(b),
            _ => Err(self.mismatch(IonType::Bool)),
        }
    }

    fn read_i64(&self) -> IonResult<i64> {
        match self.expect_current()?.value {
            Value::Int(i) => Ok(i),
            _ => Err(self.mismatch(IonType::Int)),
        }
    }

    fn read_f64(&self) -> IonResult<f64> {
        match self.expect_current()?.value {
            Value::Float(f) => Ok(f),
            _ => Err(self.mismatch(IonType::Float)),
        }
    }

    fn read_str(&self) -> IonResult<&str> {
        match &self.expect_current()?.value {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(IonType::String)),
        }
    }

    fn read_symbol(&self) -> IonResult<&SymbolToken> {
        match &self.expect_current()?.value {
            Value::Symbol(token) => Ok(token),
            _ => Err(self.mismatch(IonType::Symbol)),
        }
    }

    fn read_blob(&self) -> IonResult<&[u8]> {
        match &self.expect_current()?.value {
            Value::Blob(bytes) => Ok(bytes),
            _ => Err(self.mismatch(IonType::Blob)),
        }
    }

    fn capabilities(&self) -> Capabilities {
        self.source.capabilities()
    }

    fn span(&self) -> Option<Range<usize>> {
        if self.depth() > 0 {
            return None;
        }
        self.span.clone()
    }

    fn seek(&mut self, span: Range<usize>) -> IonResult<()> {
        self.source.seek(span.start)?;
        self.cursor.clear();
        self.span = None;
        self.limit = Some(span.end);
        Ok(())
    }
}
