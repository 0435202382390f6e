//! In-memory raw reader and writer over [`Element`] sequences.

use std::ops::Range;

use crate::constants::ION_1_0;
use crate::element::{Element, IonType, Value};
use crate::error::{IonError, IonResult};
use crate::raw::{Capabilities, CursorReader, RawWriter, TopLevelSource};
use crate::symbols::SymbolToken;

/// Top-level source over a vector of elements; spans are element indices.
#[derive(Debug, Default)]
pub struct ElementSource {
    elements: Vec<Element>,
    index: usize,
}

impl TopLevelSource for ElementSource {
    fn next_value(&mut self) -> IonResult<Option<(Element, Range<usize>)>> {
        let Some(element) = self.elements.get(self.index) else {
            return Ok(None);
        };
        let span = self.index..self.index + 1;
        self.index += 1;
        Ok(Some((element.clone(), span)))
    }

    fn position(&self) -> usize {
        self.index
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            span_provider: true,
            seekable: true,
        }
    }

    fn seek(&mut self, offset: usize) -> IonResult<()> {
        if offset > self.elements.len() {
            return Err(IonError::IllegalArgument(format!(
                "seek offset {offset} is past the last element"
            )));
        }
        self.index = offset;
        Ok(())
    }
}

pub type TreeReader = CursorReader<ElementSource>;

impl TreeReader {
    pub fn from_elements(elements: Vec<Element>) -> Self {
        CursorReader::new(ElementSource { elements, index: 0 })
    }
}

#[derive(Debug)]
enum Children {
    Sequence(Vec<Element>),
    Fields(Vec<(SymbolToken, Element)>),
}

#[derive(Debug)]
struct Frame {
    ion_type: IonType,
    field_name: Option<SymbolToken>,
    annotations: Vec<SymbolToken>,
    children: Children,
}

/// Raw writer that builds [`Element`]s. Symbols are kept exactly as given.
#[derive(Debug, Default)]
pub struct TreeWriter {
    done: Vec<Element>,
    stack: Vec<Frame>,
    field_name: Option<SymbolToken>,
    annotations: Vec<SymbolToken>,
}

impl TreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.done
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.done
    }

    fn push(&mut self, value: Value) -> IonResult<()> {
        let annotations = std::mem::take(&mut self.annotations);
        let field_name = self.field_name.take();
        let element = Element::annotated(annotations, value);
        match self.stack.last_mut() {
            None => self.done.push(element),
            Some(Frame {
                children: Children::Sequence(items),
                ..
            }) => items.push(element),
            Some(Frame {
                children: Children::Fields(fields),
                ..
            }) => {
                let name = field_name.ok_or_else(|| {
                    IonError::IllegalState("a struct field requires a field name".to_owned())
                })?;
                fields.push((name, element));
            }
        }
        Ok(())
    }
}

impl RawWriter for TreeWriter {
    fn symbol_ids_required(&self) -> bool {
        false
    }

    fn depth(&self) -> usize {
        self.stack.len()
    }

    fn write_ivm(&mut self) -> IonResult<()> {
        if !self.stack.is_empty() {
            return Err(IonError::IllegalState(
                "an Ion version marker can only be written at the top level".to_owned(),
            ));
        }
        self.done.push(Element::symbol(ION_1_0));
        Ok(())
    }

    fn set_field_name(&mut self, name: SymbolToken) {
        self.field_name = Some(name);
    }

    fn set_annotations(&mut self, annotations: Vec<SymbolToken>) {
        self.annotations = annotations;
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.push(Value::Null(ion_type))
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.push(Value::Bool(value))
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.push(Value::Int(value))
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.push(Value::Float(value))
    }

    fn write_string(&mut self, value: &str) -> IonResult<()> {
        self.push(Value::String(value.to_owned()))
    }

    fn write_symbol(&mut self, value: SymbolToken) -> IonResult<()> {
        self.push(Value::Symbol(value))
    }

    fn write_blob(&mut self, value: &[u8]) -> IonResult<()> {
        self.push(Value::Blob(value.to_vec()))
    }

    fn step_in(&mut self, ion_type: IonType) -> IonResult<()> {
        let children = match ion_type {
            IonType::List | IonType::SExp => Children::Sequence(Vec::new()),
            IonType::Struct => Children::Fields(Vec::new()),
            other => {
                return Err(IonError::IllegalArgument(format!(
                    "cannot step into a {other}"
                )))
            }
        };
        if matches!(
            self.stack.last(),
            Some(Frame {
                children: Children::Fields(_),
                ..
            })
        ) && self.field_name.is_none()
        {
            return Err(IonError::IllegalState(
                "a struct field requires a field name".to_owned(),
            ));
        }
        self.stack.push(Frame {
            ion_type,
            field_name: self.field_name.take(),
            annotations: std::mem::take(&mut self.annotations),
            children,
        });
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let frame = self.stack.pop().ok_or_else(|| {
            IonError::IllegalState("cannot step out of the top level".to_owned())
        })?;
        let value = match (frame.ion_type, frame.children) {
            (IonType::SExp, Children::Sequence(items)) => Value::SExp(items),
            (_, Children::Sequence(items)) => Value::List(items),
            (_, Children::Fields(fields)) => Value::Struct(fields),
        };
        self.field_name = frame.field_name;
        self.annotations = frame.annotations;
        self.push(value)
    }

    fn fork(&self) -> Self {
        Self::new()
    }

    fn append(&mut self, other: Self) -> IonResult<()> {
        if !other.stack.is_empty() {
            return Err(IonError::IllegalState(
                "cannot append a writer with open containers".to_owned(),
            ));
        }
        self.done.extend(other.done);
        Ok(())
    }
}
