//! In-memory Ion values.
//!
//! [`Element`] is what tree readers iterate, what tree writers build, and
//! the form symbol tables take when serialized.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::symbols::SymbolToken;

/// Ion value types modelled by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IonType {
    Null,
    Bool,
    Int,
    Float,
    Symbol,
    String,
    Blob,
    List,
    SExp,
    Struct,
}

impl IonType {
    pub fn is_container(self) -> bool {
        matches!(self, IonType::List | IonType::SExp | IonType::Struct)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IonType::Null => "null",
            IonType::Bool => "bool",
            IonType::Int => "int",
            IonType::Float => "float",
            IonType::Symbol => "symbol",
            IonType::String => "string",
            IonType::Blob => "blob",
            IonType::List => "list",
            IonType::SExp => "sexp",
            IonType::Struct => "struct",
        }
    }
}

impl fmt::Display for IonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Typed null; `Null(IonType::Null)` is plain `null`.
    Null(IonType),
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Symbol(SymbolToken),
    Blob(Vec<u8>),
    List(Vec<Element>),
    SExp(Vec<Element>),
    Struct(Vec<(SymbolToken, Element)>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub annotations: Vec<SymbolToken>,
    pub value: Value,
}

impl Element {
    pub fn new(value: Value) -> Self {
        Self {
            annotations: Vec::new(),
            value,
        }
    }

    pub fn annotated(annotations: Vec<SymbolToken>, value: Value) -> Self {
        Self { annotations, value }
    }

    pub fn null() -> Self {
        Self::new(Value::Null(IonType::Null))
    }

    pub fn int(value: i64) -> Self {
        Self::new(Value::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Value::String(value.into()))
    }

    pub fn symbol(value: impl Into<SymbolToken>) -> Self {
        Self::new(Value::Symbol(value.into()))
    }

    pub fn list(items: Vec<Element>) -> Self {
        Self::new(Value::List(items))
    }

    pub fn structure<N: Into<SymbolToken>>(fields: impl IntoIterator<Item = (N, Element)>) -> Self {
        Self::new(Value::Struct(
            fields
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        ))
    }

    pub fn with_annotation(mut self, annotation: impl Into<SymbolToken>) -> Self {
        self.annotations.push(annotation.into());
        self
    }

    pub fn ion_type(&self) -> IonType {
        match &self.value {
            Value::Null(t) => *t,
            Value::Bool(_) => IonType::Bool,
            Value::Int(_) => IonType::Int,
            Value::Float(_) => IonType::Float,
            Value::String(_) => IonType::String,
            Value::Symbol(_) => IonType::Symbol,
            Value::Blob(_) => IonType::Blob,
            Value::List(_) => IonType::List,
            Value::SExp(_) => IonType::SExp,
            Value::Struct(_) => IonType::Struct,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, Value::Null(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.value {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&SymbolToken> {
        match &self.value {
            Value::Symbol(token) => Some(token),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Element]> {
        match &self.value {
            Value::List(items) | Value::SExp(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[(SymbolToken, Element)]> {
        match &self.value {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// First field named `name`.
    pub fn get(&self, name: &str) -> Option<&Element> {
        self.as_struct()?
            .iter()
            .find(|(field, _)| field.text_opt() == Some(name))
            .map(|(_, value)| value)
    }
}

/// JSON to Ion: numbers that fit `i64` become ints, other numbers floats.
impl From<&serde_json::Value> for Element {
    fn from(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Element::null(),
            serde_json::Value::Bool(b) => Element::new(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Element::int(i),
                None => Element::new(Value::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Element::string(s.as_str()),
            serde_json::Value::Array(items) => {
                Element::list(items.iter().map(Element::from).collect())
            }
            serde_json::Value::Object(map) => {
                Element::structure(map.iter().map(|(k, v)| (k.as_str(), Element::from(v))))
            }
        }
    }
}

/// Ion to JSON, dropping annotations. Symbols become strings (`$n` when the
/// text is unknown), blobs base64 strings, non-finite floats `null`.
impl From<&Element> for serde_json::Value {
    fn from(element: &Element) -> Self {
        match &element.value {
            Value::Null(_) => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Symbol(token) => serde_json::Value::String(token.to_string()),
            Value::Blob(bytes) => serde_json::Value::String(STANDARD.encode(bytes)),
            Value::List(items) | Value::SExp(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Struct(fields) => {
                let mut map = serde_json::Map::with_capacity(fields.len());
                for (name, value) in fields {
                    map.insert(name.to_string(), serde_json::Value::from(value));
                }
                serde_json::Value::Object(map)
            }
        }
    }
}
