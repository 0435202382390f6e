//! Ion binary decoder.
//!
//! Decodes one top-level value at a time into an [`Element`] whose symbols,
//! field names and annotations are SID-only tokens. Version markers surface
//! as the symbol `$ion_M_m`; NOP padding is skipped.

use std::ops::Range;

use super::{BinaryDecodeError, Type};
use crate::element::{Element, IonType, Value};
use crate::error::IonResult;
use crate::raw::{Capabilities, CursorReader, TopLevelSource};
use crate::symbols::{Sid, SymbolToken};

#[derive(Debug, Default)]
pub struct BinaryDecoder {
    data: Vec<u8>,
    pos: usize,
}

pub type BinaryReader = CursorReader<BinaryDecoder>;

impl BinaryReader {
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        CursorReader::new(BinaryDecoder::new(data))
    }
}

impl BinaryDecoder {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    fn at_version_marker(&self) -> bool {
        self.data.len() >= self.pos + 4
            && self.data[self.pos] == 0xe0
            && self.data[self.pos + 3] == 0xea
    }

    /// Reads one value; `None` for NOP padding.
    fn val(&mut self) -> Result<Option<Element>, BinaryDecodeError> {
        let typedesc = self.read_byte()?;
        let type_id = (typedesc >> 4) & 0x0f;
        let length = typedesc & 0x0f;
        if type_id == Type::NULL && length != 15 {
            self.skip_nop(length)?;
            return Ok(None);
        }
        if type_id == Type::ANNO {
            return self.read_annotation(length).map(Some);
        }
        self.read_typed(type_id, length)
            .map(|value| Some(Element::new(value)))
    }

    fn read_typed(&mut self, type_id: u8, length: u8) -> Result<Value, BinaryDecodeError> {
        let ion_type = match type_id {
            t if t == Type::NULL => IonType::Null,
            t if t == Type::BOOL => IonType::Bool,
            t if t == Type::UINT || t == Type::NINT => IonType::Int,
            t if t == Type::FLOT => IonType::Float,
            t if t == Type::SYMB => IonType::Symbol,
            t if t == Type::STRI => IonType::String,
            t if t == Type::BINA => IonType::Blob,
            t if t == Type::LIST => IonType::List,
            t if t == Type::SEXP => IonType::SExp,
            t if t == Type::STRU => IonType::Struct,
            _ => return Err(BinaryDecodeError::UnsupportedType(type_id)),
        };
        if length == 15 {
            return Ok(Value::Null(ion_type));
        }
        match type_id {
            t if t == Type::BOOL => match length {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                _ => Err(BinaryDecodeError::InvalidBoolLen(length)),
            },
            t if t == Type::UINT => {
                let magnitude = self.read_uint(length as usize)?;
                i64::try_from(magnitude)
                    .map(Value::Int)
                    .map_err(|_| BinaryDecodeError::IntOverflow)
            }
            t if t == Type::NINT => {
                if length == 0 {
                    return Err(BinaryDecodeError::NegativeZero);
                }
                let magnitude = self.read_uint(length as usize)?;
                if magnitude == 0 {
                    return Err(BinaryDecodeError::NegativeZero);
                }
                0i64.checked_sub_unsigned(magnitude)
                    .map(Value::Int)
                    .ok_or(BinaryDecodeError::IntOverflow)
            }
            t if t == Type::FLOT => self.read_float(length),
            t if t == Type::SYMB => {
                let sid = self.read_uint(length as usize)?;
                let sid = Sid::try_from(sid).map_err(|_| BinaryDecodeError::VarUIntOverflow)?;
                Ok(Value::Symbol(SymbolToken::with_sid(sid)))
            }
            t if t == Type::STRI => {
                let len = self.read_length(length)?;
                let bytes = self.read_bytes(len)?;
                String::from_utf8(bytes)
                    .map(Value::String)
                    .map_err(|_| BinaryDecodeError::InvalidUtf8)
            }
            t if t == Type::BINA => {
                let len = self.read_length(length)?;
                Ok(Value::Blob(self.read_bytes(len)?))
            }
            t if t == Type::LIST => Ok(Value::List(self.read_sequence(length)?)),
            t if t == Type::SEXP => Ok(Value::SExp(self.read_sequence(length)?)),
            t if t == Type::STRU => Ok(Value::Struct(self.read_struct(length)?)),
            _ => Err(BinaryDecodeError::UnsupportedType(type_id)),
        }
    }

    fn read_float(&mut self, length: u8) -> Result<Value, BinaryDecodeError> {
        match length {
            0 => Ok(Value::Float(0.0)),
            4 => {
                let bytes: [u8; 4] = self
                    .read_bytes(4)?
                    .try_into()
                    .map_err(|_| BinaryDecodeError::EndOfInput)?;
                Ok(Value::Float(f32::from_be_bytes(bytes) as f64))
            }
            8 => {
                let bytes: [u8; 8] = self
                    .read_bytes(8)?
                    .try_into()
                    .map_err(|_| BinaryDecodeError::EndOfInput)?;
                Ok(Value::Float(f64::from_be_bytes(bytes)))
            }
            _ => Err(BinaryDecodeError::UnsupportedFloatLen(length)),
        }
    }

    fn container_end(&mut self, length: u8) -> Result<usize, BinaryDecodeError> {
        let len = self.read_length(length)?;
        let end = self
            .pos
            .checked_add(len)
            .ok_or(BinaryDecodeError::EndOfInput)?;
        if end > self.data.len() {
            return Err(BinaryDecodeError::EndOfInput);
        }
        Ok(end)
    }

    fn read_sequence(&mut self, length: u8) -> Result<Vec<Element>, BinaryDecodeError> {
        let end = self.container_end(length)?;
        let mut items = Vec::new();
        while self.pos < end {
            if let Some(item) = self.val()? {
                items.push(item);
            }
        }
        if self.pos != end {
            return Err(BinaryDecodeError::ContainerLengthMismatch);
        }
        Ok(items)
    }

    fn read_struct(
        &mut self,
        length: u8,
    ) -> Result<Vec<(SymbolToken, Element)>, BinaryDecodeError> {
        // L=1 marks a sorted struct whose length follows as a VarUInt.
        let end = if length == 1 {
            self.container_end(14)?
        } else {
            self.container_end(length)?
        };
        let mut fields = Vec::new();
        while self.pos < end {
            let field_sid = self.read_vuint()?;
            if let Some(value) = self.val()? {
                fields.push((SymbolToken::with_sid(field_sid), value));
            }
        }
        if self.pos != end {
            return Err(BinaryDecodeError::ContainerLengthMismatch);
        }
        Ok(fields)
    }

    fn read_annotation(&mut self, length: u8) -> Result<Element, BinaryDecodeError> {
        if length < 3 {
            return Err(BinaryDecodeError::AnnotationTooShort(length));
        }
        let end = self.container_end(length)?;
        let annot_length = self.read_vuint()? as usize;
        let end_annot_pos = self
            .pos
            .checked_add(annot_length)
            .ok_or(BinaryDecodeError::EndOfInput)?;
        let mut annotations = Vec::new();
        while self.pos < end_annot_pos {
            annotations.push(SymbolToken::with_sid(self.read_vuint()?));
        }
        if self.pos != end_annot_pos || annotations.is_empty() {
            return Err(BinaryDecodeError::InvalidAnnotationWrapper);
        }
        let descriptor = self.read_byte()?;
        let type_id = (descriptor >> 4) & 0x0f;
        let length = descriptor & 0x0f;
        if type_id == Type::ANNO || (type_id == Type::NULL && length != 15) {
            return Err(BinaryDecodeError::InvalidAnnotationWrapper);
        }
        let value = self.read_typed(type_id, length)?;
        if self.pos != end {
            return Err(BinaryDecodeError::ContainerLengthMismatch);
        }
        Ok(Element::annotated(annotations, value))
    }

    fn skip_nop(&mut self, length: u8) -> Result<(), BinaryDecodeError> {
        let len = self.read_length(length)?;
        self.read_bytes(len).map(|_| ())
    }

    fn read_length(&mut self, length: u8) -> Result<usize, BinaryDecodeError> {
        if length == 14 {
            Ok(self.read_vuint()? as usize)
        } else {
            Ok(length as usize)
        }
    }

    fn read_uint(&mut self, len: usize) -> Result<u64, BinaryDecodeError> {
        let bytes = self.read_bytes(len)?;
        let mut value: u64 = 0;
        for b in bytes {
            if value >> 56 != 0 {
                return Err(BinaryDecodeError::IntOverflow);
            }
            value = (value << 8) | b as u64;
        }
        Ok(value)
    }

    /// Reads a VarUInt (max 5 bytes for a 32-bit value).
    fn read_vuint(&mut self) -> Result<u32, BinaryDecodeError> {
        let mut result: u32 = 0;
        for _ in 0..5 {
            let b = self.read_byte()? as u32;
            if result >> 25 != 0 {
                return Err(BinaryDecodeError::VarUIntOverflow);
            }
            result = (result << 7) | (b & 0x7f);
            if b & 0x80 != 0 {
                return Ok(result);
            }
        }
        Err(BinaryDecodeError::VarUIntOverflow)
    }

    fn read_byte(&mut self) -> Result<u8, BinaryDecodeError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or(BinaryDecodeError::EndOfInput)?;
        self.pos += 1;
        Ok(b)
    }

    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, BinaryDecodeError> {
        let end = self.pos.checked_add(n).ok_or(BinaryDecodeError::EndOfInput)?;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(BinaryDecodeError::EndOfInput)?
            .to_vec();
        self.pos = end;
        Ok(bytes)
    }
}

impl TopLevelSource for BinaryDecoder {
    fn next_value(&mut self) -> IonResult<Option<(Element, Range<usize>)>> {
        while self.pos < self.data.len() {
            let start = self.pos;
            if self.at_version_marker() {
                let (major, minor) = (self.data[start + 1], self.data[start + 2]);
                self.pos += 4;
                let marker = Element::symbol(format!("$ion_{major}_{minor}"));
                return Ok(Some((marker, start..self.pos)));
            }
            if let Some(element) = self.val()? {
                return Ok(Some((element, start..self.pos)));
            }
        }
        Ok(None)
    }

    fn position(&self) -> usize {
        self.pos
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            span_provider: true,
            seekable: true,
        }
    }

    fn seek(&mut self, offset: usize) -> IonResult<()> {
        if offset > self.data.len() {
            return Err(BinaryDecodeError::EndOfInput.into());
        }
        self.pos = offset;
        Ok(())
    }
}
