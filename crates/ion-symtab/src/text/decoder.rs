//! Ion text decoder.
//!
//! Parses one top-level value at a time into an [`Element`]. Symbols keep
//! their text; `$n` symbols become SID-only tokens.

use std::ops::Range;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{symbol_id, TextDecodeError};
use crate::element::{Element, IonType, Value};
use crate::error::IonResult;
use crate::raw::{Capabilities, CursorReader, TopLevelSource};
use crate::symbols::SymbolToken;

type Result<T> = std::result::Result<T, TextDecodeError>;

#[derive(Debug, Default)]
pub struct TextDecoder {
    data: Vec<u8>,
    x: usize,
}

pub type TextReader = CursorReader<TextDecoder>;

impl TextReader {
    pub fn from_text(text: impl Into<String>) -> Self {
        CursorReader::new(TextDecoder::new(text))
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c == b'$'
}

fn is_ident_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'$'
}

fn is_operator(c: u8) -> bool {
    b"!#%&*+-./;<=>?@^`|~".contains(&c)
}

fn identifier_token(text: String) -> SymbolToken {
    match symbol_id(&text) {
        Some(sid) => SymbolToken::with_sid(sid),
        None => SymbolToken::with_text(text),
    }
}

impl TextDecoder {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            data: text.into().into_bytes(),
            x: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.x).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.data.get(self.x + offset).copied()
    }

    fn starts_with(&self, prefix: &[u8]) -> bool {
        self.data
            .get(self.x..)
            .is_some_and(|rest| rest.starts_with(prefix))
    }

    fn skip_whitespace(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c) => self.x += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        self.x += 1;
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.x += 2;
                    while !self.starts_with(b"*/") {
                        if self.peek().is_none() {
                            return Err(TextDecodeError::UnexpectedEof);
                        }
                        self.x += 1;
                    }
                    self.x += 2;
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_value(&mut self, in_sexp: bool) -> Result<Element> {
        let mut annotations = Vec::new();
        loop {
            self.skip_whitespace()?;
            let start = self.x;
            if let Some(token) = self.read_annotation_candidate()? {
                self.skip_whitespace()?;
                if self.starts_with(b"::") {
                    self.x += 2;
                    annotations.push(token);
                    continue;
                }
            }
            self.x = start;
            break;
        }
        let value = self.read_bare(in_sexp)?;
        Ok(Element::annotated(annotations, value))
    }

    fn read_annotation_candidate(&mut self) -> Result<Option<SymbolToken>> {
        match self.peek() {
            Some(b'\'') if !self.starts_with(b"'''") => {
                Ok(Some(SymbolToken::with_text(self.read_quoted(b'\'')?)))
            }
            Some(c) if is_ident_start(c) => Ok(Some(identifier_token(self.read_identifier()))),
            _ => Ok(None),
        }
    }

    fn read_bare(&mut self, in_sexp: bool) -> Result<Value> {
        let x = self.x;
        let c = self.peek().ok_or(TextDecodeError::UnexpectedEof)?;
        match c {
            b'{' if self.peek_at(1) == Some(b'{') => self.read_blob(),
            b'{' => self.read_struct(),
            b'[' => self.read_list(),
            b'(' => self.read_sexp(),
            b'"' => Ok(Value::String(self.read_quoted(b'"')?)),
            b'\'' if self.starts_with(b"'''") => Ok(Value::String(self.read_long_string()?)),
            b'\'' => Ok(Value::Symbol(SymbolToken::with_text(
                self.read_quoted(b'\'')?,
            ))),
            b'+' if self.starts_with(b"+inf") => {
                self.x += 4;
                Ok(Value::Float(f64::INFINITY))
            }
            b'-' if self.starts_with(b"-inf") => {
                self.x += 4;
                Ok(Value::Float(f64::NEG_INFINITY))
            }
            b'0'..=b'9' => self.read_number(),
            b'-' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.read_number(),
            c if is_ident_start(c) => self.read_keyword_or_symbol(),
            c if in_sexp && is_operator(c) => {
                while self.peek().is_some_and(is_operator) {
                    self.x += 1;
                }
                let text = String::from_utf8_lossy(&self.data[x..self.x]).into_owned();
                Ok(Value::Symbol(SymbolToken::with_text(text)))
            }
            _ => Err(TextDecodeError::Invalid(x)),
        }
    }

    fn read_identifier(&mut self) -> String {
        let start = self.x;
        while self.peek().is_some_and(is_ident_char) {
            self.x += 1;
        }
        String::from_utf8_lossy(&self.data[start..self.x]).into_owned()
    }

    fn read_keyword_or_symbol(&mut self) -> Result<Value> {
        let start = self.x;
        let ident = self.read_identifier();
        match ident.as_str() {
            "null" if self.peek() == Some(b'.') => {
                self.x += 1;
                let ion_type = match self.read_identifier().as_str() {
                    "null" => IonType::Null,
                    "bool" => IonType::Bool,
                    "int" => IonType::Int,
                    "float" | "decimal" => IonType::Float,
                    "symbol" => IonType::Symbol,
                    "string" => IonType::String,
                    "blob" => IonType::Blob,
                    "list" => IonType::List,
                    "sexp" => IonType::SExp,
                    "struct" => IonType::Struct,
                    "timestamp" => return Err(TextDecodeError::UnsupportedType(start, "timestamp")),
                    "clob" => return Err(TextDecodeError::UnsupportedType(start, "clob")),
                    _ => return Err(TextDecodeError::Invalid(start)),
                };
                Ok(Value::Null(ion_type))
            }
            "null" => Ok(Value::Null(IonType::Null)),
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            "nan" => Ok(Value::Float(f64::NAN)),
            _ => Ok(Value::Symbol(identifier_token(ident))),
        }
    }

    fn read_number(&mut self) -> Result<Value> {
        let start = self.x;
        let mut prev = 0u8;
        while let Some(c) = self.peek() {
            let signed_exponent = (c == b'-' || c == b'+')
                && (self.x == start || matches!(prev, b'e' | b'E' | b'd' | b'D'));
            if !(c.is_ascii_alphanumeric() || c == b'.' || c == b'_' || signed_exponent) {
                break;
            }
            prev = c;
            self.x += 1;
        }
        if matches!(self.peek(), Some(b'-' | b':')) {
            return Err(TextDecodeError::UnsupportedType(start, "timestamp"));
        }
        let raw: String = String::from_utf8_lossy(&self.data[start..self.x]).replace('_', "");
        let (negative, digits) = match raw.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, raw.as_str()),
        };
        let radix = if digits.starts_with("0x") || digits.starts_with("0X") {
            Some(16)
        } else if digits.starts_with("0b") || digits.starts_with("0B") {
            Some(2)
        } else {
            None
        };
        if let Some(radix) = radix {
            let magnitude = u64::from_str_radix(&digits[2..], radix)
                .map_err(|_| TextDecodeError::Invalid(start))?;
            let value = if negative {
                0i64.checked_sub_unsigned(magnitude)
            } else {
                i64::try_from(magnitude).ok()
            };
            return value
                .map(Value::Int)
                .ok_or(TextDecodeError::IntOverflow(start));
        }
        if digits.contains(['.', 'e', 'E', 'd', 'D']) {
            let normalized = raw.replace(['d', 'D'], "e");
            return normalized
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| TextDecodeError::Invalid(start));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) || digits.is_empty() {
            return Err(TextDecodeError::Invalid(start));
        }
        raw.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| TextDecodeError::IntOverflow(start))
    }

    fn read_escape(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        let at = self.x;
        self.x += 1;
        let c = self.peek().ok_or(TextDecodeError::UnexpectedEof)?;
        self.x += 1;
        let ch = match c {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'0' => '\0',
            b'a' => '\x07',
            b'b' => '\x08',
            b'f' => '\x0c',
            b'v' => '\x0b',
            b'\\' | b'"' | b'\'' | b'/' | b'?' => c as char,
            b'\n' => return Ok(()),
            b'x' => self.read_hex_char(2, at)?,
            b'U' => self.read_hex_char(8, at)?,
            b'u' => {
                let code = self.read_hex(4, at)?;
                if (0xd800..0xdc00).contains(&code) {
                    if !self.starts_with(b"\\u") {
                        return Err(TextDecodeError::InvalidEscape(at));
                    }
                    self.x += 2;
                    let low = self.read_hex(4, at)?;
                    if !(0xdc00..0xe000).contains(&low) {
                        return Err(TextDecodeError::InvalidEscape(at));
                    }
                    let combined = 0x10000 + ((code - 0xd800) << 10) + (low - 0xdc00);
                    char::from_u32(combined).ok_or(TextDecodeError::InvalidEscape(at))?
                } else {
                    char::from_u32(code).ok_or(TextDecodeError::InvalidEscape(at))?
                }
            }
            _ => return Err(TextDecodeError::InvalidEscape(at)),
        };
        let mut tmp = [0u8; 4];
        buf.extend_from_slice(ch.encode_utf8(&mut tmp).as_bytes());
        Ok(())
    }

    fn read_hex(&mut self, len: usize, at: usize) -> Result<u32> {
        let digits = self
            .data
            .get(self.x..self.x + len)
            .ok_or(TextDecodeError::UnexpectedEof)?;
        let digits = std::str::from_utf8(digits).map_err(|_| TextDecodeError::InvalidEscape(at))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| TextDecodeError::InvalidEscape(at))?;
        self.x += len;
        Ok(code)
    }

    fn read_hex_char(&mut self, len: usize, at: usize) -> Result<char> {
        let code = self.read_hex(len, at)?;
        char::from_u32(code).ok_or(TextDecodeError::InvalidEscape(at))
    }

    fn read_quoted(&mut self, quote: u8) -> Result<String> {
        let start = self.x;
        self.x += 1;
        let mut buf = Vec::new();
        loop {
            let c = self.peek().ok_or(TextDecodeError::UnexpectedEof)?;
            match c {
                q if q == quote => {
                    self.x += 1;
                    break;
                }
                b'\\' => self.read_escape(&mut buf)?,
                b'\n' => return Err(TextDecodeError::Invalid(self.x)),
                _ => {
                    buf.push(c);
                    self.x += 1;
                }
            }
        }
        String::from_utf8(buf).map_err(|_| TextDecodeError::InvalidUtf8(start))
    }

    /// `'''...'''` segments separated by whitespace concatenate.
    fn read_long_string(&mut self) -> Result<String> {
        let start = self.x;
        let mut buf = Vec::new();
        loop {
            self.x += 3;
            loop {
                if self.starts_with(b"'''") {
                    self.x += 3;
                    break;
                }
                let c = self.peek().ok_or(TextDecodeError::UnexpectedEof)?;
                if c == b'\\' {
                    self.read_escape(&mut buf)?;
                } else {
                    buf.push(c);
                    self.x += 1;
                }
            }
            let end = self.x;
            self.skip_whitespace()?;
            if !self.starts_with(b"'''") {
                self.x = end;
                break;
            }
        }
        String::from_utf8(buf).map_err(|_| TextDecodeError::InvalidUtf8(start))
    }

    fn read_field_name(&mut self) -> Result<SymbolToken> {
        match self.peek() {
            Some(b'"') => Ok(SymbolToken::with_text(self.read_quoted(b'"')?)),
            Some(b'\'') if self.starts_with(b"'''") => {
                Ok(SymbolToken::with_text(self.read_long_string()?))
            }
            Some(b'\'') => Ok(SymbolToken::with_text(self.read_quoted(b'\'')?)),
            Some(c) if is_ident_start(c) => Ok(identifier_token(self.read_identifier())),
            Some(_) => Err(TextDecodeError::Invalid(self.x)),
            None => Err(TextDecodeError::UnexpectedEof),
        }
    }

    /// After a container item: a comma, or the closing delimiter.
    fn read_separator(&mut self, close: u8) -> Result<()> {
        self.skip_whitespace()?;
        match self.peek() {
            Some(b',') => {
                self.x += 1;
                Ok(())
            }
            Some(c) if c == close => Ok(()),
            Some(_) => Err(TextDecodeError::Invalid(self.x)),
            None => Err(TextDecodeError::UnexpectedEof),
        }
    }

    /// Consumes `close` when it is next; errors at end of input.
    fn at_close(&mut self, close: u8) -> Result<bool> {
        self.skip_whitespace()?;
        match self.peek() {
            None => Err(TextDecodeError::UnexpectedEof),
            Some(c) if c == close => {
                self.x += 1;
                Ok(true)
            }
            Some(_) => Ok(false),
        }
    }

    fn read_struct(&mut self) -> Result<Value> {
        self.x += 1;
        let mut fields = Vec::new();
        while !self.at_close(b'}')? {
            let name = self.read_field_name()?;
            self.skip_whitespace()?;
            if self.peek() != Some(b':') || self.peek_at(1) == Some(b':') {
                return Err(TextDecodeError::Invalid(self.x));
            }
            self.x += 1;
            let value = self.read_value(false)?;
            fields.push((name, value));
            self.read_separator(b'}')?;
        }
        Ok(Value::Struct(fields))
    }

    fn read_list(&mut self) -> Result<Value> {
        self.x += 1;
        let mut items = Vec::new();
        while !self.at_close(b']')? {
            items.push(self.read_value(false)?);
            self.read_separator(b']')?;
        }
        Ok(Value::List(items))
    }

    fn read_sexp(&mut self) -> Result<Value> {
        self.x += 1;
        let mut items = Vec::new();
        while !self.at_close(b')')? {
            items.push(self.read_value(true)?);
        }
        Ok(Value::SExp(items))
    }

    fn read_blob(&mut self) -> Result<Value> {
        let start = self.x;
        self.x += 2;
        self.skip_whitespace()?;
        if self.peek() == Some(b'"') || self.starts_with(b"'''") {
            return Err(TextDecodeError::UnsupportedType(start, "clob"));
        }
        let mut text = String::new();
        loop {
            match self.peek() {
                None => return Err(TextDecodeError::UnexpectedEof),
                Some(b'}') if self.peek_at(1) == Some(b'}') => {
                    self.x += 2;
                    break;
                }
                Some(b'}') => return Err(TextDecodeError::InvalidBlob(start)),
                Some(c) if c.is_ascii_whitespace() => self.x += 1,
                Some(c) => {
                    text.push(c as char);
                    self.x += 1;
                }
            }
        }
        STANDARD
            .decode(text)
            .map(Value::Blob)
            .map_err(|_| TextDecodeError::InvalidBlob(start))
    }
}

impl TopLevelSource for TextDecoder {
    fn next_value(&mut self) -> IonResult<Option<(Element, Range<usize>)>> {
        self.skip_whitespace()?;
        if self.peek().is_none() {
            return Ok(None);
        }
        let start = self.x;
        let element = self.read_value(false)?;
        Ok(Some((element, start..self.x)))
    }

    fn position(&self) -> usize {
        self.x
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            span_provider: true,
            seekable: true,
        }
    }

    fn seek(&mut self, offset: usize) -> IonResult<()> {
        if offset > self.data.len() {
            return Err(TextDecodeError::UnexpectedEof.into());
        }
        self.x = offset;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(text: &str) -> Vec<Element> {
        let mut decoder = TextDecoder::new(text);
        let mut out = Vec::new();
        while let Some((element, _)) = decoder.next_value().unwrap() {
            out.push(element);
        }
        out
    }

    #[test]
    fn scalars() {
        let values = parse_all("1 -2 0x1F 1.5 2e3 null null.string true 'quoted sym' \"str\\n\" $10 abc nan +inf");
        assert_eq!(values[0], Element::int(1));
        assert_eq!(values[1], Element::int(-2));
        assert_eq!(values[2], Element::int(31));
        assert_eq!(values[3].value, Value::Float(1.5));
        assert_eq!(values[4].value, Value::Float(2000.0));
        assert_eq!(values[5], Element::null());
        assert_eq!(values[6].value, Value::Null(IonType::String));
        assert_eq!(values[7].value, Value::Bool(true));
        assert_eq!(values[8], Element::symbol("quoted sym"));
        assert_eq!(values[9], Element::string("str\n"));
        assert_eq!(values[10], Element::symbol(SymbolToken::with_sid(10)));
        assert_eq!(values[11], Element::symbol("abc"));
        assert!(matches!(values[12].value, Value::Float(f) if f.is_nan()));
        assert_eq!(values[13].value, Value::Float(f64::INFINITY));
    }

    #[test]
    fn containers_annotations_and_comments() {
        let values = parse_all(
            "$ion_symbol_table::{ imports: $ion_symbol_table, symbols: [\"a\", 'b',], } // trailing\n\
             /* block */ a::'b'::(+ 1 x) {{ AQID }}",
        );
        assert_eq!(values.len(), 3);
        assert_eq!(values[0].annotations, vec![SymbolToken::with_text("$ion_symbol_table")]);
        assert_eq!(
            values[0].get("imports"),
            Some(&Element::symbol("$ion_symbol_table"))
        );
        assert_eq!(
            values[0].get("symbols"),
            Some(&Element::list(vec![Element::string("a"), Element::symbol("b")]))
        );
        assert_eq!(values[1].annotations.len(), 2);
        assert_eq!(
            values[1].value,
            Value::SExp(vec![Element::symbol("+"), Element::int(1), Element::symbol("x")])
        );
        assert_eq!(values[2].value, Value::Blob(vec![1, 2, 3]));
    }

    #[test]
    fn escapes_and_long_strings() {
        let values = parse_all(r#""\u00e9\ud83d\ude00\x41" '''ab''' '''cd'''"#);
        assert_eq!(values[0], Element::string("é😀A"));
        assert_eq!(values[1], Element::string("abcd"));
    }

    #[test]
    fn errors() {
        assert!(TextDecoder::new("[1, 2").next_value().is_err());
        assert!(TextDecoder::new("{a 1}").next_value().is_err());
        assert!(TextDecoder::new("\"\\q\"").next_value().is_err());
        assert_eq!(
            TextDecoder::new("99999999999999999999").next_value(),
            Err(TextDecodeError::IntOverflow(0).into())
        );
        assert_eq!(
            TextDecoder::new("2007-01-01T").next_value(),
            Err(TextDecodeError::UnsupportedType(0, "timestamp").into())
        );
    }

    #[test]
    fn spans_cover_values() {
        let mut decoder = TextDecoder::new("  abc  [1]");
        assert_eq!(decoder.next_value().unwrap().unwrap().1, 2..5);
        assert_eq!(decoder.next_value().unwrap().unwrap().1, 7..10);
        assert!(decoder.next_value().unwrap().is_none());
    }
}
