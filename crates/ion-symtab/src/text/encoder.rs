//! Ion text encoder.
//!
//! Writes compact text: top-level values on separate lines, list and struct
//! items separated by `, `, s-expression items by a space.

use std::fmt::Write as _;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::is_bare_symbol;
use crate::constants::ION_1_0;
use crate::element::IonType;
use crate::error::{IonError, IonResult};
use crate::raw::RawWriter;
use crate::symbols::SymbolToken;

#[derive(Debug)]
struct Container {
    ion_type: IonType,
    count: usize,
}

#[derive(Debug, Default)]
pub struct TextWriter {
    out: String,
    containers: Vec<Container>,
    field_name: Option<SymbolToken>,
    annotations: Vec<SymbolToken>,
}

fn write_escaped(out: &mut String, text: &str, quote: char) {
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c => out.push(c),
        }
    }
}

/// Writes a symbol as an identifier, `'quoted'`, or `$n` when text is unknown.
fn write_symbol_token(out: &mut String, token: &SymbolToken) {
    match token.text_opt() {
        Some(text) if is_bare_symbol(text) => out.push_str(text),
        Some(text) => {
            out.push('\'');
            write_escaped(out, text, '\'');
            out.push('\'');
        }
        None => {
            let _ = write!(out, "${}", token.sid().unwrap_or(0));
        }
    }
}

fn write_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "+inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{value:e}");
    }
}

impl TextWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn into_string(self) -> IonResult<String> {
        if !self.containers.is_empty() {
            return Err(IonError::IllegalState(
                "cannot take the output while containers are open".to_owned(),
            ));
        }
        Ok(self.out)
    }

    /// Separator, field name and annotations for the next value.
    fn start_value(&mut self) -> IonResult<()> {
        let field_name = self.field_name.take();
        match self.containers.last_mut() {
            None => {
                if !self.out.is_empty() {
                    self.out.push('\n');
                }
            }
            Some(container) => {
                if container.count > 0 {
                    self.out
                        .push_str(if container.ion_type == IonType::SExp { " " } else { ", " });
                }
                container.count += 1;
                if container.ion_type == IonType::Struct {
                    let name = field_name.ok_or_else(|| {
                        IonError::IllegalState("a struct field requires a field name".to_owned())
                    })?;
                    write_symbol_token(&mut self.out, &name);
                    self.out.push_str(": ");
                }
            }
        }
        for annotation in std::mem::take(&mut self.annotations) {
            write_symbol_token(&mut self.out, &annotation);
            self.out.push_str("::");
        }
        Ok(())
    }
}

impl RawWriter for TextWriter {
    fn symbol_ids_required(&self) -> bool {
        false
    }

    fn depth(&self) -> usize {
        self.containers.len()
    }

    fn write_ivm(&mut self) -> IonResult<()> {
        if !self.containers.is_empty() {
            return Err(IonError::IllegalState(
                "an Ion version marker can only be written at the top level".to_owned(),
            ));
        }
        self.annotations.clear();
        self.start_value()?;
        self.out.push_str(ION_1_0);
        Ok(())
    }

    fn set_field_name(&mut self, name: SymbolToken) {
        self.field_name = Some(name);
    }

    fn set_annotations(&mut self, annotations: Vec<SymbolToken>) {
        self.annotations = annotations;
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.start_value()?;
        self.out.push_str("null");
        if ion_type != IonType::Null {
            self.out.push('.');
            self.out.push_str(ion_type.as_str());
        }
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.start_value()?;
        self.out.push_str(if value { "true" } else { "false" });
        Ok(())
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        self.start_value()?;
        let _ = write!(self.out, "{value}");
        Ok(())
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        self.start_value()?;
        write_float(&mut self.out, value);
        Ok(())
    }

    fn write_string(&mut self, value: &str) -> IonResult<()> {
        self.start_value()?;
        self.out.push('"');
        write_escaped(&mut self.out, value, '"');
        self.out.push('"');
        Ok(())
    }

    fn write_symbol(&mut self, value: SymbolToken) -> IonResult<()> {
        self.start_value()?;
        write_symbol_token(&mut self.out, &value);
        Ok(())
    }

    fn write_blob(&mut self, value: &[u8]) -> IonResult<()> {
        self.start_value()?;
        self.out.push_str("{{");
        self.out.push_str(&STANDARD.encode(value));
        self.out.push_str("}}");
        Ok(())
    }

    fn step_in(&mut self, ion_type: IonType) -> IonResult<()> {
        let open = match ion_type {
            IonType::List => '[',
            IonType::SExp => '(',
            IonType::Struct => '{',
            other => {
                return Err(IonError::IllegalArgument(format!(
                    "cannot step into a {other}"
                )))
            }
        };
        self.start_value()?;
        self.out.push(open);
        self.containers.push(Container { ion_type, count: 0 });
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let container = self.containers.pop().ok_or_else(|| {
            IonError::IllegalState("cannot step out of the top level".to_owned())
        })?;
        self.out.push(match container.ion_type {
            IonType::List => ']',
            IonType::SExp => ')',
            _ => '}',
        });
        Ok(())
    }

    fn fork(&self) -> Self {
        Self::new()
    }

    fn append(&mut self, other: Self) -> IonResult<()> {
        let text = other.into_string()?;
        if text.is_empty() {
            return Ok(());
        }
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(&text);
        Ok(())
    }
}
