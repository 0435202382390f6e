//! Ion binary encoder.
//!
//! Container contents are buffered until `step_out` so the length prefix can
//! be written in front of them. Every symbol must carry a SID.

use super::{write_header, write_vuint_to, TypeOverlay, ION_BVM};
use crate::element::IonType;
use crate::error::{IonError, IonResult};
use crate::raw::RawWriter;
use crate::symbols::{Sid, SymbolToken};

#[derive(Debug)]
struct Container {
    ion_type: IonType,
    field_sid: Option<Sid>,
    annotations: Vec<Sid>,
    buf: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct BinaryWriter {
    out: Vec<u8>,
    containers: Vec<Container>,
    field_name: Option<SymbolToken>,
    annotations: Vec<SymbolToken>,
}

fn sid_of(token: &SymbolToken) -> IonResult<Sid> {
    token.sid().ok_or_else(|| {
        IonError::IllegalArgument(format!("symbol {token} has no symbol ID to encode"))
    })
}

fn overlay(ion_type: IonType) -> u8 {
    match ion_type {
        IonType::Null => TypeOverlay::NULL,
        IonType::Bool => TypeOverlay::BOOL,
        IonType::Int => TypeOverlay::UINT,
        IonType::Float => TypeOverlay::FLOT,
        IonType::Symbol => TypeOverlay::SYMB,
        IonType::String => TypeOverlay::STRI,
        IonType::Blob => TypeOverlay::BINA,
        IonType::List => TypeOverlay::LIST,
        IonType::SExp => TypeOverlay::SEXP,
        IonType::Struct => TypeOverlay::STRU,
    }
}

fn uint_bytes(n: u64) -> Vec<u8> {
    let bytes = n.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    bytes[skip..].to_vec()
}

impl BinaryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes written at the top level so far.
    pub fn bytes(&self) -> &[u8] {
        &self.out
    }

    pub fn into_bytes(self) -> IonResult<Vec<u8>> {
        if !self.containers.is_empty() {
            return Err(IonError::IllegalState(
                "cannot take the output while containers are open".to_owned(),
            ));
        }
        Ok(self.out)
    }

    fn take_field_sid(&mut self) -> IonResult<Option<Sid>> {
        let name = self.field_name.take();
        match self.containers.last() {
            Some(container) if container.ion_type == IonType::Struct => {
                let name = name.ok_or_else(|| {
                    IonError::IllegalState("a struct field requires a field name".to_owned())
                })?;
                sid_of(&name).map(Some)
            }
            _ => Ok(None),
        }
    }

    fn take_annotation_sids(&mut self) -> IonResult<Vec<Sid>> {
        std::mem::take(&mut self.annotations)
            .iter()
            .map(sid_of)
            .collect()
    }

    fn buf(&mut self) -> &mut Vec<u8> {
        match self.containers.last_mut() {
            Some(container) => &mut container.buf,
            None => &mut self.out,
        }
    }

    /// Emits an encoded value with its field name and annotation wrapper.
    fn emit(&mut self, body: &[u8]) -> IonResult<()> {
        let field_sid = self.take_field_sid()?;
        let annotations = self.take_annotation_sids()?;
        let out = self.buf();
        if let Some(sid) = field_sid {
            write_vuint_to(out, sid);
        }
        write_annotated(out, &annotations, body);
        Ok(())
    }
}

fn write_annotated(out: &mut Vec<u8>, annotations: &[Sid], body: &[u8]) {
    if annotations.is_empty() {
        out.extend_from_slice(body);
        return;
    }
    let mut annot = Vec::new();
    for sid in annotations {
        write_vuint_to(&mut annot, *sid);
    }
    let mut content = Vec::with_capacity(annot.len() + body.len() + 1);
    write_vuint_to(&mut content, annot.len() as u32);
    content.extend_from_slice(&annot);
    content.extend_from_slice(body);
    write_header(out, TypeOverlay::ANNO, content.len());
    out.extend_from_slice(&content);
}

impl RawWriter for BinaryWriter {
    fn symbol_ids_required(&self) -> bool {
        true
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
        self.out.extend_from_slice(&ION_BVM);
        Ok(())
    }

    fn set_field_name(&mut self, name: SymbolToken) {
        self.field_name = Some(name);
    }

    fn set_annotations(&mut self, annotations: Vec<SymbolToken>) {
        self.annotations = annotations;
    }

    fn write_null(&mut self, ion_type: IonType) -> IonResult<()> {
        self.emit(&[overlay(ion_type) | 0x0f])
    }

    fn write_bool(&mut self, value: bool) -> IonResult<()> {
        self.emit(&[TypeOverlay::BOOL | u8::from(value)])
    }

    fn write_i64(&mut self, value: i64) -> IonResult<()> {
        let magnitude = uint_bytes(value.unsigned_abs());
        let overlay = if value < 0 {
            TypeOverlay::NINT
        } else {
            TypeOverlay::UINT
        };
        let mut body = Vec::with_capacity(magnitude.len() + 1);
        write_header(&mut body, overlay, magnitude.len());
        body.extend_from_slice(&magnitude);
        self.emit(&body)
    }

    fn write_f64(&mut self, value: f64) -> IonResult<()> {
        if value.to_bits() == 0 {
            return self.emit(&[TypeOverlay::FLOT]);
        }
        let mut body = Vec::with_capacity(9);
        body.push(TypeOverlay::FLOT | 8);
        body.extend_from_slice(&value.to_be_bytes());
        self.emit(&body)
    }

    fn write_string(&mut self, value: &str) -> IonResult<()> {
        let bytes = value.as_bytes();
        let mut body = Vec::with_capacity(bytes.len() + 6);
        write_header(&mut body, TypeOverlay::STRI, bytes.len());
        body.extend_from_slice(bytes);
        self.emit(&body)
    }

    fn write_symbol(&mut self, value: SymbolToken) -> IonResult<()> {
        let sid = uint_bytes(sid_of(&value)?.into());
        let mut body = Vec::with_capacity(sid.len() + 1);
        write_header(&mut body, TypeOverlay::SYMB, sid.len());
        body.extend_from_slice(&sid);
        self.emit(&body)
    }

    fn write_blob(&mut self, value: &[u8]) -> IonResult<()> {
        let mut body = Vec::with_capacity(value.len() + 6);
        write_header(&mut body, TypeOverlay::BINA, value.len());
        body.extend_from_slice(value);
        self.emit(&body)
    }

    fn step_in(&mut self, ion_type: IonType) -> IonResult<()> {
        if !ion_type.is_container() {
            return Err(IonError::IllegalArgument(format!(
                "cannot step into a {ion_type}"
            )));
        }
        let field_sid = self.take_field_sid()?;
        let annotations = self.take_annotation_sids()?;
        self.containers.push(Container {
            ion_type,
            field_sid,
            annotations,
            buf: Vec::new(),
        });
        Ok(())
    }

    fn step_out(&mut self) -> IonResult<()> {
        let container = self.containers.pop().ok_or_else(|| {
            IonError::IllegalState("cannot step out of the top level".to_owned())
        })?;
        let mut body = Vec::with_capacity(container.buf.len() + 6);
        write_header(&mut body, overlay(container.ion_type), container.buf.len());
        body.extend_from_slice(&container.buf);
        let out = self.buf();
        if let Some(sid) = container.field_sid {
            write_vuint_to(out, sid);
        }
        write_annotated(out, &container.annotations, &body);
        Ok(())
    }

    fn fork(&self) -> Self {
        Self::new()
    }

    fn append(&mut self, other: Self) -> IonResult<()> {
        let bytes = other.into_bytes()?;
        self.out.extend_from_slice(&bytes);
        Ok(())
    }
}
