//! Ion 1.0 binary encoding.

mod decoder;
mod encoder;

pub use decoder::{BinaryDecoder, BinaryReader};
pub use encoder::BinaryWriter;

/// Binary Version Marker for Ion 1.0.
pub const ION_BVM: [u8; 4] = [0xe0, 0x01, 0x00, 0xea];

/// Type codes (high nibble of the type descriptor).
pub struct Type;

impl Type {
    pub const NULL: u8 = 0x0;
    pub const BOOL: u8 = 0x1;
    pub const UINT: u8 = 0x2;
    pub const NINT: u8 = 0x3;
    pub const FLOT: u8 = 0x4;
    pub const DECI: u8 = 0x5;
    pub const TIME: u8 = 0x6;
    pub const SYMB: u8 = 0x7;
    pub const STRI: u8 = 0x8;
    pub const CLOB: u8 = 0x9;
    pub const BINA: u8 = 0xa;
    pub const LIST: u8 = 0xb;
    pub const SEXP: u8 = 0xc;
    pub const STRU: u8 = 0xd;
    pub const ANNO: u8 = 0xe;
}

/// Type codes shifted into descriptor position.
pub struct TypeOverlay;

impl TypeOverlay {
    pub const NULL: u8 = Type::NULL << 4;
    pub const BOOL: u8 = Type::BOOL << 4;
    pub const UINT: u8 = Type::UINT << 4;
    pub const NINT: u8 = Type::NINT << 4;
    pub const FLOT: u8 = Type::FLOT << 4;
    pub const SYMB: u8 = Type::SYMB << 4;
    pub const STRI: u8 = Type::STRI << 4;
    pub const BINA: u8 = Type::BINA << 4;
    pub const LIST: u8 = Type::LIST << 4;
    pub const SEXP: u8 = Type::SEXP << 4;
    pub const STRU: u8 = Type::STRU << 4;
    pub const ANNO: u8 = Type::ANNO << 4;
}

/// Binary decoding error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BinaryDecodeError {
    #[error("unexpected end of input")]
    EndOfInput,
    #[error("invalid UTF-8")]
    InvalidUtf8,
    #[error("unsupported float length: {0}")]
    UnsupportedFloatLen(u8),
    #[error("negative zero integer is illegal")]
    NegativeZero,
    #[error("integer does not fit in 64 bits")]
    IntOverflow,
    #[error("invalid bool length: {0}")]
    InvalidBoolLen(u8),
    #[error("unsupported Ion type: 0x{0:01x}")]
    UnsupportedType(u8),
    #[error("annotation wrapper must have at least 3 bytes")]
    AnnotationTooShort(u8),
    #[error("annotation wrapper must wrap a single value")]
    InvalidAnnotationWrapper,
    #[error("VarUInt does not fit in 32 bits")]
    VarUIntOverflow,
    #[error("container parsing error: incorrect length")]
    ContainerLengthMismatch,
}

/// Writes a VarUInt: 7 data bits per byte, high bit set on the last byte.
pub(crate) fn write_vuint_to(out: &mut Vec<u8>, n: u32) {
    let mut groups = [0u8; 5];
    let mut len = 0;
    let mut rest = n;
    loop {
        groups[len] = (rest & 0x7f) as u8;
        len += 1;
        rest >>= 7;
        if rest == 0 {
            break;
        }
    }
    for i in (1..len).rev() {
        out.push(groups[i]);
    }
    out.push(0x80 | groups[0]);
}

/// Writes a type descriptor with its length, spilling to a VarUInt at 14.
pub(crate) fn write_header(out: &mut Vec<u8>, overlay: u8, len: usize) {
    if len < 14 {
        out.push(overlay | len as u8);
    } else {
        out.push(overlay | 14);
        write_vuint_to(out, len as u32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vuint_encoding() {
        let cases: [(u32, &[u8]); 4] = [
            (0, &[0x80]),
            (127, &[0xff]),
            (128, &[0x01, 0x80]),
            (16384, &[0x01, 0x00, 0x80]),
        ];
        for (n, expected) in cases {
            let mut out = Vec::new();
            write_vuint_to(&mut out, n);
            assert_eq!(out, expected, "{n}");
        }
    }

    #[test]
    fn long_headers_spill() {
        let mut out = Vec::new();
        write_header(&mut out, TypeOverlay::STRI, 13);
        write_header(&mut out, TypeOverlay::STRI, 14);
        assert_eq!(out, vec![0x8d, 0x8e, 0x8e]);
    }
}
