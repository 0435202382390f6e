//! Ion 1.0 text encoding.
//!
//! Covers the value types in [`crate::element::IonType`]. Decimals are read
//! as floats; timestamps and clobs are rejected.

mod decoder;
mod encoder;

pub use decoder::{TextDecoder, TextReader};
pub use encoder::TextWriter;

/// Text decoding error; offsets are byte positions in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextDecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid Ion text at position {0}")]
    Invalid(usize),
    #[error("invalid escape sequence at position {0}")]
    InvalidEscape(usize),
    #[error("invalid UTF-8 at position {0}")]
    InvalidUtf8(usize),
    #[error("integer out of range at position {0}")]
    IntOverflow(usize),
    #[error("invalid base64 blob at position {0}")]
    InvalidBlob(usize),
    #[error("unsupported Ion type {1} at position {0}")]
    UnsupportedType(usize, &'static str),
}

fn identifier_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap())
}

fn symbol_id_regex() -> &'static regex::Regex {
    use std::sync::OnceLock;
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^\$[0-9]+$").unwrap())
}

/// True when `text` can be written as a bare identifier symbol.
pub(crate) fn is_bare_symbol(text: &str) -> bool {
    identifier_regex().is_match(text)
        && !symbol_id_regex().is_match(text)
        && !matches!(text, "null" | "true" | "false" | "nan")
}

/// `$n` as a SID, for text that spells a symbol ID.
pub(crate) fn symbol_id(text: &str) -> Option<crate::symbols::Sid> {
    if !symbol_id_regex().is_match(text) {
        return None;
    }
    text[1..].parse().ok()
}
