//! Errors raised by symbol tables, readers and writers.

use crate::binary::BinaryDecodeError;
use crate::element::IonType;
use crate::symbols::Sid;
use crate::text::TextDecodeError;

/// Error type for every fallible operation in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IonError {
    #[error("symbol text must contain at least one character")]
    EmptySymbolText,
    #[error("symbol IDs must be greater than 0, got {0}")]
    InvalidSid(Sid),
    #[error("symbol table is read-only")]
    ReadOnly,
    #[error("illegal import: {0}")]
    IllegalImport(String),
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("unknown text for symbol ID ${0}")]
    UnknownSymbol(Sid),
    #[error("unsupported Ion version marker: {0}")]
    UnsupportedVersion(String),
    #[error("malformed shared symbol table: {0}")]
    MalformedSharedTable(String),
    #[error("malformed import: {0}")]
    MalformedImport(String),
    #[error("symbol ID space exhausted")]
    SidOverflow,
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch { expected: IonType, found: IonType },
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
    #[error(transparent)]
    Binary(#[from] BinaryDecodeError),
    #[error(transparent)]
    Text(#[from] TextDecodeError),
}

pub type IonResult<T> = Result<T, IonError>;

pub(crate) fn not_positioned() -> IonError {
    IonError::IllegalState("reader is not positioned on a value".to_owned())
}
