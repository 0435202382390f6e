//! Ion symbol tables with symbol-table-aware readers and writers.
//!
//! - [`symbols`]: system, shared, substitute and local tables, imports and
//!   catalogs.
//! - [`IonReader`]: consumes version markers and local symbol tables found in
//!   a stream and resolves symbol IDs against the current table.
//! - [`IonWriter`]: emits version markers by policy, interns new symbol text
//!   and turns written `$ion_symbol_table` structs into the active table.
//! - [`binary`], [`text`], [`tree`]: raw token sources and sinks.

pub mod binary;
pub mod constants;
pub mod element;
pub mod error;
pub mod pending;
pub mod raw;
pub mod reader;
pub mod symbols;
pub mod text;
pub mod tree;
pub mod writer;

pub use binary::{BinaryDecodeError, BinaryReader, BinaryWriter};
pub use element::{Element, IonType, Value};
pub use error::{IonError, IonResult};
pub use pending::PendingTableStack;
pub use raw::{write_element, Capabilities, RawReader, RawWriter};
pub use reader::{IonReader, ReaderMode, ReaderOptions, Span, TableState};
pub use symbols::{
    Catalog, EmptyCatalog, LocalSymbolTable, LocalSymbolTableImportAdapter,
    LocalSymbolTableImports, SharedSymbolTable, SimpleCatalog, Sid, SubstituteSymbolTable,
    SymbolTable, SymbolToken,
};
pub use text::{TextDecodeError, TextReader, TextWriter};
pub use tree::{TreeReader, TreeWriter};
pub use writer::{IonWriter, IvmPolicy, WriterOptions, WriterState};
