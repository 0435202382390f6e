//! Symbol tables.
//!
//! - [`SharedSymbolTable`]: named, versioned, immutable; the system table is one.
//! - [`SubstituteSymbolTable`]: stands in for an import the catalog lacks.
//! - [`LocalSymbolTable`]: stream-scoped, grows through [`LocalSymbolTable::intern`].
//! - [`LocalSymbolTableImportAdapter`]: a local table imported like a shared one.
//! - [`SymbolTable`]: the cheap-to-clone handle readers and writers pass around.

mod adapter;
mod catalog;
mod image;
mod imports;
mod local;
mod shared;
mod substitute;
mod table;
mod token;

pub use adapter::LocalSymbolTableImportAdapter;
pub use catalog::{Catalog, EmptyCatalog, SimpleCatalog};
pub use image::{is_local_table_image, local_table_from_element, shared_table_from_element};
pub use imports::LocalSymbolTableImports;
pub use local::LocalSymbolTable;
pub use shared::SharedSymbolTable;
pub use substitute::SubstituteSymbolTable;
pub use table::SymbolTable;
pub use token::{Sid, SymbolToken};
