//! Data model for tabular data with collection cells

mod key;
mod schema;
mod table;

pub use key::KeyBuilder;
pub use schema::{CellType, Column, ColumnNameAllocator, TableSchema, UniqueNamePolicy};
pub use table::{CellValue, Row, Table};
