//! Parser layer for reading various tabular data formats

mod csv;
mod excel;
mod json;
mod parquet;

use std::borrow::Cow;
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::model::{CellType, CellValue, Column, KeyBuilder, Row, Table, TableSchema};

pub use self::csv::CsvParser;
pub use self::excel::ExcelParser;
pub use self::json::JsonParser;
pub use self::parquet::ParquetParser;

/// Trait for parsing tabular data files
pub trait Parser: Send + Sync {
    /// Parse a file and return a Table
    fn parse(&self, path: &Path, config: &Config) -> Result<Table>;

    /// Check if this parser can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool;
}

/// Factory for creating parsers based on file extension
pub struct ParserFactory {
    parsers: Vec<Box<dyn Parser>>,
}

impl Default for ParserFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserFactory {
    /// Create a new parser factory with all supported parsers
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(CsvParser),
                Box::new(ExcelParser),
                Box::new(ParquetParser),
                Box::new(JsonParser),
            ],
        }
    }

    /// Get a parser for the given file path; files without extension are sniffed
    pub fn get_parser(&self, path: &Path) -> Result<&dyn Parser> {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_lowercase(),
            None => detect_format(path).unwrap_or("").to_string(),
        };

        for parser in &self.parsers {
            if parser.supports_extension(&ext) {
                return Ok(parser.as_ref());
            }
        }

        bail!(
            "Unsupported file format: {}",
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("unknown")
        )
    }

    /// Parse a file using the appropriate parser
    pub fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let parser = self.get_parser(path)?;
        let table = parser.parse(path, config)?;
        log::debug!(
            "read {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }
}

/// Detect file format from content (for files without extension)
pub fn detect_format(path: &Path) -> Option<&'static str> {
    use std::fs::File;
    use std::io::{BufRead, BufReader};

    let file = File::open(path).ok()?;
    let mut reader = BufReader::new(file);
    let mut buffer = [0u8; 8];
    let bytes_read = std::io::Read::read(&mut reader, &mut buffer).ok()?;

    if bytes_read < 4 {
        return None;
    }

    // Check for Parquet magic bytes
    if &buffer[0..4] == b"PAR1" {
        return Some("parquet");
    }

    // Check for Excel ZIP format (xlsx)
    if &buffer[0..4] == b"PK\x03\x04" {
        return Some("xlsx");
    }

    // Check for old Excel format (xls)
    if &buffer[0..4] == b"\xD0\xCF\x11\xE0" {
        return Some("xls");
    }

    // Try to detect JSON
    reader.seek_relative(-(bytes_read as i64)).ok()?;
    let mut line = String::new();
    reader.read_line(&mut line).ok()?;
    let trimmed = line.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return Some("json");
    }

    // Default to CSV
    Some("csv")
}

/// Parse a JSON array literal such as `["a","b"]` into a collection cell
pub(crate) fn parse_collection_literal(s: &str) -> Option<CellValue> {
    let trimmed = s.trim();
    if !(trimmed.starts_with('[') && trimmed.ends_with(']')) {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value @ serde_json::Value::Array(_)) => Some(CellValue::from_json(&value)),
        _ => None,
    }
}

/// Keep a text cell as a string unless it is a collection literal or blank
pub(crate) fn text_cell(s: &str) -> CellValue {
    if s.trim().is_empty() {
        return CellValue::Null;
    }
    parse_collection_literal(s).unwrap_or_else(|| CellValue::String(Cow::Owned(s.to_string())))
}

/// Raw rows read by a parser, before keys and types are assigned
pub(crate) struct RawTable {
    pub names: Vec<String>,
    /// Column types declared by the source format; inferred from cells if absent
    pub declared_types: Option<Vec<CellType>>,
    /// Cells plus the 1-based source line of each row
    pub rows: Vec<(Vec<CellValue>, usize)>,
}

impl RawTable {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            declared_types: None,
            rows: Vec::new(),
        }
    }

    /// Add a row, padding short rows with missing cells
    pub fn push(&mut self, mut cells: Vec<CellValue>, source_line: usize) {
        if cells.len() < self.names.len() {
            cells.resize(self.names.len(), CellValue::Null);
        }
        cells.truncate(self.names.len());
        self.rows.push((cells, source_line));
    }

    /// Assign types and row keys and build the table
    pub fn into_table(self, config: &Config) -> Result<Table> {
        let types = match self.declared_types {
            Some(types) => types,
            None => infer_column_types(self.names.len(), &self.rows),
        };
        let columns = self
            .names
            .into_iter()
            .zip(types)
            .enumerate()
            .map(|(i, (name, cell_type))| Column::with_type(name, i, cell_type))
            .collect();
        let mut table = Table::new(TableSchema::new(columns));

        let keys = KeyBuilder::new().with_column_names(&table.schema, &config.key_columns)?;
        for (position, (cells, source_line)) in self.rows.into_iter().enumerate() {
            let key = keys.build_key(position, &cells);
            table.push_row(Row::new(key, cells).with_source_line(source_line))?;
        }
        Ok(table)
    }
}

/// Infer column types from data
fn infer_column_types(column_count: usize, rows: &[(Vec<CellValue>, usize)]) -> Vec<CellType> {
    (0..column_count)
        .map(|col_idx| {
            rows.iter()
                .filter_map(|(cells, _)| cells.get(col_idx))
                .fold(CellType::Null, |inferred, cell| inferred.widen(&cell.cell_type()))
        })
        .collect()
}
