//! Table, Row, and Cell data structures

use std::borrow::Cow;
use std::hash::{Hash, Hasher};

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::{CellType, TableSchema};
use crate::error::{Result, UngroupError};

/// A cell value with type information
///
/// `Null` is the missing cell. `Collection` holds zero or more element cells and is the
/// only variant the ungroup operation expands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Cow<'static, str>),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Collection(Vec<CellValue>),
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::Int(a), CellValue::Int(b)) => a == b,
            (CellValue::Float(a), CellValue::Float(b)) => {
                // Handle NaN comparison
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b
                }
            }
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::Collection(a), CellValue::Collection(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Bool(b) => b.hash(state),
            CellValue::Int(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::String(s) => s.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::DateTime(dt) => dt.hash(state),
            CellValue::Collection(items) => items.hash(state),
        }
    }
}

impl CellValue {
    /// Check if the value is the missing cell
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Check if the value is a collection
    pub fn is_collection(&self) -> bool {
        matches!(self, CellValue::Collection(_))
    }

    /// Elements of a collection cell, `None` for every other cell
    pub fn as_collection(&self) -> Option<&[CellValue]> {
        match self {
            CellValue::Collection(items) => Some(items),
            _ => None,
        }
    }

    /// Type of this single value
    pub fn cell_type(&self) -> CellType {
        match self {
            CellValue::Null => CellType::Null,
            CellValue::Bool(_) => CellType::Bool,
            CellValue::Int(_) => CellType::Int,
            CellValue::Float(_) => CellType::Float,
            CellValue::String(_) => CellType::String,
            CellValue::Date(_) => CellType::Date,
            CellValue::DateTime(_) => CellType::DateTime,
            CellValue::Collection(items) => CellType::collection_of(
                items
                    .iter()
                    .fold(CellType::Null, |acc, item| acc.widen(&item.cell_type())),
            ),
        }
    }

    /// Convert to a display string
    pub fn display(&self) -> Cow<'_, str> {
        match self {
            CellValue::Null => Cow::Borrowed("NULL"),
            CellValue::Bool(b) => Cow::Owned(b.to_string()),
            CellValue::Int(i) => Cow::Owned(i.to_string()),
            CellValue::Float(f) => Cow::Owned(f.to_string()),
            CellValue::String(s) => Cow::Borrowed(s.as_ref()),
            CellValue::Date(d) => Cow::Owned(d.to_string()),
            CellValue::DateTime(dt) => Cow::Owned(dt.to_string()),
            CellValue::Collection(_) => Cow::Owned(self.to_json().to_string()),
        }
    }

    /// Convert to a JSON value; dates are written as ISO strings
    pub fn to_json(&self) -> Value {
        match self {
            CellValue::Null => Value::Null,
            CellValue::Bool(b) => Value::Bool(*b),
            CellValue::Int(i) => serde_json::json!(*i),
            CellValue::Float(f) => serde_json::json!(*f),
            CellValue::String(s) => Value::String(s.to_string()),
            CellValue::Date(d) => Value::String(d.to_string()),
            CellValue::DateTime(dt) => Value::String(dt.to_string()),
            CellValue::Collection(items) => Value::Array(items.iter().map(CellValue::to_json).collect()),
        }
    }

    /// Convert from a JSON value; arrays become collections
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Bool(b) => CellValue::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    CellValue::Int(i)
                } else if let Some(f) = n.as_f64() {
                    CellValue::Float(f)
                } else {
                    CellValue::String(Cow::Owned(n.to_string()))
                }
            }
            Value::String(s) => {
                // Try parsing as date/datetime
                if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    return CellValue::Date(date);
                }
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    return CellValue::DateTime(dt);
                }
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                    return CellValue::DateTime(dt);
                }
                CellValue::String(Cow::Owned(s.clone()))
            }
            Value::Array(arr) => CellValue::Collection(arr.iter().map(CellValue::from_json).collect()),
            // Nested objects stay opaque
            Value::Object(obj) => {
                CellValue::String(Cow::Owned(serde_json::to_string(obj).unwrap_or_default()))
            }
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(Cow::Owned(s.to_string()))
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(Cow::Owned(s))
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl From<Vec<CellValue>> for CellValue {
    fn from(items: Vec<CellValue>) -> Self {
        CellValue::Collection(items)
    }
}

impl<T> From<Option<T>> for CellValue
where
    T: Into<CellValue>,
{
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => CellValue::Null,
        }
    }
}

/// A row in the table
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// Unique row key
    pub key: String,
    /// Cell values in column order
    pub cells: Vec<CellValue>,
    /// Original line/row number in source file (1-indexed), 0 if the row was generated
    pub source_line: usize,
}

impl Row {
    /// Create a new row
    pub fn new(key: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            key: key.into(),
            cells,
            source_line: 0,
        }
    }

    /// Attach the source line this row was read from
    pub fn with_source_line(mut self, source_line: usize) -> Self {
        self.source_line = source_line;
        self
    }

    /// Get a cell value by column index
    pub fn get(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index)
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if the row has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A table containing a schema and rows with unique keys
#[derive(Debug, Clone)]
pub struct Table {
    /// Column definitions
    pub schema: TableSchema,
    /// All rows in the table
    pub rows: Vec<Row>,
    /// Index from row key to row position
    row_index: IndexMap<String, usize>,
}

impl Table {
    /// Create a new empty table with column definitions
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
            row_index: IndexMap::new(),
        }
    }

    /// Add a row, rejecting duplicate keys and rows of the wrong width
    pub fn push_row(&mut self, row: Row) -> Result<()> {
        if row.len() != self.schema.column_count() {
            return Err(UngroupError::RowWidth {
                actual: row.len(),
                expected: self.schema.column_count(),
                key: row.key,
            });
        }
        if self.row_index.contains_key(&row.key) {
            return Err(UngroupError::DuplicateRowKey(row.key));
        }
        self.row_index.insert(row.key.clone(), self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Look up a row by key
    pub fn get_row(&self, key: &str) -> Option<&Row> {
        self.row_index.get(key).map(|&idx| &self.rows[idx])
    }

    /// Get column index by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.schema.column_index(name)
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.schema.column_count()
    }

    /// Take the schema and rows apart
    pub fn into_parts(self) -> (TableSchema, Vec<Row>) {
        (self.schema, self.rows)
    }
}
