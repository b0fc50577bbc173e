//! Row key generation

use super::schema::TableSchema;
use super::table::CellValue;
use crate::error::{Result, UngroupError};

/// Builder for row keys, either composite keys from key columns or positional `Row<n>` keys
pub struct KeyBuilder {
    column_indices: Vec<usize>,
    separator: String,
    prefix: String,
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBuilder {
    /// Create a new key builder producing positional keys
    pub fn new() -> Self {
        Self {
            column_indices: Vec::new(),
            separator: "|".to_string(),
            prefix: "Row".to_string(),
        }
    }

    /// Set the key columns by index
    pub fn with_columns(mut self, indices: Vec<usize>) -> Self {
        self.column_indices = indices;
        self
    }

    /// Set the key columns by name; every name must exist in the schema
    pub fn with_column_names(mut self, schema: &TableSchema, names: &[String]) -> Result<Self> {
        self.column_indices = names
            .iter()
            .map(|name| {
                schema.column_index(name).ok_or_else(|| {
                    UngroupError::invalid_config(format!("Key column '{}' not found in input table", name))
                })
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// Set the separator between key components
    pub fn with_separator(mut self, sep: impl Into<String>) -> Self {
        self.separator = sep.into();
        self
    }

    /// Build the key for the `position`-th data row (0-based)
    pub fn build_key(&self, position: usize, cells: &[CellValue]) -> String {
        if self.column_indices.is_empty() {
            format!("{}{}", self.prefix, position)
        } else {
            self.column_indices
                .iter()
                .filter_map(|&i| cells.get(i))
                .map(|c| c.display().into_owned())
                .collect::<Vec<_>>()
                .join(&self.separator)
        }
    }

    /// Check if key columns are set
    pub fn has_key_columns(&self) -> bool {
        !self.column_indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Column;

    #[test]
    fn test_positional_keys() {
        let keys = KeyBuilder::new();
        assert_eq!(keys.build_key(0, &[]), "Row0");
        assert_eq!(keys.build_key(12, &[CellValue::Int(5)]), "Row12");
    }

    #[test]
    fn test_composite_keys() {
        let schema = TableSchema::new(vec![Column::new("a", 0), Column::new("b", 1)]);
        let keys = KeyBuilder::new()
            .with_column_names(&schema, &["b".to_string(), "a".to_string()])
            .unwrap()
            .with_separator("-");
        assert!(keys.has_key_columns());
        assert_eq!(keys.build_key(0, &[CellValue::Int(1), CellValue::from("x")]), "x-1");
    }

    #[test]
    fn test_unknown_key_column() {
        let schema = TableSchema::new(vec![Column::new("a", 0)]);
        assert!(KeyBuilder::new()
            .with_column_names(&schema, &["zzz".to_string()])
            .is_err());
    }
}
