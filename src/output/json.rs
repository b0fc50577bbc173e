//! JSON output format

use std::io::Write;

use anyhow::Result;
use indexmap::IndexMap;
use serde_json::Value;

use crate::model::Table;

use super::{column_headers, OutputFormatter, ROW_ID_COLUMN};

/// JSON output formatter: an array with one object per row, keys in column order
pub struct JsonOutput {
    pretty: bool,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for JsonOutput {
    fn render(&self, table: &Table, writer: &mut dyn Write) -> Result<()> {
        let headers = column_headers(table);
        let rows: Vec<IndexMap<&str, Value>> = table
            .rows
            .iter()
            .map(|row| {
                std::iter::once((ROW_ID_COLUMN, Value::String(row.key.clone())))
                    .chain(
                        headers
                            .iter()
                            .map(String::as_str)
                            .zip(row.cells.iter().map(|c| c.to_json())),
                    )
                    .collect()
            })
            .collect();

        if self.pretty {
            serde_json::to_writer_pretty(&mut *writer, &rows)?;
        } else {
            serde_json::to_writer(&mut *writer, &rows)?;
        }
        writeln!(writer)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellValue, Column, Row, TableSchema};

    #[test]
    fn test_render_keeps_column_order() {
        let mut table = Table::new(TableSchema::new(vec![Column::new("z", 0), Column::new("a", 1)]));
        table
            .push_row(Row::new("r1_1", vec![CellValue::from("x"), CellValue::Null]))
            .unwrap();

        let mut buf = Vec::new();
        JsonOutput::compact().render(&table, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[{\"RowID\":\"r1_1\",\"z\":\"x\",\"a\":null}]\n"
        );
    }

    #[test]
    fn test_render_keeps_row_key_beside_row_id_column() {
        let mut table = Table::new(TableSchema::new(vec![Column::new(ROW_ID_COLUMN, 0)]));
        table
            .push_row(Row::new("r1_1", vec![CellValue::from("source-id")]))
            .unwrap();

        let mut buf = Vec::new();
        JsonOutput::compact().render(&table, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "[{\"RowID\":\"r1_1\",\"RowID (#1)\":\"source-id\"}]\n"
        );
    }
}
