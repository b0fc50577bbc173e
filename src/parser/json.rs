//! JSON array parser

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexSet;
use serde_json::Value;

use crate::config::Config;
use crate::model::{CellValue, Table};

use super::{Parser, RawTable};

/// Parser for JSON array files and newline-delimited JSON
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
        let reader = BufReader::new(file);

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let array = if matches!(ext.to_lowercase().as_str(), "jsonl" | "ndjson") {
            read_lines(reader)?
        } else {
            let value: Value =
                serde_json::from_reader(reader).context("Failed to parse JSON file")?;
            // Handle both arrays and single objects
            match value {
                Value::Array(arr) => arr,
                Value::Object(_) => vec![value],
                _ => bail!("JSON must be an array or object"),
            }
        };

        parse_values(&array, config)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "json" | "jsonl" | "ndjson")
    }
}

fn read_lines(reader: impl BufRead) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    for (line_num, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read JSON line")?;
        if line.trim().is_empty() {
            continue;
        }
        let value = serde_json::from_str(&line)
            .with_context(|| format!("Failed to parse JSON line {}", line_num + 1))?;
        values.push(value);
    }
    Ok(values)
}

fn parse_values(array: &[Value], config: &Config) -> Result<Table> {
    if array.is_empty() {
        bail!("JSON array is empty");
    }

    // Collect all unique keys across all objects to build column list
    let mut column_names: IndexSet<String> = IndexSet::new();
    for item in array {
        if let Value::Object(obj) = item {
            for key in obj.keys() {
                column_names.insert(key.clone());
            }
        }
    }

    let mut raw = RawTable::new(column_names.iter().cloned().collect());

    // Convert each object to a row
    for (line_num, item) in array.iter().enumerate() {
        let cells = match item {
            Value::Object(obj) => column_names
                .iter()
                .map(|key| obj.get(key).map(CellValue::from_json).unwrap_or(CellValue::Null))
                .collect(),
            // Non-object item in array: put in first column
            _ => vec![CellValue::from_json(item)],
        };

        raw.push(cells, line_num + 1);
    }

    raw.into_table(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    #[test]
    fn test_arrays_become_collection_columns() {
        let array: Vec<Value> = serde_json::from_str(
            r#"[{"id": "r1", "tags": ["x", "y"]}, {"id": "r2", "tags": null, "n": 1}]"#,
        )
        .unwrap();
        let config = Config::default().with_key_columns(vec!["id".to_string()]);
        let table = parse_values(&array, &config).unwrap();

        assert_eq!(table.schema.names().collect::<Vec<_>>(), vec!["id", "tags", "n"]);
        assert_eq!(
            table.schema.columns()[1].cell_type,
            CellType::collection_of(CellType::String)
        );
        assert_eq!(table.get_row("r1").unwrap().cells[2], CellValue::Null);
        assert!(table.get_row("r2").unwrap().cells[1].is_missing());
    }

    #[test]
    fn test_read_lines_skips_blank_lines() {
        let input = "{\"a\": [1]}\n\n{\"a\": []}\n";
        let values = read_lines(input.as_bytes()).unwrap();
        assert_eq!(values.len(), 2);
    }
}
