//! CSV output format

use std::borrow::Cow;
use std::io::Write;

use anyhow::Result;

use crate::model::{CellValue, Table};

use super::{column_headers, OutputFormatter, ROW_ID_COLUMN};

/// CSV output; collections are written as JSON arrays, missing cells as empty fields
pub struct CsvOutput {
    delimiter: u8,
}

impl CsvOutput {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvOutput {
    fn default() -> Self {
        Self::new()
    }
}

fn field(cell: &CellValue) -> Cow<'_, str> {
    match cell {
        CellValue::Null => "".into(),
        other => other.display(),
    }
}

impl OutputFormatter for CsvOutput {
    fn render(&self, table: &Table, writer: &mut dyn Write) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(writer);

        let headers = column_headers(table);
        csv_writer.write_record(std::iter::once(ROW_ID_COLUMN).chain(headers.iter().map(String::as_str)))?;

        for row in &table.rows {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(row.key.clone());
            record.extend(row.cells.iter().map(|c| field(c).into_owned()));
            csv_writer.write_record(&record)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
