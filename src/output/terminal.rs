//! Box-drawn terminal table output

use std::io::Write;

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::model::Table;

use super::{column_headers, OutputFormatter, ROW_ID_COLUMN};

/// Terminal table output
pub struct TerminalOutput {
    max_rows: Option<usize>,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self { max_rows: None }
    }

    /// Print at most `max_rows` rows followed by an elision line
    pub fn with_max_rows(max_rows: usize) -> Self {
        Self {
            max_rows: Some(max_rows),
        }
    }

    fn write_summary(&self, table: &Table, writer: &mut dyn Write) -> Result<()> {
        writeln!(
            writer,
            "{} rows x {} columns",
            table.row_count(),
            table.column_count()
        )?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, table: &Table, writer: &mut dyn Write) -> Result<()> {
        let shown = self.max_rows.unwrap_or(usize::MAX).min(table.row_count());

        let mut builder = Builder::default();
        let headers = column_headers(table);
        builder.push_record(
            std::iter::once(ROW_ID_COLUMN.to_string()).chain(
                headers
                    .iter()
                    .zip(table.schema.columns())
                    .map(|(name, c)| format!("{} ({})", name, c.cell_type)),
            ),
        );
        for row in table.rows.iter().take(shown) {
            builder.push_record(
                std::iter::once(row.key.clone()).chain(row.cells.iter().map(|c| c.display().into_owned())),
            );
        }

        let mut rendered = builder.build();
        rendered.with(Style::modern());
        writeln!(writer, "{}", rendered)?;

        if shown < table.row_count() {
            writeln!(writer, "... {} more rows", table.row_count() - shown)?;
        }
        self.write_summary(table, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CellType, CellValue, Column, Row, TableSchema};

    fn table() -> Table {
        let mut table = Table::new(TableSchema::new(vec![Column::with_type("tag", 0, CellType::String)]));
        for i in 0..3 {
            table
                .push_row(Row::new(format!("r_{}", i + 1), vec![CellValue::from("x")]))
                .unwrap();
        }
        table
    }

    #[test]
    fn test_render_table() {
        let mut buf = Vec::new();
        TerminalOutput::new().render(&table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("tag (string)"));
        assert!(text.contains("r_3"));
        assert!(text.ends_with("3 rows x 1 columns\n"));
    }

    #[test]
    fn test_render_truncated() {
        let mut buf = Vec::new();
        TerminalOutput::with_max_rows(1).render(&table(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("r_2"));
        assert!(text.contains("... 2 more rows"));
    }
}
