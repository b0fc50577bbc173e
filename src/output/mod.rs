//! Output formatting for ungrouped tables

mod csv;
mod json;
mod terminal;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::{Config, OutputFormat};
use crate::model::{ColumnNameAllocator, Table, UniqueNamePolicy};

pub use self::csv::CsvOutput;
pub use self::json::JsonOutput;
pub use self::terminal::TerminalOutput;

/// Name of the leading column holding row keys
pub const ROW_ID_COLUMN: &str = "RowID";

/// Headers of the table columns; a column clashing with the row-key column is renamed
pub(crate) fn column_headers(table: &Table) -> Vec<String> {
    let mut names = ColumnNameAllocator::new(&table.schema, UniqueNamePolicy::default());
    table
        .schema
        .names()
        .map(|name| {
            if name == ROW_ID_COLUMN {
                names.allocate(name)
            } else {
                name.to_string()
            }
        })
        .collect()
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a table to a writer
    fn render(&self, table: &Table, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter for the configured format
    pub fn create(config: &Config) -> Box<dyn OutputFormatter> {
        match config.output_format {
            OutputFormat::Terminal => Box::new(match config.max_rows {
                Some(max_rows) => TerminalOutput::with_max_rows(max_rows),
                None => TerminalOutput::new(),
            }),
            OutputFormat::Csv => Box::new(CsvOutput::with_delimiter(config.csv_delimiter())),
            OutputFormat::Json if config.compact_json => Box::new(JsonOutput::compact()),
            OutputFormat::Json => Box::new(JsonOutput::new()),
        }
    }
}

/// Render a table to stdout
pub fn render_to_stdout(table: &Table, config: &Config) -> Result<()> {
    let formatter = OutputFactory::create(config);
    let mut stdout = std::io::stdout().lock();
    formatter.render(table, &mut stdout)
}

/// Render a table to a file, replacing it
pub fn render_to_file(table: &Table, config: &Config, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    OutputFactory::create(config).render(table, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write output file: {}", path.display()))
}
