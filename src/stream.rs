//! Row streaming: pull-style inputs and push-style outputs

use crate::error::Result;
use crate::model::{Row, Table, TableSchema};

/// A source of rows sharing one schema
pub trait RowInput {
    /// Schema of every row this input yields
    fn schema(&self) -> &TableSchema;

    /// Next row, or `None` at end of stream
    fn poll(&mut self) -> Result<Option<Row>>;

    /// Total number of rows, if known up front
    fn row_count(&self) -> Option<usize> {
        None
    }
}

/// A sink accepting rows one at a time
pub trait RowOutput {
    fn push(&mut self, row: Row) -> Result<()>;
}

/// Streams the rows of an owned table
pub struct TableRowInput {
    schema: TableSchema,
    rows: std::vec::IntoIter<Row>,
    total: usize,
}

impl TableRowInput {
    pub fn new(table: Table) -> Self {
        let (schema, rows) = table.into_parts();
        let total = rows.len();
        Self {
            schema,
            rows: rows.into_iter(),
            total,
        }
    }
}

impl RowInput for TableRowInput {
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn poll(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }

    fn row_count(&self) -> Option<usize> {
        Some(self.total)
    }
}

/// Streams rows from any iterator; the length is unknown
pub struct IterRowInput<I> {
    schema: TableSchema,
    rows: I,
}

impl<I> IterRowInput<I>
where
    I: Iterator<Item = Row>,
{
    pub fn new(schema: TableSchema, rows: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            schema,
            rows: rows.into_iter(),
        }
    }
}

impl<I> RowInput for IterRowInput<I>
where
    I: Iterator<Item = Row>,
{
    fn schema(&self) -> &TableSchema {
        &self.schema
    }

    fn poll(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.next())
    }
}

/// Collects pushed rows into a table, enforcing key uniqueness and row width
pub struct TableRowOutput {
    table: Table,
}

impl TableRowOutput {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            table: Table::new(schema),
        }
    }

    /// Rows collected so far
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn into_table(self) -> Table {
        self.table
    }
}

impl RowOutput for TableRowOutput {
    fn push(&mut self, row: Row) -> Result<()> {
        self.table.push_row(row)
    }
}

impl RowOutput for Vec<Row> {
    fn push(&mut self, row: Row) -> Result<()> {
        Vec::push(self, row);
        Ok(())
    }
}
