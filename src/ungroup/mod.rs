//! The ungroup operation: one output row per element of the collection cells of a row

mod hilite;
mod layout;

use indexmap::IndexSet;

use crate::config::UngroupSettings;
use crate::error::{Result, UngroupError};
use crate::exec::ExecutionContext;
use crate::model::{CellValue, Row, Table, TableSchema};
use crate::stream::{RowInput, RowOutput, TableRowInput, TableRowOutput};

pub use hilite::HiliteMapping;
pub use layout::{resolve_columns, OutputLayout};

/// Counts and side results of one execution
#[derive(Debug, Clone, Default)]
pub struct UngroupSummary {
    /// Rows polled from the input
    pub rows_read: usize,
    /// Rows pushed to the output
    pub rows_written: usize,
    /// No column was selected and rows were forwarded unchanged
    pub passthrough: bool,
    /// Original to derived keys, present if hilite tracking was enabled
    pub hilite: Option<HiliteMapping>,
}

/// Ungroup operator bound to one input schema
#[derive(Debug, Clone)]
pub struct UngroupOperation {
    layout: OutputLayout,
    skip_missing_values: bool,
    enable_hilite: bool,
}

impl UngroupOperation {
    /// Resolve the settings against the input schema
    pub fn new(input: &TableSchema, settings: &UngroupSettings) -> Result<Self> {
        let layout = OutputLayout::resolve(input, settings)?;
        log::debug!(
            "ungrouping columns {:?}",
            layout
                .collection_indices()
                .iter()
                .filter_map(|&i| input.column(i).map(|c| c.name.as_str()))
                .collect::<Vec<_>>()
        );
        Ok(Self {
            layout,
            skip_missing_values: settings.skip_missing_values,
            enable_hilite: settings.enable_hilite,
        })
    }

    /// Schema of the produced rows
    pub fn output_schema(&self) -> &TableSchema {
        self.layout.schema()
    }

    /// True if no column is ungrouped
    pub fn is_passthrough(&self) -> bool {
        self.layout.is_passthrough()
    }

    /// Stream every row of `input` through the operation into `output`
    pub fn execute(
        &self,
        input: &mut dyn RowInput,
        output: &mut dyn RowOutput,
        exec: &dyn ExecutionContext,
    ) -> Result<UngroupSummary> {
        if input.schema().column_count() != self.layout.input_width() {
            return Err(UngroupError::invalid_config(format!(
                "Input has {} columns, operation was configured for {}",
                input.schema().column_count(),
                self.layout.input_width()
            )));
        }

        let mut summary = UngroupSummary {
            passthrough: self.is_passthrough(),
            ..Default::default()
        };
        if summary.passthrough {
            log::info!("No ungroup column selected, rows pass through unchanged");
        }
        if input.row_count() == Some(0) {
            return Ok(summary);
        }

        let total = input.row_count();
        let mut hilite = (self.enable_hilite && !summary.passthrough).then(HiliteMapping::new);

        while let Some(row) = input.poll()? {
            summary.rows_read += 1;
            exec.check_canceled()?;
            if let Some(total) = total {
                exec.set_progress(
                    summary.rows_read as f64 / total as f64,
                    &format!("Processing row {} of {}", summary.rows_read, total),
                );
            }
            if row.len() != self.layout.input_width() {
                return Err(UngroupError::RowWidth {
                    actual: row.len(),
                    expected: self.layout.input_width(),
                    key: row.key,
                });
            }

            if summary.passthrough {
                output.push(row)?;
                summary.rows_written += 1;
            } else {
                summary.rows_written += self.expand_row(&row, output, hilite.as_mut())?;
            }
        }

        log::info!(
            "Ungrouped {} rows into {} rows",
            summary.rows_read,
            summary.rows_written
        );
        summary.hilite = hilite;
        Ok(summary)
    }

    /// Push the rows generated from one input row; returns how many were pushed
    fn expand_row(
        &self,
        row: &Row,
        output: &mut dyn RowOutput,
        hilite: Option<&mut HiliteMapping>,
    ) -> Result<usize> {
        let indices = self.layout.collection_indices();
        let mut iterators: Vec<Option<std::slice::Iter<'_, CellValue>>> = indices
            .iter()
            .map(|&i| row.cells[i].as_collection().map(|items| items.iter()))
            .collect();

        if iterators.iter().all(Option::is_none) {
            if self.skip_missing_values {
                return Ok(0);
            }
            let missing = vec![CellValue::Null; indices.len()];
            output.push(self.layout.assemble(row.key.clone(), row, missing))?;
            if let Some(hilite) = hilite {
                hilite.insert(row.key.clone(), IndexSet::from([row.key.clone()]));
            }
            return Ok(1);
        }

        let mut derived = IndexSet::new();
        let mut counter = 1;
        loop {
            let mut any_element = false;
            let mut all_missing = true;
            let new_cells: Vec<CellValue> = iterators
                .iter_mut()
                .map(|iterator| {
                    let cell = match iterator.as_mut().and_then(Iterator::next) {
                        Some(cell) => {
                            any_element = true;
                            cell.clone()
                        }
                        None => CellValue::Null,
                    };
                    if !cell.is_missing() {
                        all_missing = false;
                    }
                    cell
                })
                .collect();

            if !any_element {
                break;
            }
            if all_missing && self.skip_missing_values {
                continue;
            }

            let key = format!("{}_{}", row.key, counter);
            counter += 1;
            output.push(self.layout.assemble(key.clone(), row, new_cells))?;
            derived.insert(key);
        }

        let written = derived.len();
        if let Some(hilite) = hilite {
            if !derived.is_empty() {
                hilite.insert(row.key.clone(), derived);
            }
        }
        Ok(written)
    }
}

/// Ungroup a whole table in memory
pub fn ungroup_table(
    table: Table,
    settings: &UngroupSettings,
    exec: &dyn ExecutionContext,
) -> Result<(Table, UngroupSummary)> {
    let operation = UngroupOperation::new(&table.schema, settings)?;
    let mut input = TableRowInput::new(table);
    let mut output = TableRowOutput::new(operation.output_schema().clone());
    let summary = operation.execute(&mut input, &mut output, exec)?;
    Ok((output.into_table(), summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecutionMonitor;
    use crate::model::{CellType, Column};
    use crate::stream::IterRowInput;

    fn s(v: &str) -> CellValue {
        CellValue::from(v)
    }

    fn coll(items: &[&str]) -> CellValue {
        CellValue::Collection(items.iter().map(|v| s(v)).collect())
    }

    fn schema() -> TableSchema {
        TableSchema::new(vec![
            Column::with_type("A", 0, CellType::collection_of(CellType::String)),
            Column::with_type("B", 1, CellType::collection_of(CellType::String)),
        ])
    }

    fn table(rows: Vec<Row>) -> Table {
        let mut table = Table::new(schema());
        for row in rows {
            table.push_row(row).unwrap();
        }
        table
    }

    fn run(rows: Vec<Row>, settings: UngroupSettings) -> (Table, UngroupSummary) {
        ungroup_table(table(rows), &settings, &ExecutionMonitor::new()).unwrap()
    }

    fn keys(table: &Table) -> Vec<&str> {
        table.rows.iter().map(|r| r.key.as_str()).collect()
    }

    #[test]
    fn test_parallel_collections_are_zipped() {
        let rows = vec![Row::new("r1", vec![coll(&["x", "y"]), coll(&["p"])])];
        let (out, summary) = run(rows, UngroupSettings::default().with_hilite(true));

        assert_eq!(keys(&out), vec!["r1_1", "r1_2"]);
        assert_eq!(out.rows[0].cells, vec![s("x"), s("p")]);
        assert_eq!(out.rows[1].cells, vec![s("y"), CellValue::Null]);
        assert_eq!(summary.rows_read, 1);
        assert_eq!(summary.rows_written, 2);

        let hilite = summary.hilite.unwrap();
        assert_eq!(
            hilite.derived_keys("r1"),
            Some(&IndexSet::from(["r1_1".to_string(), "r1_2".to_string()]))
        );
    }

    #[test]
    fn test_all_missing_row() {
        let row = || vec![Row::new("r2", vec![CellValue::Null, CellValue::Null])];

        let (out, _) = run(row(), UngroupSettings::default().with_skip_missing_values(true));
        assert_eq!(out.row_count(), 0);

        let (out, summary) = run(row(), UngroupSettings::default().with_hilite(true));
        assert_eq!(keys(&out), vec!["r2"]);
        assert_eq!(out.rows[0].cells, vec![CellValue::Null, CellValue::Null]);
        assert_eq!(
            summary.hilite.unwrap().derived_keys("r2"),
            Some(&IndexSet::from(["r2".to_string()]))
        );
    }

    #[test]
    fn test_longest_collection_decides_row_count() {
        let schema = TableSchema::new(vec![
            Column::with_type("A", 0, CellType::collection_of(CellType::String)),
            Column::with_type("B", 1, CellType::collection_of(CellType::String)),
            Column::with_type("C", 2, CellType::collection_of(CellType::String)),
        ]);
        let rows = vec![Row::new("k", vec![coll(&["1", "2", "3"]), coll(&["a"]), CellValue::Null])];
        let operation = UngroupOperation::new(&schema, &UngroupSettings::default()).unwrap();
        let mut input = IterRowInput::new(schema, rows);
        let mut output: Vec<Row> = Vec::new();
        operation
            .execute(&mut input, &mut output, &ExecutionMonitor::new())
            .unwrap();

        assert_eq!(output.len(), 3);
        assert_eq!(output[0].cells, vec![s("1"), s("a"), CellValue::Null]);
        assert_eq!(output[1].cells, vec![s("2"), CellValue::Null, CellValue::Null]);
        assert_eq!(output[2].cells, vec![s("3"), CellValue::Null, CellValue::Null]);
        assert_eq!(
            output.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
            vec!["k_1", "k_2", "k_3"]
        );
    }

    #[test]
    fn test_skip_missing_drops_all_missing_positions() {
        let rows = vec![Row::new(
            "r",
            vec![
                CellValue::Collection(vec![CellValue::Null, s("x"), CellValue::Null]),
                CellValue::Collection(vec![CellValue::Null]),
            ],
        )];

        let (out, _) = run(rows.clone(), UngroupSettings::default());
        assert_eq!(keys(&out), vec!["r_1", "r_2", "r_3"]);

        let (out, _) = run(rows, UngroupSettings::default().with_skip_missing_values(true));
        assert_eq!(keys(&out), vec!["r_1"]);
        assert_eq!(out.rows[0].cells, vec![s("x"), CellValue::Null]);
    }

    #[test]
    fn test_empty_collections_produce_no_rows() {
        let rows = vec![
            Row::new("e", vec![coll(&[]), CellValue::Null]),
            Row::new("f", vec![coll(&[]), coll(&[])]),
        ];
        let (out, summary) = run(rows, UngroupSettings::default().with_hilite(true));
        assert_eq!(out.row_count(), 0);
        assert!(summary.hilite.unwrap().is_empty());
    }

    #[test]
    fn test_keep_collection_columns() {
        let schema = TableSchema::new(vec![
            Column::with_type("id", 0, CellType::Int),
            Column::with_type("A", 1, CellType::collection_of(CellType::String)),
            Column::with_type("n", 2, CellType::Float),
        ]);
        let mut table = Table::new(schema);
        table
            .push_row(Row::new("r1", vec![CellValue::Int(7), coll(&["x", "y"]), CellValue::Float(0.5)]))
            .unwrap();

        let settings = UngroupSettings::default().with_remove_collection_columns(false);
        let (out, _) = ungroup_table(table, &settings, &ExecutionMonitor::new()).unwrap();

        assert_eq!(out.schema.names().collect::<Vec<_>>(), vec!["id", "A", "A (#1)", "n"]);
        assert_eq!(
            out.rows[1].cells,
            vec![CellValue::Int(7), coll(&["x", "y"]), s("y"), CellValue::Float(0.5)]
        );
    }

    #[test]
    fn test_empty_table_keeps_target_schema() {
        let settings = UngroupSettings::default().with_remove_collection_columns(false);
        let (out, summary) = ungroup_table(table(Vec::new()), &settings, &ExecutionMonitor::new()).unwrap();
        assert_eq!(out.row_count(), 0);
        assert_eq!(out.column_count(), 4);
        assert_eq!(summary.rows_read, 0);
    }

    #[test]
    fn test_no_selected_column_passes_rows_through() {
        let schema = TableSchema::new(vec![Column::with_type("v", 0, CellType::Int)]);
        let mut table = Table::new(schema);
        table.push_row(Row::new("a", vec![CellValue::Int(1)])).unwrap();

        let settings = UngroupSettings::default().with_hilite(true);
        let (out, summary) = ungroup_table(table, &settings, &ExecutionMonitor::new()).unwrap();
        assert!(summary.passthrough);
        assert!(summary.hilite.is_none());
        assert_eq!(keys(&out), vec!["a"]);
    }

    #[test]
    fn test_cancellation_stops_before_first_row() {
        let monitor = ExecutionMonitor::new();
        monitor.cancel_handle().cancel();

        let operation = UngroupOperation::new(&schema(), &UngroupSettings::default()).unwrap();
        let mut input = TableRowInput::new(table(vec![Row::new("r1", vec![coll(&["x"]), coll(&["y"])])]));
        let mut output: Vec<Row> = Vec::new();
        let err = operation.execute(&mut input, &mut output, &monitor).unwrap_err();

        assert!(matches!(err, UngroupError::Canceled));
        assert!(output.is_empty());
    }

    /// Cancels on the nth cancellation check
    struct CancelAfter {
        checks: std::cell::Cell<usize>,
        cancel_on: usize,
    }

    impl ExecutionContext for CancelAfter {
        fn check_canceled(&self) -> Result<()> {
            let checks = self.checks.get() + 1;
            self.checks.set(checks);
            if checks >= self.cancel_on {
                return Err(UngroupError::Canceled);
            }
            Ok(())
        }

        fn set_progress(&self, _fraction: f64, _message: &str) {}
    }

    #[test]
    fn test_cancellation_mid_stream_stops_pushing() {
        let exec = CancelAfter {
            checks: std::cell::Cell::new(0),
            cancel_on: 3,
        };
        let rows = vec![
            Row::new("r1", vec![coll(&["x", "y"]), coll(&["p"])]),
            Row::new("r2", vec![coll(&["z"]), CellValue::Null]),
            Row::new("r3", vec![coll(&["w"]), coll(&["q"])]),
            Row::new("r4", vec![coll(&["v"]), coll(&["s"])]),
        ];

        let operation = UngroupOperation::new(&schema(), &UngroupSettings::default()).unwrap();
        let mut input = TableRowInput::new(table(rows));
        let mut output: Vec<Row> = Vec::new();
        let err = operation.execute(&mut input, &mut output, &exec).unwrap_err();

        assert!(matches!(err, UngroupError::Canceled));
        assert_eq!(exec.checks.get(), 3);
        let pushed: Vec<&str> = output.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(pushed, vec!["r1_1", "r1_2", "r2_1"]);
    }

    #[test]
    fn test_progress_reaches_completion() {
        let monitor = ExecutionMonitor::new();
        let rows = vec![
            Row::new("r1", vec![coll(&["x"]), CellValue::Null]),
            Row::new("r2", vec![coll(&["y"]), CellValue::Null]),
        ];
        ungroup_table(table(rows), &UngroupSettings::default(), &monitor).unwrap();
        assert_eq!(monitor.progress(), 1.0);
    }

    #[test]
    fn test_wrong_row_width_fails() {
        let operation = UngroupOperation::new(&schema(), &UngroupSettings::default()).unwrap();
        let mut input = IterRowInput::new(schema(), vec![Row::new("bad", vec![coll(&["x"])])]);
        let err = operation
            .execute(&mut input, &mut Vec::<Row>::new(), &ExecutionMonitor::new())
            .unwrap_err();
        assert!(matches!(err, UngroupError::RowWidth { expected: 2, actual: 1, .. }));
    }

    #[test]
    fn test_invalid_configuration_fails_before_rows() {
        let settings = UngroupSettings::default().with_columns(["Z"]);
        let err = UngroupOperation::new(&schema(), &settings).unwrap_err();
        assert!(matches!(err, UngroupError::InvalidConfiguration(_)));
    }
}
