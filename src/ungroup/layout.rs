//! Column resolution and the shape of ungrouped rows

use crate::config::{ColumnSelection, UngroupSettings};
use crate::error::{Result, UngroupError};
use crate::model::{CellType, CellValue, Column, ColumnNameAllocator, Row, TableSchema};

/// Resolve the selected collection columns to ascending, distinct indices
pub fn resolve_columns(schema: &TableSchema, selection: &ColumnSelection) -> Result<Vec<usize>> {
    let mut indices = match selection {
        ColumnSelection::Names(names) => names
            .iter()
            .map(|name| {
                let index = schema.column_index(name).ok_or_else(|| {
                    UngroupError::invalid_config(format!(
                        "Column with name '{}' not found in input table",
                        name
                    ))
                })?;
                let column = &schema.columns()[index];
                // All-missing or empty columns carry no element type yet
                if !matches!(column.cell_type, CellType::Collection(_) | CellType::Null) {
                    return Err(UngroupError::invalid_config(format!(
                        "Column '{}' is not of collection type ({})",
                        name, column.cell_type
                    )));
                }
                Ok(index)
            })
            .collect::<Result<Vec<_>>>()?,
        ColumnSelection::AllCollections { exclude } => schema
            .columns()
            .iter()
            .filter(|c| c.cell_type.is_collection() && !exclude.contains(&c.name))
            .map(|c| c.index)
            .collect(),
    };
    indices.sort_unstable();
    indices.dedup();
    Ok(indices)
}

/// Output schema of an ungroup plus the mapping from input rows to output rows
#[derive(Debug, Clone)]
pub struct OutputLayout {
    input_width: usize,
    schema: TableSchema,
    collection_indices: Vec<usize>,
    remove_collection_columns: bool,
}

impl OutputLayout {
    /// Compute the output layout; fails before any row is seen if the settings don't fit
    pub fn resolve(input: &TableSchema, settings: &UngroupSettings) -> Result<Self> {
        let collection_indices = resolve_columns(input, &settings.columns)?;
        let remove = settings.remove_collection_columns;
        let mut names = ColumnNameAllocator::new(input, settings.unique_names.clone());

        let mut columns = Vec::with_capacity(input.column_count() + collection_indices.len());
        for column in input.columns() {
            if !collection_indices.contains(&column.index) {
                columns.push(column.clone());
                continue;
            }
            let element_type = column.cell_type.element_type().cloned().unwrap_or_default();
            if remove {
                columns.push(Column::with_type(column.name.clone(), 0, element_type));
            } else {
                columns.push(column.clone());
                columns.push(Column::with_type(names.allocate(&column.name), 0, element_type));
            }
        }

        Ok(Self {
            input_width: input.column_count(),
            schema: TableSchema::new(columns),
            collection_indices,
            remove_collection_columns: remove,
        })
    }

    /// Schema of the rows this layout produces
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    /// Input indices of the ungrouped columns, ascending
    pub fn collection_indices(&self) -> &[usize] {
        &self.collection_indices
    }

    /// Number of cells every input row must have
    pub fn input_width(&self) -> usize {
        self.input_width
    }

    /// True if no column is ungrouped and rows pass through unchanged
    pub fn is_passthrough(&self) -> bool {
        self.collection_indices.is_empty()
    }

    /// Build an output row from an input row and one new cell per ungrouped column
    pub(crate) fn assemble(&self, key: String, row: &Row, new_cells: Vec<CellValue>) -> Row {
        debug_assert_eq!(new_cells.len(), self.collection_indices.len());
        let mut cells = Vec::with_capacity(self.schema.column_count());
        let mut new_cells = new_cells.into_iter();
        let mut designated = self.collection_indices.iter().peekable();

        for (index, cell) in row.cells.iter().enumerate() {
            if designated.next_if_eq(&&index).is_some() {
                if !self.remove_collection_columns {
                    cells.push(cell.clone());
                }
                cells.push(new_cells.next().unwrap_or(CellValue::Null));
            } else {
                cells.push(cell.clone());
            }
        }

        Row::new(key, cells).with_source_line(row.source_line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UniqueNamePolicy;

    fn input() -> TableSchema {
        TableSchema::new(vec![
            Column::with_type("id", 0, CellType::String),
            Column::with_type("tags", 1, CellType::collection_of(CellType::String)),
            Column::with_type("scores", 2, CellType::collection_of(CellType::Int)),
        ])
    }

    fn names(schema: &TableSchema) -> Vec<&str> {
        schema.names().collect()
    }

    #[test]
    fn test_named_columns_are_sorted_and_deduplicated() {
        let selection = ColumnSelection::Names(vec!["scores".into(), "tags".into(), "scores".into()]);
        assert_eq!(resolve_columns(&input(), &selection).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_all_collections_honours_exclusions() {
        let selection = ColumnSelection::AllCollections {
            exclude: vec!["tags".into(), "missing".into()],
        };
        assert_eq!(resolve_columns(&input(), &selection).unwrap(), vec![2]);
    }

    #[test]
    fn test_unknown_column_is_invalid() {
        let selection = ColumnSelection::Names(vec!["nope".into()]);
        let err = resolve_columns(&input(), &selection).unwrap_err();
        assert!(matches!(err, UngroupError::InvalidConfiguration(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_scalar_column_is_invalid() {
        let selection = ColumnSelection::Names(vec!["id".into()]);
        let err = resolve_columns(&input(), &selection).unwrap_err();
        assert!(matches!(err, UngroupError::InvalidConfiguration(msg) if msg.contains("not of collection type")));
    }

    #[test]
    fn test_untyped_column_can_be_named() {
        let schema = TableSchema::new(vec![
            Column::with_type("id", 0, CellType::String),
            Column::with_type("tags", 1, CellType::Null),
        ]);
        let selection = ColumnSelection::Names(vec!["tags".into()]);
        assert_eq!(resolve_columns(&schema, &selection).unwrap(), vec![1]);

        let all = ColumnSelection::AllCollections { exclude: Vec::new() };
        assert!(resolve_columns(&schema, &all).unwrap().is_empty());

        let layout =
            OutputLayout::resolve(&schema, &UngroupSettings::default().with_columns(["tags"])).unwrap();
        assert_eq!(layout.schema().columns()[1].cell_type, CellType::Null);
    }

    #[test]
    fn test_replace_keeps_names_and_uses_element_types() {
        let layout = OutputLayout::resolve(&input(), &UngroupSettings::default()).unwrap();
        assert_eq!(names(layout.schema()), vec!["id", "tags", "scores"]);
        assert_eq!(layout.schema().columns()[1].cell_type, CellType::String);
        assert_eq!(layout.schema().columns()[2].cell_type, CellType::Int);
    }

    #[test]
    fn test_keep_inserts_unique_columns_after_originals() {
        let settings = UngroupSettings::default().with_remove_collection_columns(false);
        let layout = OutputLayout::resolve(&input(), &settings).unwrap();
        assert_eq!(
            names(layout.schema()),
            vec!["id", "tags", "tags (#1)", "scores", "scores (#1)"]
        );
        assert_eq!(layout.schema().columns()[4].index, 4);
        assert_eq!(layout.schema().columns()[4].cell_type, CellType::Int);

        let settings = settings.with_unique_names(UniqueNamePolicy::Suffix("_".into()));
        let layout = OutputLayout::resolve(&input(), &settings).unwrap();
        assert_eq!(names(layout.schema()), vec!["id", "tags", "tags_1", "scores", "scores_1"]);
    }

    #[test]
    fn test_assemble_inserts_or_replaces() {
        let row = Row::new(
            "r1",
            vec![
                CellValue::from("a"),
                CellValue::from(vec![CellValue::from("x")]),
                CellValue::Null,
            ],
        );
        let new_cells = vec![CellValue::from("x"), CellValue::Null];

        let replace = OutputLayout::resolve(&input(), &UngroupSettings::default()).unwrap();
        let out = replace.assemble("r1_1".into(), &row, new_cells.clone());
        assert_eq!(out.cells, vec![CellValue::from("a"), CellValue::from("x"), CellValue::Null]);

        let keep = OutputLayout::resolve(
            &input(),
            &UngroupSettings::default().with_remove_collection_columns(false),
        )
        .unwrap();
        let out = keep.assemble("r1_1".into(), &row, new_cells);
        assert_eq!(
            out.cells,
            vec![
                CellValue::from("a"),
                CellValue::from(vec![CellValue::from("x")]),
                CellValue::from("x"),
                CellValue::Null,
                CellValue::Null,
            ]
        );
    }
}
