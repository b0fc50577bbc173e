//! Parquet file parser; list columns are read as collection columns

use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use arrow::array::{
    Array, ArrayRef, BooleanArray, Date32Array, FixedSizeListArray, Float32Array, Float64Array,
    Int16Array, Int32Array, Int64Array, Int8Array, LargeListArray, LargeStringArray, ListArray,
    StringArray, TimestampMicrosecondArray, TimestampMillisecondArray, TimestampNanosecondArray,
    TimestampSecondArray, UInt16Array, UInt32Array, UInt64Array, UInt8Array,
};
use arrow::datatypes::{DataType as ArrowType, TimeUnit};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use crate::config::Config;
use crate::model::{CellType, CellValue, Table};

use super::{Parser, RawTable};

/// Parser for Parquet files
pub struct ParquetParser;

impl Parser for ParquetParser {
    fn parse(&self, path: &Path, config: &Config) -> Result<Table> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open Parquet file: {}", path.display()))?;

        let builder = ParquetRecordBatchReaderBuilder::try_new(file)
            .context("Failed to create Parquet reader")?;

        let schema = builder.schema().clone();
        let reader = builder.build().context("Failed to build Parquet reader")?;

        // Column types come from the file schema
        let mut raw = RawTable::new(schema.fields().iter().map(|f| f.name().clone()).collect());
        raw.declared_types = Some(
            schema
                .fields()
                .iter()
                .map(|f| arrow_type_to_cell_type(f.data_type()))
                .collect(),
        );

        // Read record batches
        let mut line_num = 0usize;
        for batch_result in reader {
            let batch = batch_result.context("Failed to read Parquet batch")?;

            for row_idx in 0..batch.num_rows() {
                line_num += 1;
                let cells: Vec<CellValue> = batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell_value(col.as_ref(), row_idx))
                    .collect::<Result<_>>()?;

                raw.push(cells, line_num);
            }
        }

        raw.into_table(config)
    }

    fn supports_extension(&self, ext: &str) -> bool {
        matches!(ext.to_lowercase().as_str(), "parquet" | "pq")
    }
}

fn arrow_type_to_cell_type(arrow_type: &ArrowType) -> CellType {
    match arrow_type {
        ArrowType::Null => CellType::Null,
        ArrowType::Boolean => CellType::Bool,
        ArrowType::Int8
        | ArrowType::Int16
        | ArrowType::Int32
        | ArrowType::Int64
        | ArrowType::UInt8
        | ArrowType::UInt16
        | ArrowType::UInt32
        | ArrowType::UInt64 => CellType::Int,
        ArrowType::Float16 | ArrowType::Float32 | ArrowType::Float64 => CellType::Float,
        ArrowType::Utf8 | ArrowType::LargeUtf8 => CellType::String,
        ArrowType::Date32 | ArrowType::Date64 => CellType::Date,
        ArrowType::Timestamp(_, _) => CellType::DateTime,
        ArrowType::List(field) | ArrowType::LargeList(field) | ArrowType::FixedSizeList(field, _) => {
            CellType::collection_of(arrow_type_to_cell_type(field.data_type()))
        }
        _ => CellType::String, // Fallback to string for other complex types
    }
}

fn downcast<T: Array + 'static>(array: &dyn Array) -> Result<&T> {
    array
        .as_any()
        .downcast_ref::<T>()
        .with_context(|| format!("Unexpected Arrow array for type {}", array.data_type()))
}

fn collection(values: ArrayRef) -> Result<CellValue> {
    (0..values.len())
        .map(|i| extract_cell_value(values.as_ref(), i))
        .collect::<Result<Vec<_>>>()
        .map(CellValue::Collection)
}

fn extract_cell_value(array: &dyn Array, row_idx: usize) -> Result<CellValue> {
    if array.is_null(row_idx) {
        return Ok(CellValue::Null);
    }

    let value = match array.data_type() {
        ArrowType::Boolean => CellValue::Bool(downcast::<BooleanArray>(array)?.value(row_idx)),
        ArrowType::Int8 => CellValue::Int(downcast::<Int8Array>(array)?.value(row_idx) as i64),
        ArrowType::Int16 => CellValue::Int(downcast::<Int16Array>(array)?.value(row_idx) as i64),
        ArrowType::Int32 => CellValue::Int(downcast::<Int32Array>(array)?.value(row_idx) as i64),
        ArrowType::Int64 => CellValue::Int(downcast::<Int64Array>(array)?.value(row_idx)),
        ArrowType::UInt8 => CellValue::Int(downcast::<UInt8Array>(array)?.value(row_idx) as i64),
        ArrowType::UInt16 => CellValue::Int(downcast::<UInt16Array>(array)?.value(row_idx) as i64),
        ArrowType::UInt32 => CellValue::Int(downcast::<UInt32Array>(array)?.value(row_idx) as i64),
        ArrowType::UInt64 => CellValue::Int(downcast::<UInt64Array>(array)?.value(row_idx) as i64),
        ArrowType::Float32 => {
            CellValue::Float(downcast::<Float32Array>(array)?.value(row_idx) as f64)
        }
        ArrowType::Float64 => CellValue::Float(downcast::<Float64Array>(array)?.value(row_idx)),
        ArrowType::Utf8 => CellValue::String(Cow::Owned(
            downcast::<StringArray>(array)?.value(row_idx).to_string(),
        )),
        ArrowType::LargeUtf8 => CellValue::String(Cow::Owned(
            downcast::<LargeStringArray>(array)?.value(row_idx).to_string(),
        )),
        ArrowType::Date32 => {
            let days = downcast::<Date32Array>(array)?.value(row_idx);
            match chrono::NaiveDate::from_num_days_from_ce_opt(days + 719163) {
                Some(date) => CellValue::Date(date),
                None => CellValue::Int(days as i64),
            }
        }
        ArrowType::Timestamp(unit, _) => {
            let (raw, scale) = match unit {
                TimeUnit::Second => (downcast::<TimestampSecondArray>(array)?.value(row_idx), 1_000_000_000),
                TimeUnit::Millisecond => {
                    (downcast::<TimestampMillisecondArray>(array)?.value(row_idx), 1_000_000)
                }
                TimeUnit::Microsecond => {
                    (downcast::<TimestampMicrosecondArray>(array)?.value(row_idx), 1_000)
                }
                TimeUnit::Nanosecond => (downcast::<TimestampNanosecondArray>(array)?.value(row_idx), 1),
            };
            // Nanoseconds since the epoch only reach the year 2262
            match raw.checked_mul(scale) {
                Some(nanos) => CellValue::DateTime(chrono::DateTime::from_timestamp_nanos(nanos).naive_utc()),
                None => CellValue::Int(raw),
            }
        }
        ArrowType::List(_) => collection(downcast::<ListArray>(array)?.value(row_idx))?,
        ArrowType::LargeList(_) => collection(downcast::<LargeListArray>(array)?.value(row_idx))?,
        ArrowType::FixedSizeList(_, _) => {
            collection(downcast::<FixedSizeListArray>(array)?.value(row_idx))?
        }
        _ => {
            // Fallback: convert to string
            let formatter = arrow::util::display::ArrayFormatter::try_new(
                array,
                &arrow::util::display::FormatOptions::default(),
            );
            match formatter {
                Ok(fmt) => CellValue::String(Cow::Owned(fmt.value(row_idx).to_string())),
                Err(_) => CellValue::Null,
            }
        }
    };
    Ok(value)
}
