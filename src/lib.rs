//! ungroup - Expand collection cells of tabular data into rows
//!
//! Replaces each row by one row per element across the parallel collections in selected
//! columns, optionally tracking which generated rows came from which original row.
//! Reads CSV, Excel, Parquet and JSON; writes terminal tables, CSV and JSON.

pub mod config;
pub mod error;
pub mod exec;
pub mod model;
pub mod output;
pub mod parser;
pub mod stream;
pub mod ungroup;

pub use config::{ColumnSelection, Config, UngroupSettings};
pub use error::UngroupError;
pub use exec::{CancelHandle, ExecutionContext, ExecutionMonitor};
pub use model::{CellValue, Row, Table};
pub use stream::{RowInput, RowOutput};
pub use ungroup::{ungroup_table, HiliteMapping, UngroupOperation, UngroupSummary};
