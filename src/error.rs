//! Error types for the ungroup operation

use thiserror::Error;

/// Errors raised while resolving or executing an ungroup
#[derive(Debug, Error)]
pub enum UngroupError {
    /// Execution was canceled through the execution context
    #[error("Canceled")]
    Canceled,
    /// Settings do not fit the input schema
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A row key was seen twice in one table
    #[error("Duplicate row key '{0}'")]
    DuplicateRowKey(String),
    /// A row does not have one cell per schema column
    #[error("Row '{key}' has {actual} cells, expected {expected}")]
    RowWidth {
        key: String,
        expected: usize,
        actual: usize,
    },
}

impl UngroupError {
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        UngroupError::InvalidConfiguration(msg.into())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, UngroupError>;
