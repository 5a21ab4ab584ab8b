//! Core data structures for PanelBreak
//!
//! This module provides the tabular containers the estimators read from:
//! a column-ordered `DataFrame` of typed `Series`, plus the error type every
//! data-level check reports through.

use serde::{Deserialize, Serialize};

mod builder;
mod dataframe;
mod series;


// Re-exports
pub use builder::DataFrameBuilder;
pub use dataframe::{DataFrame, Row};
pub use series::{Series, SeriesStats, SeriesValue};

// Type aliases for common use cases
pub type FloatArray = ndarray::Array1<f64>;
pub type IntArray = ndarray::Array1<i64>;
pub type BoolArray = ndarray::Array1<bool>;
pub type StringArray = Vec<String>;
pub type Matrix = ndarray::Array2<f64>;

/// Error types specific to data operations
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Index out of bounds: index {index}, length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Duplicate column name: {0}")]
    DuplicateColumn(String),

    #[error("Column '{column}' requires numeric data, got {dtype}")]
    NonNumericData { column: String, dtype: String },

    #[error("Missing data in column: {0}")]
    MissingData(String),

    #[error("Duplicate row key ({entity}, {time}) in columns ({entity_col}, {time_col})")]
    DuplicateKey {
        entity_col: String,
        time_col: String,
        entity: String,
        time: String,
    },

    #[error("Join key '{key}' appears more than once in column '{column}'")]
    DuplicateJoinKey { column: String, key: String },

    #[error("No rows left after {stage} ({dropped} rows removed)")]
    EmptyAfterDrop { stage: String, dropped: usize },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for data operations
pub type Result<T> = std::result::Result<T, DataError>;
