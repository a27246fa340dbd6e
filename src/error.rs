//! Error types for the pcsf-network library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum PcsfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing column '{column}' in {table}")]
    MissingColumn { column: String, table: String },

    #[error("Invalid value '{value}' in column '{column}' at row {row}")]
    InvalidValue {
        value: String,
        column: String,
        row: usize,
    },

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Node '{0}' not found in interactome")]
    NodeNotFound(String),

    #[error("No terminals: {0}")]
    NoTerminals(String),

    #[error("All {attempted} iterations failed (last error: {last_error})")]
    AllIterationsFailed { attempted: usize, last_error: String },

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, PcsfError>;
