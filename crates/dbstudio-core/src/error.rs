//! Error types for dbstudio

use thiserror::Error;

use crate::types::DataType;

/// Core error type for dbstudio operations
#[derive(Error, Debug)]
pub enum StudioError {
    /// Table, column or identity column missing for the requested schema/table
    #[error("Schema error: {0}")]
    Schema(String),

    /// Malformed client payload or blank record id
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown connection, unknown driver or a table that cannot be edited
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Strict literal codec failure
    #[error("Cannot parse '{value}' as {data_type}")]
    Parse { data_type: DataType, value: String },

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    pub fn parse(data_type: DataType, value: impl Into<String>) -> Self {
        StudioError::Parse {
            data_type,
            value: value.into(),
        }
    }
}

/// Result type alias for dbstudio operations
pub type Result<T> = std::result::Result<T, StudioError>;
