//! Error types for abm-output.

use thiserror::Error;

/// Errors that can occur when persisting models or frames.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("checkpoint codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("column-map error: {0}")]
    ColumnMap(String),

    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "parquet")]
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[cfg(feature = "parquet")]
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

impl From<OutputError> for abm_collect::CollectError {
    fn from(e: OutputError) -> Self {
        abm_collect::CollectError::Sink(e.to_string())
    }
}

/// Alias for `Result<T, OutputError>`.
pub type OutputResult<T> = Result<T, OutputError>;
