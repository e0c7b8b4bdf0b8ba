//! Data-collection error type.

use thiserror::Error;

use abm_core::AbmError;

/// Errors produced by `abm-collect`.
#[derive(Debug, Error)]
pub enum CollectError {
    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error("collector configuration error: {0}")]
    Config(String),

    #[error("offline sink error: {0}")]
    Sink(String),
}

impl From<CollectError> for AbmError {
    fn from(e: CollectError) -> AbmError {
        match e {
            CollectError::Aggregation(msg) => AbmError::Aggregation(msg),
            CollectError::Config(msg) => AbmError::Config(msg),
            CollectError::Sink(msg) => {
                AbmError::Io(std::io::Error::other(msg))
            }
        }
    }
}

pub type CollectResult<T> = Result<T, CollectError>;
