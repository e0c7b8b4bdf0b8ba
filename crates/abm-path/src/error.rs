//! Pathfinding error type.

use thiserror::Error;

use abm_core::AbmError;

/// Errors produced by `abm-path`.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("no path to the requested target")]
    NoPath,

    #[error("pathfinder configuration error: {0}")]
    Config(String),
}

impl From<PathError> for AbmError {
    fn from(e: PathError) -> AbmError {
        match e {
            PathError::NoPath => AbmError::UnreachableTarget,
            PathError::Config(msg) => AbmError::Config(msg),
        }
    }
}

pub type PathResult<T> = Result<T, PathError>;
