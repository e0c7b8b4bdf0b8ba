//! Engine error type.
//!
//! Sub-crates may define their own error enums and convert them into
//! `AbmError` via `From` impls, or keep them separate and wrap `AbmError` as
//! one variant.  Both patterns are acceptable; prefer whichever keeps error
//! sites clean.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `abm-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum AbmError {
    #[error("agent {0} not found")]
    UnknownAgent(AgentId),

    #[error("agent {0} already present")]
    DuplicateAgent(AgentId),

    #[error("cell already occupied by agent {occupant}")]
    CellOccupied { occupant: AgentId },

    #[error("no empty position left in the space")]
    NoEmptyPosition,

    #[error("coordinate {coord} outside extent {extent} in non-periodic dimension {dim}")]
    OutOfBounds { dim: usize, coord: f64, extent: f64 },

    #[error("no route to the requested target")]
    UnreachableTarget,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("aggregation error: {0}")]
    Aggregation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `abm-*` crates.
pub type AbmResult<T> = Result<T, AbmError>;
