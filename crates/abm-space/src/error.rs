//! Spatial-subsystem error type.

use thiserror::Error;

use abm_core::{AbmError, AgentId, NodeId};

/// Errors produced by `abm-space`.
#[derive(Debug, Error)]
pub enum SpaceError {
    #[error("cell already occupied by agent {occupant}")]
    CellOccupied { occupant: AgentId },

    #[error("no empty position left in the space")]
    NoEmptyPosition,

    #[error("coordinate {coord} outside extent {extent} in non-periodic dimension {dim}")]
    OutOfBounds { dim: usize, coord: f64, extent: f64 },

    #[error("vertex {0} not in the graph")]
    UnknownVertex(NodeId),

    #[error("no route from {from} to {to}")]
    NoRoute { from: NodeId, to: NodeId },

    #[error("position names edge {from}->{to} which is not in the network")]
    UnknownEdge { from: NodeId, to: NodeId },

    #[error("space configuration error: {0}")]
    Config(String),
}

impl From<SpaceError> for AbmError {
    fn from(e: SpaceError) -> AbmError {
        match e {
            SpaceError::CellOccupied { occupant } => AbmError::CellOccupied { occupant },
            SpaceError::NoEmptyPosition => AbmError::NoEmptyPosition,
            SpaceError::OutOfBounds { dim, coord, extent } => {
                AbmError::OutOfBounds { dim, coord, extent }
            }
            SpaceError::NoRoute { .. } => AbmError::UnreachableTarget,
            e => AbmError::Config(e.to_string()),
        }
    }
}

pub type SpaceResult<T> = Result<T, SpaceError>;
