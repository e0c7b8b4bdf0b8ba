//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  The inner integer is `pub` to allow
//! direct indexing into flat arrays via `id.0 as usize`, but callers should
//! prefer the `.index()` helpers for clarity.
//!
//! `AgentId` differs from the structural IDs: live agents are numbered from 1
//! and `AgentId(0)` is the *empty* sentinel, so a single-occupancy grid can
//! store one `AgentId` per cell with zero meaning vacant.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Cast to `usize` for direct use as an array index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<$name> for usize {
            #[inline(always)]
            fn from(id: $name) -> usize {
                id.0 as usize
            }
        }
    };
}

typed_id! {
    /// Identity of one agent within a model.  Nonzero for live agents;
    /// allocated monotonically for the lifetime of the model and never reused.
    pub struct AgentId(u32);
}

impl AgentId {
    /// The "no agent here" sentinel.  Single-occupancy grid cells hold this
    /// value when vacant; no live agent ever carries it.
    pub const EMPTY: AgentId = AgentId(0);

    /// The first ID a fresh model hands out.
    pub const FIRST: AgentId = AgentId(1);

    /// `true` for any ID that can belong to a live agent.
    #[inline(always)]
    pub fn is_live(self) -> bool {
        self != AgentId::EMPTY
    }

    /// The ID after `self` in allocation order.
    #[inline(always)]
    pub fn next(self) -> AgentId {
        AgentId(self.0 + 1)
    }
}

typed_id! {
    /// Index of a graph-space vertex or road-network node.
    pub struct NodeId(u32);
}

typed_id! {
    /// Index of a directed road-network edge.
    pub struct EdgeId(u32);
}

impl NodeId {
    /// Sentinel meaning "no valid node" — equivalent to `u32::MAX`.
    pub const INVALID: NodeId = NodeId(u32::MAX);
}

impl EdgeId {
    /// Sentinel meaning "no valid edge" — equivalent to `u32::MAX`.
    pub const INVALID: EdgeId = EdgeId(u32::MAX);
}
