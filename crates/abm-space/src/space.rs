//! The `Space` and `DiscreteSpace` traits and the degenerate `NoSpace`.
//!
//! A space is a position→ID index.  The model layer owns agents and calls
//! into the space on every add/move/remove so that, between public
//! operations, every agent occupies exactly the cell its `pos` names and
//! every cell list names exactly the agents standing on it.

use abm_core::{AgentId, ModelRng};

use crate::error::SpaceResult;
use crate::{GridSpace, GridSpaceSingle};

// ── Space ─────────────────────────────────────────────────────────────────────

/// Position→ID index kept in lock-step with the agent container.
///
/// `relocate` is atomic: if it fails, the index is exactly as it was before
/// the call.  `canonicalize` is the single place positions are normalized
/// (periodic wrapping) and validated (bounds, vertex existence); the model
/// calls it before every insert/relocate so agents never store a
/// non-canonical position.
pub trait Space {
    type Pos: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    /// Wrap and validate a raw position.
    fn canonicalize(&self, pos: &Self::Pos) -> SpaceResult<Self::Pos>;

    /// Register `id` at the canonical position `pos`.
    fn insert(&mut self, id: AgentId, pos: &Self::Pos) -> SpaceResult<()>;

    /// Unregister `id` from `pos`.  Missing entries are ignored.
    fn delete(&mut self, id: AgentId, pos: &Self::Pos);

    /// Atomically move `id` from `from` to `to` (both canonical).
    fn relocate(&mut self, id: AgentId, from: &Self::Pos, to: &Self::Pos) -> SpaceResult<()>;

    /// A uniformly random (canonical) position.
    fn random_pos(&self, rng: &mut ModelRng) -> Self::Pos;
}

// ── DiscreteSpace ─────────────────────────────────────────────────────────────

/// Extra surface shared by the spaces whose position set is enumerable.
pub trait DiscreteSpace: Space {
    /// All positions, in the space's canonical order.
    fn positions(&self) -> Box<dyn Iterator<Item = Self::Pos> + '_>;

    /// IDs currently standing at `pos`.
    fn ids_at(&self, pos: &Self::Pos) -> &[AgentId];

    /// `true` if nothing stands at `pos`.
    fn is_empty_at(&self, pos: &Self::Pos) -> bool {
        self.ids_at(pos).is_empty()
    }

    /// All currently empty positions.
    fn empty_positions(&self) -> Box<dyn Iterator<Item = Self::Pos> + '_>;

    /// A uniformly random empty position.
    ///
    /// Rejection-samples within the space's retry budget, then falls back to
    /// scanning; fails with [`SpaceError::NoEmptyPosition`] when full.
    ///
    /// [`SpaceError::NoEmptyPosition`]: crate::SpaceError::NoEmptyPosition
    fn random_empty(&self, rng: &mut ModelRng) -> SpaceResult<Self::Pos>;
}

// ── LatticeSpace ──────────────────────────────────────────────────────────────

/// Shared surface of the two grid variants, so model-level grid operations
/// are written once.
pub trait LatticeSpace<const D: usize>: Space<Pos = [i32; D]> {
    fn lattice(&self) -> &crate::Lattice<D>;

    /// Positions within metric radius `r`, the query position excluded.
    fn nearby_positions(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]>;

    /// IDs within metric radius `r`, occupants of the query position included.
    fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId>;
}

impl<const D: usize> LatticeSpace<D> for crate::GridSpace<D> {
    fn lattice(&self) -> &crate::Lattice<D> {
        GridSpace::lattice(self)
    }

    fn nearby_positions(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]> {
        GridSpace::nearby_positions(self, pos, r)
    }

    fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId> {
        GridSpace::nearby_ids(self, pos, r)
    }
}

impl<const D: usize> LatticeSpace<D> for crate::GridSpaceSingle<D> {
    fn lattice(&self) -> &crate::Lattice<D> {
        GridSpaceSingle::lattice(self)
    }

    fn nearby_positions(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]> {
        GridSpaceSingle::nearby_positions(self, pos, r)
    }

    fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId> {
        GridSpaceSingle::nearby_ids(self, pos, r)
    }
}

// ── NoSpace ───────────────────────────────────────────────────────────────────

/// The "no topology" space: agents exist, positions don't.
///
/// Every index operation is a no-op and `Pos` is the unit type, so non-spatial
/// models pay nothing for the space plumbing.  Neighborhood queries simply do
/// not exist on this type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoSpace;

impl Space for NoSpace {
    type Pos = ();

    #[inline]
    fn canonicalize(&self, _pos: &()) -> SpaceResult<()> {
        Ok(())
    }

    #[inline]
    fn insert(&mut self, _id: AgentId, _pos: &()) -> SpaceResult<()> {
        Ok(())
    }

    #[inline]
    fn delete(&mut self, _id: AgentId, _pos: &()) {}

    #[inline]
    fn relocate(&mut self, _id: AgentId, _from: &(), _to: &()) -> SpaceResult<()> {
        Ok(())
    }

    #[inline]
    fn random_pos(&self, _rng: &mut ModelRng) {}
}
