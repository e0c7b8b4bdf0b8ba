//! `GridSpaceSingle<D>` — single-occupancy d-dimensional lattice.
//!
//! Each cell is one `AgentId` in a plain flat array, `AgentId::EMPTY` meaning
//! vacant.  Insertion and relocation verify emptiness and fail with
//! `CellOccupied`, so the at-most-one-agent-per-cell invariant can never be
//! broken through the public surface.

use abm_core::{AgentId, ModelRng};

use crate::error::{SpaceError, SpaceResult};
use crate::lattice::{Lattice, Metric};

const EMPTY_RETRIES: usize = 200;

/// Regular d-dimensional integer lattice with at most one agent per cell.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "Lattice<D>: serde::Serialize",
    deserialize = "Lattice<D>: serde::Deserialize<'de>"
)))]
pub struct GridSpaceSingle<const D: usize> {
    lattice: Lattice<D>,
    cells:   Vec<AgentId>,
    /// Live occupant count, kept so fullness checks stay O(1).
    count:   usize,
}

impl<const D: usize> GridSpaceSingle<D> {
    pub fn new(dims: [usize; D], periodic: bool, metric: Metric) -> Self {
        Self::with_periodicity(dims, [periodic; D], metric)
    }

    pub fn with_periodicity(dims: [usize; D], periodic: [bool; D], metric: Metric) -> Self {
        let lattice = Lattice::new(dims, periodic, metric);
        let cells = vec![AgentId::EMPTY; lattice.len()];
        Self { lattice, cells, count: 0 }
    }

    #[inline]
    pub fn dims(&self) -> [usize; D] {
        self.lattice.dims()
    }

    #[inline]
    pub fn metric(&self) -> Metric {
        self.lattice.metric()
    }

    #[inline]
    pub fn lattice(&self) -> &Lattice<D> {
        &self.lattice
    }

    /// Number of occupied cells.
    #[inline]
    pub fn occupancy(&self) -> usize {
        self.count
    }

    /// `true` when every cell is occupied.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.lattice.len()
    }

    /// The occupant of `pos`, or `AgentId::EMPTY`.
    #[inline]
    pub fn id_at(&self, pos: &[i32; D]) -> AgentId {
        self.cells[self.lattice.flat(pos)]
    }

    /// Exchange the occupants of two cells (either may be empty).
    pub fn swap_cells(&mut self, a: &[i32; D], b: &[i32; D]) {
        let (ia, ib) = (self.lattice.flat(a), self.lattice.flat(b));
        self.cells.swap(ia, ib);
    }

    // ── Neighborhood queries ──────────────────────────────────────────────

    /// Positions within metric radius `r` of `pos`, excluding `pos` itself.
    pub fn nearby_positions(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]> {
        let mut out = Vec::new();
        self.lattice.for_each_within(pos, r, |p| {
            if p != *pos {
                out.push(p);
            }
        });
        out
    }

    /// IDs within metric radius `r` of `pos`, the occupant of `pos` included.
    pub fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId> {
        let mut out = Vec::new();
        self.lattice.for_each_within(pos, r, |p| {
            let id = self.cells[self.lattice.flat(&p)];
            if id.is_live() {
                out.push(id);
            }
        });
        out
    }

    #[inline]
    pub fn distance(&self, a: &[i32; D], b: &[i32; D]) -> f64 {
        self.lattice.distance(a, b)
    }
}

// ── Space impl ────────────────────────────────────────────────────────────────

impl<const D: usize> crate::Space for GridSpaceSingle<D> {
    type Pos = [i32; D];

    fn canonicalize(&self, pos: &[i32; D]) -> SpaceResult<[i32; D]> {
        self.lattice.canonicalize(pos).ok_or_else(|| {
            let d = (0..D)
                .find(|&d| {
                    !self.lattice.periodic()[d]
                        && !(0..self.lattice.dims()[d] as i32).contains(&pos[d])
                })
                .unwrap_or(0);
            SpaceError::OutOfBounds {
                dim:    d,
                coord:  pos[d] as f64,
                extent: self.lattice.dims()[d] as f64,
            }
        })
    }

    fn insert(&mut self, id: AgentId, pos: &[i32; D]) -> SpaceResult<()> {
        let idx = self.lattice.flat(pos);
        let occupant = self.cells[idx];
        if occupant.is_live() {
            return Err(SpaceError::CellOccupied { occupant });
        }
        self.cells[idx] = id;
        self.count += 1;
        Ok(())
    }

    fn delete(&mut self, id: AgentId, pos: &[i32; D]) {
        let idx = self.lattice.flat(pos);
        if self.cells[idx] == id {
            self.cells[idx] = AgentId::EMPTY;
            self.count -= 1;
        }
    }

    fn relocate(&mut self, id: AgentId, from: &[i32; D], to: &[i32; D]) -> SpaceResult<()> {
        if from == to {
            return Ok(());
        }
        let to_idx = self.lattice.flat(to);
        let occupant = self.cells[to_idx];
        if occupant.is_live() {
            return Err(SpaceError::CellOccupied { occupant });
        }
        // Target verified empty; the two writes cannot fail.
        let from_idx = self.lattice.flat(from);
        if self.cells[from_idx] == id {
            self.cells[from_idx] = AgentId::EMPTY;
            self.count -= 1;
        }
        self.cells[to_idx] = id;
        self.count += 1;
        Ok(())
    }

    fn random_pos(&self, rng: &mut ModelRng) -> [i32; D] {
        let dims = self.lattice.dims();
        let mut pos = [0i32; D];
        for d in 0..D {
            pos[d] = rng.gen_range(0..dims[d] as i32);
        }
        pos
    }
}

impl<const D: usize> crate::DiscreteSpace for GridSpaceSingle<D> {
    fn positions(&self) -> Box<dyn Iterator<Item = [i32; D]> + '_> {
        Box::new(self.lattice.iter_positions())
    }

    fn ids_at(&self, pos: &[i32; D]) -> &[AgentId] {
        let idx = self.lattice.flat(pos);
        if self.cells[idx].is_live() {
            std::slice::from_ref(&self.cells[idx])
        } else {
            &[]
        }
    }

    fn empty_positions(&self) -> Box<dyn Iterator<Item = [i32; D]> + '_> {
        Box::new(
            self.lattice
                .iter_positions()
                .filter(|p| !self.cells[self.lattice.flat(p)].is_live()),
        )
    }

    fn random_empty(&self, rng: &mut ModelRng) -> SpaceResult<[i32; D]> {
        use crate::Space;
        if self.is_full() {
            return Err(SpaceError::NoEmptyPosition);
        }
        for _ in 0..EMPTY_RETRIES {
            let pos = self.random_pos(rng);
            if !self.cells[self.lattice.flat(&pos)].is_live() {
                return Ok(pos);
            }
        }
        let empties: Vec<[i32; D]> = self
            .lattice
            .iter_positions()
            .filter(|p| !self.cells[self.lattice.flat(p)].is_live())
            .collect();
        rng.choose(&empties)
            .copied()
            .ok_or(SpaceError::NoEmptyPosition)
    }
}
