//! `GridSpace<D>` — multi-occupancy d-dimensional lattice.
//!
//! Each cell holds a small dynamic list of occupant IDs.  The metric
//! (Chebyshev, Manhattan, or Euclidean) is fixed at construction; nearby
//! queries reuse the [`Lattice`] offset cache, so the first query at a given
//! radius pays the enumeration cost and later queries iterate a memoized
//! table.

use abm_core::{AgentId, ModelRng};

use crate::error::{SpaceError, SpaceResult};
use crate::lattice::{Lattice, Metric};

/// Retry budget for [`DiscreteSpace::random_empty`] rejection sampling before
/// falling back to a full scan of the cell array.
///
/// [`DiscreteSpace::random_empty`]: crate::DiscreteSpace::random_empty
const EMPTY_RETRIES: usize = 200;

/// Regular d-dimensional integer lattice allowing any number of agents per
/// cell.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "Lattice<D>: serde::Serialize",
    deserialize = "Lattice<D>: serde::Deserialize<'de>"
)))]
pub struct GridSpace<const D: usize> {
    lattice: Lattice<D>,
    cells:   Vec<Vec<AgentId>>,
}

impl<const D: usize> GridSpace<D> {
    /// Create a grid with the given dimensions, uniform periodicity, and
    /// metric.
    pub fn new(dims: [usize; D], periodic: bool, metric: Metric) -> Self {
        Self::with_periodicity(dims, [periodic; D], metric)
    }

    /// Create a grid with independently periodic dimensions.
    pub fn with_periodicity(dims: [usize; D], periodic: [bool; D], metric: Metric) -> Self {
        let lattice = Lattice::new(dims, periodic, metric);
        let cells = vec![Vec::new(); lattice.len()];
        Self { lattice, cells }
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

    /// Number of agents currently indexed.
    pub fn occupancy(&self) -> usize {
        self.cells.iter().map(Vec::len).sum()
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

    /// IDs of all agents within metric radius `r` of `pos`, occupants of
    /// `pos` included.
    pub fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId> {
        let mut out = Vec::new();
        self.lattice.for_each_within(pos, r, |p| {
            out.extend_from_slice(&self.cells[self.lattice.flat(&p)]);
        });
        out
    }

    /// Metric distance between two positions, honoring periodicity.
    #[inline]
    pub fn distance(&self, a: &[i32; D], b: &[i32; D]) -> f64 {
        self.lattice.distance(a, b)
    }
}

// ── Space impl ────────────────────────────────────────────────────────────────

impl<const D: usize> crate::Space for GridSpace<D> {
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
        self.cells[idx].push(id);
        Ok(())
    }

    fn delete(&mut self, id: AgentId, pos: &[i32; D]) {
        let idx = self.lattice.flat(pos);
        if let Some(slot) = self.cells[idx].iter().position(|&x| x == id) {
            self.cells[idx].swap_remove(slot);
        }
    }

    fn relocate(&mut self, id: AgentId, from: &[i32; D], to: &[i32; D]) -> SpaceResult<()> {
        self.delete(id, from);
        self.insert(id, to)
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

impl<const D: usize> crate::DiscreteSpace for GridSpace<D> {
    fn positions(&self) -> Box<dyn Iterator<Item = [i32; D]> + '_> {
        Box::new(self.lattice.iter_positions())
    }

    fn ids_at(&self, pos: &[i32; D]) -> &[AgentId] {
        &self.cells[self.lattice.flat(pos)]
    }

    fn empty_positions(&self) -> Box<dyn Iterator<Item = [i32; D]> + '_> {
        Box::new(
            self.lattice
                .iter_positions()
                .filter(|p| self.cells[self.lattice.flat(p)].is_empty()),
        )
    }

    fn random_empty(&self, rng: &mut ModelRng) -> SpaceResult<[i32; D]> {
        use crate::Space;
        for _ in 0..EMPTY_RETRIES {
            let pos = self.random_pos(rng);
            if self.cells[self.lattice.flat(&pos)].is_empty() {
                return Ok(pos);
            }
        }
        let empties: Vec<[i32; D]> = self
            .lattice
            .iter_positions()
            .filter(|p| self.cells[self.lattice.flat(p)].is_empty())
            .collect();
        rng.choose(&empties)
            .copied()
            .ok_or(SpaceError::NoEmptyPosition)
    }
}
