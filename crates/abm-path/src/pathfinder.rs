//! `Pathfinder<D>` — A* over a walkmap, with per-agent route storage.
//!
//! # Algorithm
//!
//! The open set is a binary heap keyed by `f = g + (1+ε)·h`; when two nodes
//! tie on `f` the one with the larger `g` (closer to the goal) wins.  `h` is
//! the cost metric's own `delta_cost`, admissible at ε = 0; ε > 0 inflates it
//! to trade optimality for speed.
//!
//! Routes are keyed by `AgentId` and store waypoints destination-first so
//! advancing is an O(1) pop.  Removing an agent's route is the cancellation
//! mechanism; a second `plan_route` simply overwrites.

use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;

use abm_core::{AbmResult, AgentId, ModelRng};
use abm_space::{Lattice, LatticeSpace, Metric};
use abm_model::{Agent, Model};

use crate::error::{PathError, PathResult};
use crate::metric::CostMetric;

/// Retry budget for rejection-sampled walkable cells.
const WALKABLE_RETRIES: usize = 200;

// ── Neighborhood ──────────────────────────────────────────────────────────────

/// Which cells count as adjacent for route steps.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Neighborhood {
    /// All 3^D − 1 surrounding cells (diagonals included).
    #[default]
    Moore,
    /// The 2·D orthogonal cells only.
    VonNeumann,
}

/// Criterion for [`Pathfinder::plan_best_route`].
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum RouteCondition {
    Shortest,
    Longest,
}

// ── Pathfinder ────────────────────────────────────────────────────────────────

/// A* planner over a boolean walkmap congruent with a space's lattice.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "Lattice<D>: serde::Serialize, CostMetric<D>: serde::Serialize, \
                 [i32; D]: serde::Serialize",
    deserialize = "Lattice<D>: serde::Deserialize<'de>, CostMetric<D>: serde::Deserialize<'de>, \
                   [i32; D]: serde::Deserialize<'de>"
)))]
pub struct Pathfinder<const D: usize> {
    lattice:      Lattice<D>,
    walkmap:      Vec<bool>,
    metric:       CostMetric<D>,
    neighborhood: Neighborhood,
    epsilon:      f64,
    routes:       FxHashMap<AgentId, Vec<[i32; D]>>,
}

impl<const D: usize> Pathfinder<D> {
    /// Build a pathfinder over an explicit lattice shape.
    ///
    /// Configuration conflicts are rejected here, not at plan time: a
    /// walkmap (or penalty map) whose length differs from the cell count,
    /// or a Chebyshev cost metric with a Von-Neumann neighborhood (the
    /// metric prices diagonal moves the neighborhood cannot take).
    pub fn new(
        dims:         [usize; D],
        periodic:     [bool; D],
        walkmap:      Vec<bool>,
        metric:       CostMetric<D>,
        neighborhood: Neighborhood,
        epsilon:      f64,
    ) -> PathResult<Self> {
        let lattice = Lattice::new(dims, periodic, Metric::Chebyshev);
        if walkmap.len() != lattice.len() {
            return Err(PathError::Config(format!(
                "walkmap has {} cells, lattice has {}",
                walkmap.len(),
                lattice.len()
            )));
        }
        if let Some(pmap) = metric.penaltymap() {
            if pmap.len() != lattice.len() {
                return Err(PathError::Config(format!(
                    "penalty map has {} cells, lattice has {}",
                    pmap.len(),
                    lattice.len()
                )));
            }
        }
        if matches!(metric, CostMetric::Chebyshev(_))
            && neighborhood == Neighborhood::VonNeumann
        {
            return Err(PathError::Config(
                "Chebyshev costs presume diagonal moves; use Moore or a Direct metric".into(),
            ));
        }
        if epsilon < 0.0 {
            return Err(PathError::Config(format!(
                "admissibility epsilon must be nonnegative, got {epsilon}"
            )));
        }
        Ok(Self {
            lattice,
            walkmap,
            metric,
            neighborhood,
            epsilon,
            routes: FxHashMap::default(),
        })
    }

    /// Build over a grid space's shape with an all-walkable map.
    pub fn for_space<S: LatticeSpace<D>>(
        space:        &S,
        metric:       CostMetric<D>,
        neighborhood: Neighborhood,
    ) -> PathResult<Self> {
        let lattice = space.lattice();
        Self::new(
            lattice.dims(),
            lattice.periodic(),
            vec![true; lattice.len()],
            metric,
            neighborhood,
            0.0,
        )
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn lattice(&self) -> &Lattice<D> {
        &self.lattice
    }

    #[inline]
    pub fn walkmap(&self) -> &[bool] {
        &self.walkmap
    }

    /// Rewrite one walkmap cell (terrain changes mid-run).
    pub fn set_walkable(&mut self, pos: &[i32; D], walkable: bool) {
        let idx = self.lattice.flat(pos);
        self.walkmap[idx] = walkable;
    }

    #[inline]
    pub fn is_walkable(&self, pos: &[i32; D]) -> bool {
        self.lattice
            .canonicalize(pos)
            .map(|p| self.walkmap[self.lattice.flat(&p)])
            .unwrap_or(false)
    }

    /// The penalty map, when the metric carries one; mutable in place.
    pub fn penaltymap(&self) -> Option<&[u64]> {
        self.metric.penaltymap()
    }

    pub fn penaltymap_mut(&mut self) -> Option<&mut Vec<u64>> {
        self.metric.penaltymap_mut()
    }

    // ── Route bookkeeping ─────────────────────────────────────────────────

    /// `true` iff `id` has no route in progress.
    pub fn is_stationary(&self, id: AgentId) -> bool {
        self.routes
            .get(&id)
            .map(|r| r.is_empty())
            .unwrap_or(true)
    }

    /// Remaining waypoints for `id`, next-first.
    pub fn route(&self, id: AgentId) -> Option<impl Iterator<Item = &[i32; D]>> {
        self.routes.get(&id).map(|r| r.iter().rev())
    }

    /// Cancel any route for `id`.  Call when the agent leaves the model.
    pub fn remove_route(&mut self, id: AgentId) {
        self.routes.remove(&id);
    }

    /// Pop the next waypoint of `id`'s route.
    pub fn next_waypoint(&mut self, id: AgentId) -> Option<[i32; D]> {
        let route = self.routes.get_mut(&id)?;
        let wp = route.pop();
        if route.is_empty() {
            self.routes.remove(&id);
        }
        wp
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// A* from `from` to `to`; stores and returns the route (next-first
    /// externally, so the returned iterator yields `from`'s successor first).
    pub fn plan_route(
        &mut self,
        id:   AgentId,
        from: &[i32; D],
        to:   &[i32; D],
    ) -> PathResult<impl Iterator<Item = &[i32; D]>> {
        let (path, _cost) = self.find_path(from, to).ok_or(PathError::NoPath)?;
        self.routes.insert(id, path);
        Ok(self.routes[&id].iter().rev())
    }

    /// Plan to every destination and keep the best by total cost.
    ///
    /// Returns the chosen destination.  Destinations with no route are
    /// skipped; `NoPath` only if none is reachable.
    pub fn plan_best_route(
        &mut self,
        id:        AgentId,
        from:      &[i32; D],
        dests:     impl IntoIterator<Item = [i32; D]>,
        condition: RouteCondition,
    ) -> PathResult<[i32; D]> {
        let mut best: Option<(u64, [i32; D], Vec<[i32; D]>)> = None;
        for dest in dests {
            let Some((path, cost)) = self.find_path(from, &dest) else {
                continue;
            };
            let better = match (&best, condition) {
                (None, _) => true,
                (Some((bc, ..)), RouteCondition::Shortest) => cost < *bc,
                (Some((bc, ..)), RouteCondition::Longest) => cost > *bc,
            };
            if better {
                best = Some((cost, dest, path));
            }
        }
        let (_, dest, path) = best.ok_or(PathError::NoPath)?;
        self.routes.insert(id, path);
        Ok(dest)
    }

    /// Plan to a randomly sampled reachable walkable cell.
    ///
    /// Samples up to `limit` candidate cells and keeps the first with a valid
    /// route.
    pub fn plan_random_route(
        &mut self,
        id:    AgentId,
        from:  &[i32; D],
        limit: usize,
        rng:   &mut ModelRng,
    ) -> PathResult<[i32; D]> {
        for _ in 0..limit.max(1) {
            let Ok(dest) = self.random_walkable(rng) else {
                break;
            };
            if let Some((path, _)) = self.find_path(from, &dest) {
                self.routes.insert(id, path);
                return Ok(dest);
            }
        }
        Err(PathError::NoPath)
    }

    // ── Walkable queries ──────────────────────────────────────────────────

    /// Walkable positions within Chebyshev radius `r` of `pos`, `pos`
    /// excluded.
    pub fn nearby_walkable(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]> {
        let mut out = Vec::new();
        self.lattice.for_each_within(pos, r, |p| {
            if p != *pos && self.walkmap[self.lattice.flat(&p)] {
                out.push(p);
            }
        });
        out
    }

    /// A uniformly random walkable cell.
    pub fn random_walkable(&self, rng: &mut ModelRng) -> PathResult<[i32; D]> {
        let dims = self.lattice.dims();
        for _ in 0..WALKABLE_RETRIES {
            let mut pos = [0i32; D];
            for d in 0..D {
                pos[d] = rng.gen_range(0..dims[d] as i32);
            }
            if self.walkmap[self.lattice.flat(&pos)] {
                return Ok(pos);
            }
        }
        let walkable: Vec<[i32; D]> = self
            .lattice
            .iter_positions()
            .filter(|p| self.walkmap[self.lattice.flat(p)])
            .collect();
        rng.choose(&walkable).copied().ok_or(PathError::NoPath)
    }

    /// A random walkable cell within radius `r` of `pos`.
    pub fn random_walkable_near(
        &self,
        pos: &[i32; D],
        r:   f64,
        rng: &mut ModelRng,
    ) -> PathResult<[i32; D]> {
        let candidates = self.nearby_walkable(pos, r);
        rng.choose(&candidates).copied().ok_or(PathError::NoPath)
    }

    // ── A* core ───────────────────────────────────────────────────────────

    /// Offsets of one neighborhood step.
    fn step_offsets(&self) -> Vec<[i32; D]> {
        let mut out = Vec::new();
        let all = self.lattice.offsets_within(1.0);
        for off in all.iter() {
            if off.iter().all(|&o| o == 0) {
                continue;
            }
            let span: i32 = off.iter().map(|o| o.abs()).sum();
            if self.neighborhood == Neighborhood::VonNeumann && span > 1 {
                continue;
            }
            out.push(*off);
        }
        out
    }

    /// Full A*.  Returns the path destination-first (pop order) and its
    /// total cost, or `None` when unreachable.
    fn find_path(&self, from: &[i32; D], to: &[i32; D]) -> Option<(Vec<[i32; D]>, u64)> {
        let from = self.lattice.canonicalize(from)?;
        let to = self.lattice.canonicalize(to)?;
        let from_flat = self.lattice.flat(&from);
        let to_flat = self.lattice.flat(&to);
        if !self.walkmap[from_flat] || !self.walkmap[to_flat] {
            return None;
        }
        if from_flat == to_flat {
            return Some((Vec::new(), 0));
        }

        let inflate = 1.0 + self.epsilon;
        let h0 = self.heuristic(&from, &to);
        let offsets = self.step_offsets();

        let mut g_of: FxHashMap<usize, u64> = FxHashMap::default();
        let mut came: FxHashMap<usize, usize> = FxHashMap::default();
        let mut pos_of: FxHashMap<usize, [i32; D]> = FxHashMap::default();
        g_of.insert(from_flat, 0);
        pos_of.insert(from_flat, from);

        let mut open: BinaryHeap<OpenNode> = BinaryHeap::new();
        open.push(OpenNode {
            f: (h0 as f64 * inflate) as u64,
            g: 0,
            flat: from_flat,
        });

        while let Some(OpenNode { g, flat, .. }) = open.pop() {
            if flat == to_flat {
                return Some((self.reconstruct(&came, &pos_of, from_flat, to_flat), g));
            }
            if g > g_of.get(&flat).copied().unwrap_or(u64::MAX) {
                continue; // stale heap entry
            }
            let pos = pos_of[&flat];
            for off in &offsets {
                let mut next = pos;
                for d in 0..D {
                    next[d] += off[d];
                }
                let Some(next) = self.lattice.canonicalize(&next) else {
                    continue;
                };
                let next_flat = self.lattice.flat(&next);
                if !self.walkmap[next_flat] {
                    continue;
                }
                let step = self.metric.move_cost(flat, next_flat, off);
                let tentative = g + step;
                if tentative < g_of.get(&next_flat).copied().unwrap_or(u64::MAX) {
                    g_of.insert(next_flat, tentative);
                    came.insert(next_flat, flat);
                    pos_of.insert(next_flat, next);
                    let h = self.heuristic(&next, &to);
                    open.push(OpenNode {
                        f: tentative + (h as f64 * inflate) as u64,
                        g: tentative,
                        flat: next_flat,
                    });
                }
            }
        }
        None
    }

    fn heuristic(&self, a: &[i32; D], b: &[i32; D]) -> u64 {
        self.metric.delta_cost(&self.lattice.wrapped_delta(a, b))
    }

    fn reconstruct(
        &self,
        came:      &FxHashMap<usize, usize>,
        pos_of:    &FxHashMap<usize, [i32; D]>,
        from_flat: usize,
        to_flat:   usize,
    ) -> Vec<[i32; D]> {
        // Destination-first is exactly pop order; no reversal needed.
        let mut path = Vec::new();
        let mut cur = to_flat;
        while cur != from_flat {
            path.push(pos_of[&cur]);
            cur = came[&cur];
        }
        path
    }
}

// ── Heap node ─────────────────────────────────────────────────────────────────

/// Open-set entry: smaller `f` wins; on ties, larger `g` (deeper) wins.
#[derive(Copy, Clone, PartialEq, Eq)]
struct OpenNode {
    f:    u64,
    g:    u64,
    flat: usize,
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .f
            .cmp(&self.f)
            .then(self.g.cmp(&other.g))
            .then(other.flat.cmp(&self.flat))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

// ── Model glue ────────────────────────────────────────────────────────────────

/// Pop the agent's next waypoint and move it there through the model.
///
/// Returns `true` when a move happened; a stationary agent is a no-op.  On a
/// failed move (occupied single-occupancy cell) the waypoint is retained so
/// the agent can retry next step.
pub fn move_along_route<A, S, P, const D: usize>(
    pf:    &mut Pathfinder<D>,
    model: &mut Model<A, S, P>,
    id:    AgentId,
) -> AbmResult<bool>
where
    A: Agent<Pos = [i32; D]>,
    S: LatticeSpace<D>,
{
    let Some(route) = pf.routes.get_mut(&id) else {
        return Ok(false);
    };
    let Some(&next) = route.last() else {
        pf.routes.remove(&id);
        return Ok(false);
    };
    model.move_agent(id, next)?;
    route.pop();
    if route.is_empty() {
        pf.routes.remove(&id);
    }
    Ok(true)
}
