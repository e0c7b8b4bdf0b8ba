//! Pathfinding over continuous space.
//!
//! The planner runs on the space's bucket lattice; movement follows the
//! sequence of bucket-center waypoints, with the exact real-valued
//! destination replacing the final cell center.  Before each move the route
//! is smoothed: a waypoint is dropped when the straight line to its successor
//! stays on walkable cells, so agents cut corners instead of zig-zagging
//! center to center.

use rustc_hash::FxHashMap;

use abm_core::{AbmError, AbmResult, AgentId, ModelRng};
use abm_space::ContinuousSpace;
use abm_model::{Agent, Model};

use crate::error::PathResult;
use crate::metric::CostMetric;
use crate::pathfinder::{Neighborhood, Pathfinder};

/// Sampling step (in multiples of the bucket spacing) used when testing
/// whether a straight segment stays walkable.
const LOS_STEP: f64 = 0.5;

/// A* planner over a continuous space's bucket overlay.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(bound(
    serialize = "Pathfinder<D>: serde::Serialize, [f64; D]: serde::Serialize",
    deserialize = "Pathfinder<D>: serde::Deserialize<'de>, [f64; D]: serde::Deserialize<'de>"
)))]
pub struct ContinuousPathfinder<const D: usize> {
    grid:  Pathfinder<D>,
    /// Exact destination per routed agent (the last waypoint is a cell
    /// center; the true target rarely is).
    dests: FxHashMap<AgentId, [f64; D]>,
}

impl<const D: usize> ContinuousPathfinder<D> {
    /// Build over `space`'s bucket lattice with an explicit walkmap.
    pub fn new(
        space:        &ContinuousSpace<D>,
        walkmap:      Vec<bool>,
        metric:       CostMetric<D>,
        neighborhood: Neighborhood,
        epsilon:      f64,
    ) -> PathResult<Self> {
        let lattice = space.lattice();
        let grid = Pathfinder::new(
            lattice.dims(),
            lattice.periodic(),
            walkmap,
            metric,
            neighborhood,
            epsilon,
        )?;
        Ok(Self { grid, dests: FxHashMap::default() })
    }

    /// Build with an all-walkable map.
    pub fn open(space: &ContinuousSpace<D>, metric: CostMetric<D>) -> PathResult<Self> {
        let lattice = space.lattice();
        Self::new(
            space,
            vec![true; lattice.len()],
            metric,
            Neighborhood::Moore,
            0.0,
        )
    }

    #[inline]
    pub fn grid(&self) -> &Pathfinder<D> {
        &self.grid
    }

    #[inline]
    pub fn grid_mut(&mut self) -> &mut Pathfinder<D> {
        &mut self.grid
    }

    pub fn is_stationary(&self, id: AgentId) -> bool {
        self.grid.is_stationary(id) && !self.dests.contains_key(&id)
    }

    pub fn remove_route(&mut self, id: AgentId) {
        self.grid.remove_route(id);
        self.dests.remove(&id);
    }

    /// A uniformly random walkable point (uniform within a random walkable
    /// bucket).
    pub fn random_walkable(
        &self,
        space: &ContinuousSpace<D>,
        rng:   &mut ModelRng,
    ) -> PathResult<[f64; D]> {
        let cell = self.grid.random_walkable(rng)?;
        Ok(jitter_in_bucket(space, &cell, rng))
    }

    /// Plan a route for agent `id` from its current position to `dest`.
    pub fn plan_route<A, P>(
        &mut self,
        model: &Model<A, ContinuousSpace<D>, P>,
        id:    AgentId,
        dest:  [f64; D],
    ) -> AbmResult<()>
    where
        A: Agent<Pos = [f64; D]>,
    {
        let start = model.agent(id)?.pos();
        let space = model.space();
        let from = space.bucket_of(&start);
        let to = space.bucket_of(&dest);
        self.grid
            .plan_route(id, &from, &to)
            .map_err(AbmError::from)?;
        self.dests.insert(id, dest);
        Ok(())
    }

    /// Advance agent `id` by up to `speed · dt` along its route.
    ///
    /// Returns `true` when the exact destination was reached this call.
    pub fn move_along_route<A, P>(
        &mut self,
        model: &mut Model<A, ContinuousSpace<D>, P>,
        id:    AgentId,
        speed: f64,
        dt:    f64,
    ) -> AbmResult<bool>
    where
        A: Agent<Pos = [f64; D]>,
    {
        let Some(&dest) = self.dests.get(&id) else {
            return Ok(false);
        };
        let mut pos = model.agent(id)?.pos();
        let mut budget = speed * dt;

        while budget > 0.0 {
            self.skip_crossed_waypoints(model.space(), id, &pos, dest);
            let target = match self.grid.route(id).and_then(|mut r| r.next()) {
                Some(cell) => model.space().bucket_center(cell),
                None => dest,
            };
            let dist = model.space().euclidean_distance(&pos, &target);
            if dist <= budget {
                budget -= dist;
                pos = target;
                if self.grid.next_waypoint(id).is_none() {
                    // That was the exact destination.
                    model.move_agent(id, pos)?;
                    self.dests.remove(&id);
                    return Ok(true);
                }
            } else {
                let step = model.space().displacement(&pos, &target);
                let scale = budget / dist;
                let mut delta = [0.0; D];
                for d in 0..D {
                    delta[d] = step[d] * scale;
                }
                pos = model.space().translate(&pos, &delta)?;
                break;
            }
        }
        model.move_agent(id, pos)?;
        Ok(false)
    }

    /// Drop leading waypoints whose successor is reachable in a straight
    /// walkable line from `pos` (corner-cutting smoothing).
    fn skip_crossed_waypoints(
        &mut self,
        space: &ContinuousSpace<D>,
        id:    AgentId,
        pos:   &[f64; D],
        dest:  [f64; D],
    ) {
        loop {
            let Some(mut route) = self.grid.route(id) else {
                return;
            };
            let first = route.next();
            let second = route.next();
            let next_target = match (first, second) {
                (Some(_), Some(cell)) => space.bucket_center(cell),
                (Some(_), None) => dest,
                _ => return,
            };
            if self.line_is_walkable(space, pos, &next_target) {
                drop(route);
                self.grid.next_waypoint(id);
            } else {
                return;
            }
        }
    }

    /// Sample the segment `a → b` at sub-spacing resolution, checking the
    /// walkmap under every sample.
    fn line_is_walkable(
        &self,
        space: &ContinuousSpace<D>,
        a:     &[f64; D],
        b:     &[f64; D],
    ) -> bool {
        let delta = space.displacement(a, b);
        let length: f64 = delta.iter().map(|x| x * x).sum::<f64>().sqrt();
        let steps = ((length / (space.spacing() * LOS_STEP)).ceil() as usize).max(1);
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let mut probe = [0.0; D];
            for d in 0..D {
                probe[d] = a[d] + delta[d] * t;
            }
            let Ok(probe) = space.translate(&[0.0; D], &probe) else {
                return false;
            };
            if !self.grid.is_walkable(&space.bucket_of(&probe)) {
                return false;
            }
        }
        true
    }
}

#[inline]
fn jitter_in_bucket<const D: usize>(
    space: &ContinuousSpace<D>,
    cell:  &[i32; D],
    rng:   &mut ModelRng,
) -> [f64; D] {
    let center = space.bucket_center(cell);
    let half = space.spacing() * 0.5;
    let mut out = [0.0; D];
    for d in 0..D {
        out[d] = center[d] + rng.gen_range(-half..half);
    }
    out
}
