//! Continuous-space model operations: velocity integration, random walks,
//! exact neighbor queries, pairing strategies, and elastic collisions.
//!
//! The space owns only the bucket index; positions and velocities live on the
//! agents, so everything needing true distances is implemented here.

use abm_core::{AbmError, AbmResult, AgentId};
use abm_space::continuous::{
    direction_from_angles, direction_from_polar, elastic_collision, random_direction,
};
use abm_space::ContinuousSpace;

use crate::agent::{Agent, Velocity};
use crate::model::Model;

// ── PairKind ──────────────────────────────────────────────────────────────────

/// Pairing strategy for [`Model::interacting_pairs`].
pub enum PairKind {
    /// All unordered unique pairs within the radius.
    All,
    /// Each agent paired with at most one partner, greedily taking the
    /// nearest unpaired neighbor in ascending-ID order; ties break to the
    /// lower ID.
    Nearest,
    /// As `Nearest`, but agents are visited in the supplied order (typically
    /// the scheduler's ordering for this step).
    Scheduled(Vec<AgentId>),
    /// Only pairs whose concrete agent variants differ.
    Types,
}

// ── Position-only operations ──────────────────────────────────────────────────

impl<A, P, const D: usize> Model<A, ContinuousSpace<D>, P>
where
    A: Agent<Pos = [f64; D]>,
{
    /// Every ID in a bucket overlapping the radius-`r` ball around `pos`.
    ///
    /// Superset of the true ball; cheap.  Use [`nearby_ids`] for the exact
    /// set.
    ///
    /// [`nearby_ids`]: Self::nearby_ids
    pub fn nearby_ids_inexact(&self, pos: &[f64; D], r: f64) -> Vec<AgentId> {
        self.space().nearby_ids_inexact(pos, r)
    }

    /// Exactly the IDs whose Euclidean distance from `pos` is ≤ `r`
    /// (minimum-image on periodic dimensions).
    pub fn nearby_ids(&self, pos: &[f64; D], r: f64) -> Vec<AgentId> {
        self.space()
            .nearby_ids_inexact(pos, r)
            .into_iter()
            .filter(|&id| {
                self.agents()
                    .get(id)
                    .map(|a| self.space().euclidean_distance(pos, &a.pos()) <= r)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Exact neighbors of agent `id`, excluding `id` itself.
    pub fn nearby_ids_of(&self, id: AgentId, r: f64) -> AbmResult<Vec<AgentId>> {
        let pos = self.agent(id)?.pos();
        let mut ids = self.nearby_ids(&pos, r);
        ids.retain(|&x| x != id);
        Ok(ids)
    }

    /// Exact neighbors of `pos` as agent references.
    pub fn nearby_agents(&self, pos: &[f64; D], r: f64) -> impl Iterator<Item = &A> {
        self.nearby_ids(pos, r)
            .into_iter()
            .filter_map(|id| self.agents().get(id))
    }

    /// Euclidean distance between two agents, honoring periodicity.
    pub fn agent_distance(&self, a: AgentId, b: AgentId) -> AbmResult<f64> {
        let pa = self.agent(a)?.pos();
        let pb = self.agent(b)?.pos();
        Ok(self.space().euclidean_distance(&pa, &pb))
    }

    /// Unordered agent pairs within `r`, enumerated per `kind`.
    ///
    /// Pairs always come out `(lower, higher)` by ID except for
    /// `PairKind::Scheduled`, which preserves visit order in the first slot.
    pub fn interacting_pairs(&self, r: f64, kind: PairKind) -> Vec<(AgentId, AgentId)> {
        match kind {
            PairKind::All => self.pairs_all(r, |_, _| true),
            PairKind::Types => self.pairs_all(r, |a, b| {
                self.agents().get(a).map(Agent::kind) != self.agents().get(b).map(Agent::kind)
            }),
            PairKind::Nearest => {
                let mut order: Vec<AgentId> = self.agents().ids().to_vec();
                order.sort_unstable();
                self.pairs_greedy_nearest(r, &order)
            }
            PairKind::Scheduled(order) => self.pairs_greedy_nearest(r, &order),
        }
    }

    fn pairs_all(
        &self,
        r: f64,
        keep: impl Fn(AgentId, AgentId) -> bool,
    ) -> Vec<(AgentId, AgentId)> {
        let mut ids: Vec<AgentId> = self.agents().ids().to_vec();
        ids.sort_unstable();
        let mut out = Vec::new();
        for &a in &ids {
            let Some(pos) = self.agents().get(a).map(Agent::pos) else {
                continue;
            };
            for b in self.nearby_ids(&pos, r) {
                if b > a && keep(a, b) {
                    out.push((a, b));
                }
            }
        }
        out
    }

    fn pairs_greedy_nearest(&self, r: f64, order: &[AgentId]) -> Vec<(AgentId, AgentId)> {
        let mut paired: rustc_hash::FxHashSet<AgentId> = rustc_hash::FxHashSet::default();
        let mut out = Vec::new();
        for &a in order {
            if paired.contains(&a) {
                continue;
            }
            let Some(pos) = self.agents().get(a).map(Agent::pos) else {
                continue;
            };
            let mut best: Option<(f64, AgentId)> = None;
            for b in self.nearby_ids(&pos, r) {
                if b == a || paired.contains(&b) {
                    continue;
                }
                let d = self
                    .space()
                    .euclidean_distance(&pos, &self.agents().get(b).unwrap().pos());
                let better = match best {
                    None => true,
                    Some((bd, bid)) => d < bd || (d == bd && b < bid),
                };
                if better {
                    best = Some((d, b));
                }
            }
            if let Some((_, b)) = best {
                paired.insert(a);
                paired.insert(b);
                out.push((a, b));
            }
        }
        out
    }
}

// ── Velocity operations ───────────────────────────────────────────────────────

impl<A, P, const D: usize> Model<A, ContinuousSpace<D>, P>
where
    A: Velocity<D>,
{
    /// Displace agent `id` by `vel · dt`, wrapping periodic dimensions and
    /// rejecting out-of-range moves on bounded ones.
    pub fn move_by_velocity(&mut self, id: AgentId, dt: f64) -> AbmResult<()> {
        let agent = self.agent(id)?;
        let (pos, vel) = (agent.pos(), agent.vel());
        let mut delta = [0.0; D];
        for d in 0..D {
            delta[d] = vel[d] * dt;
        }
        let new_pos = self.space().translate(&pos, &delta)?;
        self.move_agent(id, new_pos)
    }

    /// Displace agent `id` by an explicit delta.
    pub fn walk(&mut self, id: AgentId, delta: [f64; D]) -> AbmResult<()> {
        let pos = self.agent(id)?.pos();
        let new_pos = self.space().translate(&pos, &delta)?;
        self.move_agent(id, new_pos)
    }

    /// Point the agent in a uniformly random direction at speed `r`, then
    /// advance one unit of time.
    pub fn random_walk(&mut self, id: AgentId, r: f64) -> AbmResult<()> {
        if !self.contains(id) {
            return Err(AbmError::UnknownAgent(id));
        }
        let dir: [f64; D] = random_direction(&mut self.rng);
        self.walk_in_direction(id, dir, r)
    }

    fn walk_in_direction(&mut self, id: AgentId, dir: [f64; D], r: f64) -> AbmResult<()> {
        let mut vel = dir;
        for v in vel.iter_mut() {
            *v *= r;
        }
        self.agent_mut(id)?.set_vel(vel);
        self.move_by_velocity(id, 1.0)
    }

    /// Resolve an elastic collision between `a` and `b`.
    ///
    /// `mass_of` reads each body's mass; `f64::INFINITY` pins that body.
    /// Returns `false` (and changes nothing) when the pair is separating.
    pub fn elastic_collision(
        &mut self,
        a: AgentId,
        b: AgentId,
        mass_of: impl Fn(&A) -> f64,
    ) -> AbmResult<bool> {
        let (pa, va, ma) = {
            let agent = self.agent(a)?;
            (agent.pos(), agent.vel(), mass_of(agent))
        };
        let (pb, vb, mb) = {
            let agent = self.agent(b)?;
            (agent.pos(), agent.vel(), mass_of(agent))
        };
        let rel = self.space().displacement(&pa, &pb);
        match elastic_collision(rel, va, vb, ma, mb) {
            Some(c) => {
                self.agent_mut(a)?.set_vel(c.vel_a);
                self.agent_mut(b)?.set_vel(c.vel_b);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ── Dimension-specific angular walks ──────────────────────────────────────────

impl<A, P> Model<A, ContinuousSpace<2>, P>
where
    A: Velocity<2>,
{
    /// Random walk with a user-supplied polar-angle distribution.
    pub fn random_walk_polar(
        &mut self,
        id: AgentId,
        r: f64,
        polar: impl FnOnce(&mut abm_core::ModelRng) -> f64,
    ) -> AbmResult<()> {
        if !self.contains(id) {
            return Err(AbmError::UnknownAgent(id));
        }
        let theta = polar(&mut self.rng);
        self.walk_in_direction(id, direction_from_polar(theta), r)
    }
}

impl<A, P> Model<A, ContinuousSpace<3>, P>
where
    A: Velocity<3>,
{
    /// Random walk with user-supplied polar and azimuthal distributions.
    pub fn random_walk_angles(
        &mut self,
        id: AgentId,
        r: f64,
        polar: impl FnOnce(&mut abm_core::ModelRng) -> f64,
        azimuthal: impl FnOnce(&mut abm_core::ModelRng) -> f64,
    ) -> AbmResult<()> {
        if !self.contains(id) {
            return Err(AbmError::UnknownAgent(id));
        }
        let theta = polar(&mut self.rng);
        let phi = azimuthal(&mut self.rng);
        self.walk_in_direction(id, direction_from_angles(theta, phi), r)
    }
}
