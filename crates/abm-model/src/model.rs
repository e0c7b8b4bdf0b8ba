//! The `Model` container and its space-generic operations.
//!
//! # Invariants
//!
//! After every public operation:
//!
//! 1. `model[a.id] == a` for every live agent, and `a.pos` is canonical in
//!    the current space.
//! 2. The space's position→ID index agrees with every agent's `pos`.
//! 3. `max_id` ≥ every live ID; engine-allocated IDs are `max_id + 1` and
//!    freed IDs are never reused.
//!
//! Mutations order their steps so a failure leaves both structures unchanged:
//! positions canonicalize first, then the space re-indexes (atomic per the
//! `Space` contract), and the agent field is written last.

use abm_core::{AbmError, AbmResult, AgentId, ModelRng, Tick};
use abm_space::{DiscreteSpace, Space};

use crate::agent::Agent;
use crate::set::{AgentSet, Backing};

/// The model container: agents, one space, user properties, RNG, and the
/// step counter.
///
/// `P` is the user's property record; it is a plain public field, so
/// `model.properties.beta` resolves at compile time with zero overhead.
/// Models without properties use `()`.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Model<A: Agent, S, P = ()> {
    agents: AgentSet<A>,
    space:  S,
    pub properties: P,
    pub rng: ModelRng,
    tick:   Tick,
    max_id: AgentId,
}

impl<A, S, P> Model<A, S, P>
where
    A: Agent,
    S: Space<Pos = A::Pos>,
{
    /// Create an empty model over `space` with the default (`Map`) backing.
    pub fn new(space: S, properties: P, seed: u64) -> Self {
        Self::with_backing(space, properties, seed, Backing::Map)
    }

    /// Create an empty model with an explicit container backing.
    pub fn with_backing(space: S, properties: P, seed: u64, backing: Backing) -> Self {
        Self {
            agents: AgentSet::new(backing),
            space,
            properties,
            rng: ModelRng::seeded(seed),
            tick: Tick::ZERO,
            max_id: AgentId::EMPTY,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Advance the step counter.  Called once per step by the driver.
    #[inline]
    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    /// The last allocated agent ID.
    #[inline]
    pub fn max_id(&self) -> AgentId {
        self.max_id
    }

    #[inline]
    pub fn space(&self) -> &S {
        &self.space
    }

    /// Mutable space access for topology edits; position re-indexing still
    /// goes through the model's own operations.
    #[inline]
    pub(crate) fn space_mut(&mut self) -> &mut S {
        &mut self.space
    }

    #[inline]
    pub fn agents(&self) -> &AgentSet<A> {
        &self.agents
    }

    /// Split borrow for operations that read the space while sampling.
    #[inline]
    pub(crate) fn space_and_rng(&mut self) -> (&S, &mut ModelRng) {
        (&self.space, &mut self.rng)
    }

    /// Split borrow for schedulers: read the container while drawing from
    /// the RNG.
    #[inline]
    pub fn agents_and_rng(&mut self) -> (&AgentSet<A>, &mut ModelRng) {
        (&self.agents, &mut self.rng)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains(id)
    }

    pub fn agent(&self, id: AgentId) -> AbmResult<&A> {
        self.agents.get(id).ok_or(AbmError::UnknownAgent(id))
    }

    pub fn agent_mut(&mut self, id: AgentId) -> AbmResult<&mut A> {
        self.agents.get_mut(id).ok_or(AbmError::UnknownAgent(id))
    }

    // ── Agent lifecycle ───────────────────────────────────────────────────

    /// Insert a fully formed agent.
    ///
    /// An agent carrying `AgentId::EMPTY` receives the next fresh ID; any
    /// other ID must be unused (`DuplicateAgent` otherwise).  The position is
    /// canonicalized, registered in the space, and written back to the agent.
    pub fn add_agent(&mut self, mut agent: A) -> AbmResult<AgentId> {
        let id = if agent.id() == AgentId::EMPTY {
            let id = self.max_id.next();
            agent.set_id(id);
            id
        } else {
            let id = agent.id();
            if self.agents.contains(id) {
                return Err(AbmError::DuplicateAgent(id));
            }
            id
        };
        let pos = self.space.canonicalize(&agent.pos())?;
        agent.set_pos(pos.clone());
        self.space.insert(id, &pos)?;
        // Space committed; the container insert cannot fail (ID checked above).
        self.agents
            .insert(agent)
            .expect("duplicate ID checked before space insert");
        self.max_id = self.max_id.max(id);
        Ok(id)
    }

    /// Insert an agent built from the freshly allocated ID.
    pub fn add_agent_with(&mut self, build: impl FnOnce(AgentId) -> A) -> AbmResult<AgentId> {
        let mut agent = build(self.max_id.next());
        agent.set_id(AgentId::EMPTY);
        self.add_agent(agent)
    }

    /// Remove an agent, returning it.  The space index is cleared first.
    pub fn remove_agent(&mut self, id: AgentId) -> AbmResult<A> {
        let pos = self.agent(id)?.pos();
        self.space.delete(id, &pos);
        self.agents
            .remove(id)
            .ok_or(AbmError::UnknownAgent(id))
    }

    /// Remove an agent from the container only — for callers that already
    /// cleared the space index (vertex removal evictions).
    pub(crate) fn take_agent_raw(&mut self, id: AgentId) -> Option<A> {
        self.agents.remove(id)
    }

    /// Remove every agent.
    pub fn remove_all(&mut self) {
        let ids: Vec<AgentId> = self.agents.ids().to_vec();
        for id in ids {
            let _ = self.remove_agent(id);
        }
    }

    /// Remove every agent satisfying `pred`.
    pub fn remove_all_where(&mut self, mut pred: impl FnMut(&A) -> bool) {
        let ids: Vec<AgentId> = self
            .agents
            .ids()
            .iter()
            .copied()
            .filter(|&id| self.agents.get(id).map(&mut pred).unwrap_or(false))
            .collect();
        for id in ids {
            let _ = self.remove_agent(id);
        }
    }

    /// Move an agent: re-index in the space, then update the agent's `pos`.
    ///
    /// On failure (occupied target cell, out-of-bounds coordinate) neither
    /// the space nor the agent changes.
    pub fn move_agent(&mut self, id: AgentId, new_pos: A::Pos) -> AbmResult<()> {
        let old = self.agent(id)?.pos();
        let new_pos = self.space.canonicalize(&new_pos)?;
        self.space.relocate(id, &old, &new_pos)?;
        self.agent_mut(id)
            .expect("agent existence checked above")
            .set_pos(new_pos);
        Ok(())
    }

    // ── Random selection ──────────────────────────────────────────────────

    /// A uniformly random live agent ID.
    pub fn random_agent(&mut self) -> Option<AgentId> {
        self.agents.random_id(&mut self.rng)
    }

    /// A uniformly random live agent ID satisfying `pred`.
    ///
    /// Bounded rejection sampling with a full-scan fallback; `None` when no
    /// agent matches.
    pub fn random_agent_where(&mut self, pred: impl FnMut(&A) -> bool) -> Option<AgentId> {
        self.agents.random_id_where(&mut self.rng, pred)
    }

    /// A uniformly random position in the space.
    pub fn random_position(&mut self) -> A::Pos {
        self.space.random_pos(&mut self.rng)
    }
}

// ── Discrete-space operations ─────────────────────────────────────────────────

impl<A, S, P> Model<A, S, P>
where
    A: Agent,
    S: DiscreteSpace<Pos = A::Pos>,
{
    /// IDs standing exactly at `pos`.
    pub fn ids_in_position(&self, pos: &A::Pos) -> &[AgentId] {
        self.space.ids_at(pos)
    }

    /// `true` if no agent stands at `pos`.
    pub fn is_empty_position(&self, pos: &A::Pos) -> bool {
        self.space.is_empty_at(pos)
    }

    /// All positions in canonical order.
    pub fn positions(&self) -> Vec<A::Pos> {
        self.space.positions().collect()
    }

    /// All currently empty positions in canonical order.
    pub fn empty_positions(&self) -> Vec<A::Pos> {
        self.space.empty_positions().collect()
    }

    /// The first empty position in canonical order.
    pub fn empty_position(&self) -> AbmResult<A::Pos> {
        self.space
            .empty_positions()
            .next()
            .ok_or(AbmError::NoEmptyPosition)
    }

    /// A uniformly random empty position.
    pub fn random_empty(&mut self) -> AbmResult<A::Pos> {
        Ok(self.space.random_empty(&mut self.rng)?)
    }

    /// Insert an agent at a random empty position, failing with
    /// `NoEmptyPosition` when the space is full.  The agent's own `pos` is
    /// overwritten.
    pub fn add_agent_single(&mut self, mut agent: A) -> AbmResult<AgentId> {
        let pos = self.space.random_empty(&mut self.rng)?;
        agent.set_pos(pos);
        self.add_agent(agent)
    }
}

// ── Grid operations (both occupancy variants) ─────────────────────────────────
//
// `S: LatticeSpace<D>` is implemented only by `GridSpace<D>` and
// `GridSpaceSingle<D>` (both defined in `abm_space`), but a blanket impl
// bounded by that foreign trait is not coherence-safe against the other
// space-specific impl blocks below (abm_space could in principle add a
// `LatticeSpace` impl for `ContinuousSpace`/`GraphSpace`/`OsmSpace` in a
// later version). The macro instantiates the identical body against each
// concrete lattice type instead of one generic-over-trait-bound impl.
macro_rules! impl_grid_ops {
    ($S:ty) => {
        impl<A, P, const D: usize> Model<A, $S, P>
        where
            A: Agent<Pos = [i32; D]>,
        {
            /// IDs within metric radius `r` of `pos`, occupants of `pos` included.
            pub fn nearby_ids(&self, pos: &[i32; D], r: f64) -> Vec<AgentId> {
                self.space.nearby_ids(pos, r)
            }

            /// IDs within metric radius `r` of agent `id`, excluding `id` itself
            /// (co-located agents stay).
            pub fn nearby_ids_of(&self, id: AgentId, r: f64) -> AbmResult<Vec<AgentId>> {
                let pos = self.agent(id)?.pos();
                let mut ids = self.space.nearby_ids(&pos, r);
                ids.retain(|&x| x != id);
                Ok(ids)
            }

            /// Agents within metric radius `r` of `pos`.
            pub fn nearby_agents(&self, pos: &[i32; D], r: f64) -> impl Iterator<Item = &A> {
                self.space
                    .nearby_ids(pos, r)
                    .into_iter()
                    .filter_map(|id| self.agents.get(id))
            }

            /// Positions within metric radius `r` of `pos`, `pos` excluded.
            pub fn nearby_positions(&self, pos: &[i32; D], r: f64) -> Vec<[i32; D]> {
                self.space.nearby_positions(pos, r)
            }

            /// Displace an agent by a cell offset (wrapping periodic dimensions).
            pub fn walk(&mut self, id: AgentId, delta: [i32; D]) -> AbmResult<()> {
                let pos = self.agent(id)?.pos();
                let mut target = pos;
                for d in 0..D {
                    target[d] += delta[d];
                }
                self.move_agent(id, target)
            }

            /// Euclidean distance between two grid positions, honoring periodicity.
            pub fn euclidean_distance(&self, a: &[i32; D], b: &[i32; D]) -> f64 {
                let delta = self.space.lattice().wrapped_delta(a, b);
                delta
                    .iter()
                    .map(|x| (*x as f64) * (*x as f64))
                    .sum::<f64>()
                    .sqrt()
            }

            /// Manhattan distance between two grid positions, honoring periodicity.
            pub fn manhattan_distance(&self, a: &[i32; D], b: &[i32; D]) -> f64 {
                let delta = self.space.lattice().wrapped_delta(a, b);
                delta.iter().map(|x| x.abs() as f64).sum()
            }
        }
    };
}

impl_grid_ops!(abm_space::GridSpace<D>);
impl_grid_ops!(abm_space::GridSpaceSingle<D>);

// ── Grid + discrete combined operations ───────────────────────────────────────

macro_rules! impl_grid_discrete_ops {
    ($S:ty) => {
        impl<A, P, const D: usize> Model<A, $S, P>
        where
            A: Agent<Pos = [i32; D]>,
        {
            /// As [`walk`](Self::walk), but only when the target cell is empty.
            ///
            /// Returns whether the move happened; the wrapped target falling outside
            /// a bounded grid is an error, an occupied target is `Ok(false)`.
            pub fn walk_if_empty(&mut self, id: AgentId, delta: [i32; D]) -> AbmResult<bool> {
                let pos = self.agent(id)?.pos();
                let mut target = pos;
                for d in 0..D {
                    target[d] += delta[d];
                }
                let target = self.space.canonicalize(&target)?;
                if !self.space.is_empty_at(&target) {
                    return Ok(false);
                }
                self.move_agent(id, target)?;
                Ok(true)
            }
        }
    };
}

impl_grid_discrete_ops!(abm_space::GridSpace<D>);
impl_grid_discrete_ops!(abm_space::GridSpaceSingle<D>);

// ── Single-occupancy extras ───────────────────────────────────────────────────

impl<A, P, const D: usize> Model<A, abm_space::GridSpaceSingle<D>, P>
where
    A: Agent<Pos = [i32; D]>,
{
    /// The occupant of `pos`, or `AgentId::EMPTY`.
    pub fn id_at(&self, pos: &[i32; D]) -> AgentId {
        self.space().id_at(pos)
    }

    /// Exchange the positions of two agents atomically.
    pub fn swap_agents(&mut self, a: AgentId, b: AgentId) -> AbmResult<()> {
        let pa = self.agent(a)?.pos();
        let pb = self.agent(b)?.pos();
        self.space_mut().swap_cells(&pa, &pb);
        self.agent_mut(a)?.set_pos(pb);
        self.agent_mut(b)?.set_pos(pa);
        Ok(())
    }
}
