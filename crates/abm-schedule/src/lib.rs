//! `abm-schedule` — agent activation orderings.
//!
//! A scheduler produces the order in which the stepping driver visits agents,
//! once per step.  The driver hands it the agent container, the model RNG,
//! and a reusable output buffer; schedulers overwrite the buffer rather than
//! allocating, so steady-state stepping does no per-step allocation.
//!
//! Closures of the same shape implement [`Scheduler`] too, so one-off
//! orderings don't need a named type:
//!
//! ```rust,ignore
//! sim.set_scheduler(|agents: &AgentSet<A>, _rng: &mut ModelRng, out: &mut Vec<AgentId>| {
//!     out.extend(agents.ids().iter().copied().filter(|id| id.0 % 2 == 0));
//! });
//! ```
//!
//! # Variants
//!
//! | Type             | Order                                                  |
//! |------------------|--------------------------------------------------------|
//! | [`Fastest`]      | Container iteration order (deterministic, undefined)   |
//! | [`ById`]         | Ascending ID                                           |
//! | [`Randomly`]     | Fresh uniform shuffle each step                        |
//! | [`Partially`]    | Random subset of ⌊p·N⌋ agents each step              |
//! | [`ByProperty`]   | Ascending by a user-supplied key                       |
//! | [`ByKind`]       | Grouped by agent variant, declaration order            |

use abm_core::{AgentId, ModelRng};
use abm_model::{Agent, AgentSet};

#[cfg(test)]
mod tests;

// ── Scheduler trait ───────────────────────────────────────────────────────────

/// Produces the visit order for one step.
///
/// Implementations overwrite `out`; the buffer must not be assumed to
/// survive past the step.
pub trait Scheduler<A: Agent>: Send {
    fn order(&mut self, agents: &AgentSet<A>, rng: &mut ModelRng, out: &mut Vec<AgentId>);
}

impl<A: Agent, F> Scheduler<A> for F
where
    F: FnMut(&AgentSet<A>, &mut ModelRng, &mut Vec<AgentId>) + Send,
{
    fn order(&mut self, agents: &AgentSet<A>, rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        self(agents, rng, out)
    }
}

// ── Fastest ───────────────────────────────────────────────────────────────────

/// Container iteration order: whatever is cheapest.  Deterministic for a
/// fixed operation sequence, otherwise unspecified.
#[derive(Default)]
pub struct Fastest;

impl<A: Agent> Scheduler<A> for Fastest {
    fn order(&mut self, agents: &AgentSet<A>, _rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();
        out.extend_from_slice(agents.ids());
    }
}

// ── ById ──────────────────────────────────────────────────────────────────────

/// Ascending agent ID.
#[derive(Default)]
pub struct ById;

impl<A: Agent> Scheduler<A> for ById {
    fn order(&mut self, agents: &AgentSet<A>, _rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();
        out.extend_from_slice(agents.ids());
        out.sort_unstable();
    }
}

// ── Randomly ──────────────────────────────────────────────────────────────────

/// A fresh uniform shuffle every step.
#[derive(Default)]
pub struct Randomly;

impl<A: Agent> Scheduler<A> for Randomly {
    fn order(&mut self, agents: &AgentSet<A>, rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();
        out.extend_from_slice(agents.ids());
        rng.shuffle(out);
    }
}

// ── Partially ─────────────────────────────────────────────────────────────────

/// A random subset of `⌊p·N⌋` agents each step, in shuffled order.
pub struct Partially(pub f64);

impl<A: Agent> Scheduler<A> for Partially {
    fn order(&mut self, agents: &AgentSet<A>, rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();
        out.extend_from_slice(agents.ids());
        rng.shuffle(out);
        let keep = (self.0.clamp(0.0, 1.0) * agents.len() as f64).floor() as usize;
        out.truncate(keep);
    }
}

// ── ByProperty ────────────────────────────────────────────────────────────────

/// Ascending by a user-supplied key (stable for equal keys, so equal-key
/// agents keep their container order).
pub struct ByProperty<A, K: Ord> {
    key: Box<dyn Fn(&A) -> K + Send>,
}

impl<A, K: Ord> ByProperty<A, K> {
    pub fn new(key: impl Fn(&A) -> K + Send + 'static) -> Self {
        Self { key: Box::new(key) }
    }
}

impl<A: Agent, K: Ord> Scheduler<A> for ByProperty<A, K> {
    fn order(&mut self, agents: &AgentSet<A>, _rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();
        out.extend_from_slice(agents.ids());
        out.sort_by_key(|&id| (self.key)(agents.get(id).expect("scheduled id is live")));
    }
}

// ── ByKind ────────────────────────────────────────────────────────────────────

/// Grouped by concrete agent variant.
///
/// Kinds appear in `Agent::KINDS` declaration order unless `kind_order`
/// overrides it; within each kind, agents keep ascending-ID order.  Either
/// level can be shuffled independently per step.
pub struct ByKind {
    pub shuffle_kinds:  bool,
    pub shuffle_agents: bool,
    /// Explicit kind ordering (indices into `Agent::KINDS`).
    pub kind_order: Option<Vec<usize>>,
}

impl ByKind {
    /// Declaration-order kinds, ascending IDs within each kind.
    pub fn new(shuffle_kinds: bool, shuffle_agents: bool) -> Self {
        Self { shuffle_kinds, shuffle_agents, kind_order: None }
    }

    /// Fixed explicit kind ordering.
    pub fn with_order(order: Vec<usize>) -> Self {
        Self {
            shuffle_kinds:  false,
            shuffle_agents: false,
            kind_order: Some(order),
        }
    }
}

impl<A: Agent> Scheduler<A> for ByKind {
    fn order(&mut self, agents: &AgentSet<A>, rng: &mut ModelRng, out: &mut Vec<AgentId>) {
        out.clear();

        let mut buckets: Vec<Vec<AgentId>> = vec![Vec::new(); A::KINDS.len()];
        let mut ids: Vec<AgentId> = agents.ids().to_vec();
        ids.sort_unstable();
        for id in ids {
            let kind = agents.get(id).expect("scheduled id is live").kind();
            buckets[kind].push(id);
        }

        let mut kinds: Vec<usize> = match &self.kind_order {
            Some(order) => order.clone(),
            None => (0..A::KINDS.len()).collect(),
        };
        if self.shuffle_kinds {
            rng.shuffle(&mut kinds);
        }

        for kind in kinds {
            let bucket = &mut buckets[kind];
            if self.shuffle_agents {
                rng.shuffle(bucket);
            }
            out.extend_from_slice(bucket);
        }
    }
}

// ── One-shot helpers ──────────────────────────────────────────────────────────

/// Allocate-and-return forms of the schedulers, for callers outside the
/// stepping loop (object forms amortize the buffer; these do not).
pub mod oneshot {
    use super::*;

    pub fn fastest<A: Agent>(agents: &AgentSet<A>) -> Vec<AgentId> {
        agents.ids().to_vec()
    }

    pub fn by_id<A: Agent>(agents: &AgentSet<A>) -> Vec<AgentId> {
        let mut ids = agents.ids().to_vec();
        ids.sort_unstable();
        ids
    }

    pub fn randomly<A: Agent>(agents: &AgentSet<A>, rng: &mut ModelRng) -> Vec<AgentId> {
        let mut ids = agents.ids().to_vec();
        rng.shuffle(&mut ids);
        ids
    }

    pub fn partially<A: Agent>(
        agents: &AgentSet<A>,
        rng: &mut ModelRng,
        p: f64,
    ) -> Vec<AgentId> {
        let mut out = Vec::new();
        Partially(p).order(agents, rng, &mut out);
        out
    }
}
