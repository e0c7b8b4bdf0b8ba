//! `AgentSet` — the id-indexed agent container.
//!
//! # Backings
//!
//! | Backing    | Storage                     | Suits                          |
//! |------------|-----------------------------|--------------------------------|
//! | `Map`      | `FxHashMap<AgentId, A>`     | sparse / churning populations  |
//! | `DenseVec` | `Vec<Option<A>>` tombstones | compact, mostly-stable IDs     |
//!
//! Both backings share a live-ID vector (`swap_remove` on removal) plus an
//! id→slot map, so `lookup`, `contains`, and `remove` are O(1) and uniform
//! random selection is O(1) regardless of backing.
//!
//! # Iteration order
//!
//! Iteration follows the live-ID vector: insertion order until a removal,
//! whose swap-remove moves the last-inserted ID into the freed slot.  The
//! order is deterministic for a fixed operation sequence; no cross-run
//! stability beyond that is promised.

use rustc_hash::FxHashMap;

use abm_core::{AbmError, AbmResult, AgentId, ModelRng};

use crate::agent::Agent;

/// Cheap rejection draws before [`AgentSet::random_id_where`] falls back to a
/// full filtered scan.  Covers predicates matching ≳10 % of agents with high
/// probability; rarer predicates pay one O(N) scan.
const WHERE_RETRIES: usize = 30;

/// Which storage backs the container.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Backing {
    #[default]
    Map,
    DenseVec,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
enum Storage<A> {
    Map(FxHashMap<AgentId, A>),
    /// Indexed by `AgentId`; `None` slots are tombstones (IDs never recycle).
    Dense(Vec<Option<A>>),
}

/// Id-indexed agent storage with O(1) lookup, removal, and random selection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AgentSet<A> {
    storage: Storage<A>,
    /// Live IDs; iteration order.  Removal swap-removes.
    ids: Vec<AgentId>,
    /// id → position in `ids`.
    slot_of: FxHashMap<AgentId, u32>,
}

impl<A: Agent> AgentSet<A> {
    pub fn new(backing: Backing) -> Self {
        let storage = match backing {
            Backing::Map => Storage::Map(FxHashMap::default()),
            Backing::DenseVec => Storage::Dense(Vec::new()),
        };
        Self {
            storage,
            ids: Vec::new(),
            slot_of: FxHashMap::default(),
        }
    }

    pub fn backing(&self) -> Backing {
        match self.storage {
            Storage::Map(_) => Backing::Map,
            Storage::Dense(_) => Backing::DenseVec,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: AgentId) -> bool {
        self.slot_of.contains_key(&id)
    }

    // ── Insert / remove ───────────────────────────────────────────────────

    /// Insert `agent` under its own ID; fails if the ID is already present.
    pub fn insert(&mut self, agent: A) -> AbmResult<()> {
        let id = agent.id();
        if self.contains(id) {
            return Err(AbmError::DuplicateAgent(id));
        }
        self.slot_of.insert(id, self.ids.len() as u32);
        self.ids.push(id);
        match &mut self.storage {
            Storage::Map(map) => {
                map.insert(id, agent);
            }
            Storage::Dense(slots) => {
                if slots.len() <= id.index() {
                    slots.resize_with(id.index() + 1, || None);
                }
                slots[id.index()] = Some(agent);
            }
        }
        Ok(())
    }

    /// Remove and return the agent stored under `id`.
    pub fn remove(&mut self, id: AgentId) -> Option<A> {
        let slot = self.slot_of.remove(&id)? as usize;
        self.ids.swap_remove(slot);
        if let Some(&moved) = self.ids.get(slot) {
            self.slot_of.insert(moved, slot as u32);
        }
        match &mut self.storage {
            Storage::Map(map) => map.remove(&id),
            Storage::Dense(slots) => slots[id.index()].take(),
        }
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    #[inline]
    pub fn get(&self, id: AgentId) -> Option<&A> {
        if !self.contains(id) {
            return None;
        }
        match &self.storage {
            Storage::Map(map) => map.get(&id),
            Storage::Dense(slots) => slots.get(id.index()).and_then(Option::as_ref),
        }
    }

    #[inline]
    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut A> {
        if !self.slot_of.contains_key(&id) {
            return None;
        }
        match &mut self.storage {
            Storage::Map(map) => map.get_mut(&id),
            Storage::Dense(slots) => slots.get_mut(id.index()).and_then(Option::as_mut),
        }
    }

    /// Mutable access to two distinct agents at once.
    ///
    /// Returns `None` when either is missing or `a == b`.
    pub fn get_pair_mut(&mut self, a: AgentId, b: AgentId) -> Option<(&mut A, &mut A)> {
        if a == b || !self.contains(a) || !self.contains(b) {
            return None;
        }
        match &mut self.storage {
            Storage::Map(map) => {
                let x = map.get_mut(&a)? as *mut A;
                let y = map.get_mut(&b)? as *mut A;
                // SAFETY: `a != b` was checked above and no entry is inserted
                // or removed between the two lookups, so the pointers address
                // two distinct live values.
                unsafe { Some((&mut *x, &mut *y)) }
            }
            Storage::Dense(slots) => {
                let (lo, hi, flip) = if a < b { (a, b, false) } else { (b, a, true) };
                let (left, right) = slots.split_at_mut(hi.index());
                let x = left[lo.index()].as_mut()?;
                let y = right[0].as_mut()?;
                Some(if flip { (y, x) } else { (x, y) })
            }
        }
    }

    // ── Iteration ─────────────────────────────────────────────────────────

    /// Live IDs in container order.
    #[inline]
    pub fn ids(&self) -> &[AgentId] {
        &self.ids
    }

    /// Agents in container order.
    pub fn iter(&self) -> impl Iterator<Item = &A> {
        self.ids.iter().filter_map(|&id| self.get(id))
    }

    // ── Random selection ──────────────────────────────────────────────────

    /// A uniformly random live ID, or `None` when empty.
    pub fn random_id(&self, rng: &mut ModelRng) -> Option<AgentId> {
        if self.ids.is_empty() {
            return None;
        }
        Some(self.ids[rng.gen_range(0..self.ids.len())])
    }

    /// A uniformly random live ID whose agent satisfies `pred`.
    ///
    /// Rejection-samples for a bounded number of draws, then falls back to a
    /// full filtered scan; returns `None` when no agent matches.
    pub fn random_id_where(
        &self,
        rng: &mut ModelRng,
        mut pred: impl FnMut(&A) -> bool,
    ) -> Option<AgentId> {
        if self.ids.is_empty() {
            return None;
        }
        for _ in 0..WHERE_RETRIES {
            let id = self.ids[rng.gen_range(0..self.ids.len())];
            if self.get(id).map(&mut pred).unwrap_or(false) {
                return Some(id);
            }
        }
        let matching: Vec<AgentId> = self
            .ids
            .iter()
            .copied()
            .filter(|&id| self.get(id).map(&mut pred).unwrap_or(false))
            .collect();
        rng.choose(&matching).copied()
    }
}
