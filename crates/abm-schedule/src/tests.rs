//! Unit tests for abm-schedule.

use abm_core::{AgentId, ModelRng};
use abm_model::{Agent, AgentSet, Backing};

use crate::{ById, ByKind, ByProperty, Fastest, Partially, Randomly, Scheduler};

// ── Fixture: two-variant agent enum ───────────────────────────────────────────

#[derive(Clone, Debug)]
enum Critter {
    Sheep { id: AgentId, hunger: i32 },
    Wolf { id: AgentId, hunger: i32 },
}

impl Agent for Critter {
    type Pos = ();

    fn id(&self) -> AgentId {
        match self {
            Critter::Sheep { id, .. } | Critter::Wolf { id, .. } => *id,
        }
    }

    fn set_id(&mut self, new: AgentId) {
        match self {
            Critter::Sheep { id, .. } | Critter::Wolf { id, .. } => *id = new,
        }
    }

    fn pos(&self) {}
    fn set_pos(&mut self, _pos: ()) {}

    const KINDS: &'static [&'static str] = &["sheep", "wolf"];

    fn kind(&self) -> usize {
        match self {
            Critter::Sheep { .. } => 0,
            Critter::Wolf { .. } => 1,
        }
    }
}

impl Critter {
    fn hunger(&self) -> i32 {
        match self {
            Critter::Sheep { hunger, .. } | Critter::Wolf { hunger, .. } => *hunger,
        }
    }
}

/// Alternating sheep/wolves with descending hunger.
fn herd(n: u32) -> AgentSet<Critter> {
    let mut set = AgentSet::new(Backing::Map);
    for i in 1..=n {
        let agent = if i % 2 == 1 {
            Critter::Sheep { id: AgentId(i), hunger: (n - i) as i32 }
        } else {
            Critter::Wolf { id: AgentId(i), hunger: (n - i) as i32 }
        };
        set.insert(agent).unwrap();
    }
    set
}

fn order_of<S: Scheduler<Critter>>(mut s: S, agents: &AgentSet<Critter>, seed: u64) -> Vec<AgentId> {
    let mut rng = ModelRng::seeded(seed);
    let mut out = Vec::new();
    s.order(agents, &mut rng, &mut out);
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn fastest_is_container_order() {
    let agents = herd(6);
    assert_eq!(order_of(Fastest, &agents, 0), agents.ids());
}

#[test]
fn by_id_is_ascending() {
    let mut agents = herd(6);
    agents.remove(AgentId(2));
    let order = order_of(ById, &agents, 0);
    assert_eq!(order, vec![AgentId(1), AgentId(3), AgentId(4), AgentId(5), AgentId(6)]);
}

#[test]
fn randomly_is_a_permutation_and_varies_by_step() {
    let agents = herd(20);
    let mut rng = ModelRng::seeded(5);
    let mut sched = Randomly;
    let mut first = Vec::new();
    let mut second = Vec::new();
    sched.order(&agents, &mut rng, &mut first);
    sched.order(&agents, &mut rng, &mut second);

    let mut sorted = first.clone();
    sorted.sort_unstable();
    let mut expected = agents.ids().to_vec();
    expected.sort_unstable();
    assert_eq!(sorted, expected, "shuffle keeps the population");
    assert_ne!(first, second, "fresh shuffle each step");
}

#[test]
fn randomly_reproducible_for_same_seed() {
    let agents = herd(20);
    assert_eq!(order_of(Randomly, &agents, 7), order_of(Randomly, &agents, 7));
}

#[test]
fn partially_takes_floor_of_fraction() {
    let agents = herd(10);
    assert_eq!(order_of(Partially(0.5), &agents, 0).len(), 5);
    assert_eq!(order_of(Partially(0.19), &agents, 0).len(), 1);
    assert_eq!(order_of(Partially(0.0), &agents, 0).len(), 0);
    assert_eq!(order_of(Partially(1.0), &agents, 0).len(), 10);
}

#[test]
fn by_property_sorts_ascending() {
    let agents = herd(5); // hunger descends with id
    let order = order_of(ByProperty::new(Critter::hunger), &agents, 0);
    assert_eq!(order, vec![AgentId(5), AgentId(4), AgentId(3), AgentId(2), AgentId(1)]);
}

#[test]
fn by_kind_declaration_order_then_id() {
    // Sheep (odd ids) first in insertion/id order, then wolves.
    let agents = herd(6);
    let order = order_of(ByKind::new(false, false), &agents, 0);
    assert_eq!(
        order,
        vec![AgentId(1), AgentId(3), AgentId(5), AgentId(2), AgentId(4), AgentId(6)]
    );
}

#[test]
fn by_kind_explicit_order() {
    let agents = herd(6);
    let order = order_of(ByKind::with_order(vec![1, 0]), &agents, 0);
    assert_eq!(
        order,
        vec![AgentId(2), AgentId(4), AgentId(6), AgentId(1), AgentId(3), AgentId(5)]
    );
}

#[test]
fn by_kind_shuffled_agents_keep_kind_grouping() {
    let agents = herd(12);
    let order = order_of(ByKind::new(false, true), &agents, 3);
    let first_wolf = order.iter().position(|id| id.0 % 2 == 0).unwrap();
    assert!(
        order[..first_wolf].iter().all(|id| id.0 % 2 == 1)
            && order[first_wolf..].iter().all(|id| id.0 % 2 == 0),
        "all sheep precede all wolves: {order:?}"
    );
}

#[test]
fn closure_as_scheduler() {
    let agents = herd(4);
    let even_only = |agents: &AgentSet<Critter>, _rng: &mut ModelRng, out: &mut Vec<AgentId>| {
        out.clear();
        out.extend(agents.ids().iter().copied().filter(|id| id.0 % 2 == 0));
    };
    let order = order_of(even_only, &agents, 0);
    assert_eq!(order, vec![AgentId(2), AgentId(4)]);
}
