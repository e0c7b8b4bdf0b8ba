//! Unit tests for abm-model.

use abm_core::AgentId;
use abm_space::{GridSpace, Metric, NoSpace};

use crate::agent::Agent;
use crate::model::Model;
use crate::set::{AgentSet, Backing};

// ── Fixtures ──────────────────────────────────────────────────────────────────

/// Minimal grid agent.
#[derive(Clone, Debug, PartialEq)]
struct Walker {
    id:     AgentId,
    pos:    [i32; 2],
    wealth: i64,
}

impl Walker {
    fn at(pos: [i32; 2]) -> Self {
        Self { id: AgentId::EMPTY, pos, wealth: 0 }
    }
}

impl Agent for Walker {
    type Pos = [i32; 2];
    fn id(&self) -> AgentId {
        self.id
    }
    fn set_id(&mut self, id: AgentId) {
        self.id = id;
    }
    fn pos(&self) -> [i32; 2] {
        self.pos
    }
    fn set_pos(&mut self, pos: [i32; 2]) {
        self.pos = pos;
    }
}

/// Non-spatial agent.
#[derive(Clone, Debug)]
struct Bare {
    id:    AgentId,
    value: u32,
}

impl Agent for Bare {
    type Pos = ();
    fn id(&self) -> AgentId {
        self.id
    }
    fn set_id(&mut self, id: AgentId) {
        self.id = id;
    }
    fn pos(&self) {}
    fn set_pos(&mut self, _pos: ()) {}
}

fn grid_model() -> Model<Walker, GridSpace<2>, ()> {
    Model::new(GridSpace::new([5, 5], false, Metric::Chebyshev), (), 42)
}

// ── AgentSet ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod set {
    use super::*;
    use abm_core::ModelRng;

    fn bare(id: u32, value: u32) -> Bare {
        Bare { id: AgentId(id), value }
    }

    #[test]
    fn insert_lookup_remove_both_backings() {
        for backing in [Backing::Map, Backing::DenseVec] {
            let mut set: AgentSet<Bare> = AgentSet::new(backing);
            set.insert(bare(1, 10)).unwrap();
            set.insert(bare(2, 20)).unwrap();
            assert_eq!(set.len(), 2);
            assert!(set.contains(AgentId(1)));
            assert_eq!(set.get(AgentId(2)).unwrap().value, 20);

            let removed = set.remove(AgentId(1)).unwrap();
            assert_eq!(removed.value, 10);
            assert!(!set.contains(AgentId(1)));
            assert_eq!(set.len(), 1);
            assert!(set.remove(AgentId(1)).is_none());
        }
    }

    #[test]
    fn duplicate_insert_rejected() {
        let mut set: AgentSet<Bare> = AgentSet::new(Backing::Map);
        set.insert(bare(1, 0)).unwrap();
        assert!(set.insert(bare(1, 1)).is_err());
    }

    #[test]
    fn iteration_follows_live_id_vector() {
        let mut set: AgentSet<Bare> = AgentSet::new(Backing::DenseVec);
        for i in 1..=4 {
            set.insert(bare(i, i * 10)).unwrap();
        }
        assert_eq!(set.ids(), &[AgentId(1), AgentId(2), AgentId(3), AgentId(4)]);
        // Swap-remove moves the last ID into the freed slot.
        set.remove(AgentId(2));
        assert_eq!(set.ids(), &[AgentId(1), AgentId(4), AgentId(3)]);
    }

    #[test]
    fn random_id_uniform_over_live() {
        let mut set: AgentSet<Bare> = AgentSet::new(Backing::Map);
        let mut rng = ModelRng::seeded(1);
        assert!(set.random_id(&mut rng).is_none());
        for i in 1..=10 {
            set.insert(bare(i, i)).unwrap();
        }
        for _ in 0..100 {
            assert!(set.contains(set.random_id(&mut rng).unwrap()));
        }
    }

    #[test]
    fn random_id_where_finds_rare_match() {
        let mut set: AgentSet<Bare> = AgentSet::new(Backing::Map);
        let mut rng = ModelRng::seeded(2);
        for i in 1..=500 {
            set.insert(bare(i, i)).unwrap();
        }
        // Exactly one agent matches; rejection gives up, the scan finds it.
        let hit = set.random_id_where(&mut rng, |a| a.value == 499).unwrap();
        assert_eq!(hit, AgentId(499));
    }

    #[test]
    fn random_id_where_none_matches_returns_none() {
        let mut set: AgentSet<Bare> = AgentSet::new(Backing::Map);
        let mut rng = ModelRng::seeded(3);
        for i in 1..=50 {
            set.insert(bare(i, i)).unwrap();
        }
        assert!(set.random_id_where(&mut rng, |_| false).is_none());
    }

    #[test]
    fn pair_mut_disjoint_access() {
        for backing in [Backing::Map, Backing::DenseVec] {
            let mut set: AgentSet<Bare> = AgentSet::new(backing);
            set.insert(bare(1, 1)).unwrap();
            set.insert(bare(2, 2)).unwrap();
            let (a, b) = set.get_pair_mut(AgentId(1), AgentId(2)).unwrap();
            std::mem::swap(&mut a.value, &mut b.value);
            assert_eq!(set.get(AgentId(1)).unwrap().value, 2);
            assert!(set.get_pair_mut(AgentId(1), AgentId(1)).is_none());
        }
    }
}

// ── Model lifecycle ───────────────────────────────────────────────────────────

#[cfg(test)]
mod lifecycle {
    use super::*;

    #[test]
    fn ids_allocate_monotonically_from_one() {
        let mut m = grid_model();
        let a = m.add_agent(Walker::at([0, 0])).unwrap();
        let b = m.add_agent(Walker::at([1, 1])).unwrap();
        assert_eq!(a, AgentId(1));
        assert_eq!(b, AgentId(2));
        assert_eq!(m.max_id(), AgentId(2));
    }

    #[test]
    fn freed_ids_are_not_reused() {
        let mut m = grid_model();
        let a = m.add_agent(Walker::at([0, 0])).unwrap();
        m.remove_agent(a).unwrap();
        let b = m.add_agent(Walker::at([0, 0])).unwrap();
        assert_eq!(b, AgentId(2));
    }

    #[test]
    fn explicit_id_must_be_unused() {
        let mut m = grid_model();
        let mut w = Walker::at([0, 0]);
        w.id = AgentId(7);
        assert_eq!(m.add_agent(w.clone()).unwrap(), AgentId(7));
        assert!(m.add_agent(w).is_err(), "duplicate explicit ID");
        // max_id advanced past the explicit ID.
        assert_eq!(m.add_agent(Walker::at([1, 0])).unwrap(), AgentId(8));
    }

    #[test]
    fn container_and_space_agree_after_every_operation() {
        let mut m = grid_model();
        let a = m.add_agent(Walker::at([1, 1])).unwrap();
        let b = m.add_agent(Walker::at([1, 1])).unwrap();
        assert_eq!(m.ids_in_position(&[1, 1]), &[a, b]);

        m.move_agent(a, [2, 2]).unwrap();
        assert_eq!(m.agent(a).unwrap().pos, [2, 2]);
        assert_eq!(m.ids_in_position(&[2, 2]), &[a]);
        assert_eq!(m.ids_in_position(&[1, 1]), &[b]);

        m.remove_agent(b).unwrap();
        assert!(m.ids_in_position(&[1, 1]).is_empty());
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn add_agent_rejects_out_of_bounds_pos() {
        let mut m = grid_model();
        assert!(m.add_agent(Walker::at([9, 0])).is_err());
        assert_eq!(m.len(), 0, "failed insert leaves the model unchanged");
    }

    #[test]
    fn remove_all_where_filters() {
        let mut m = grid_model();
        for i in 0..5 {
            let mut w = Walker::at([i, 0]);
            w.wealth = i as i64;
            m.add_agent(w).unwrap();
        }
        m.remove_all_where(|a| a.wealth >= 3);
        assert_eq!(m.len(), 3);
        m.remove_all();
        assert!(m.is_empty());
    }

    #[test]
    fn nospace_model_ignores_positions() {
        let mut m: Model<Bare, NoSpace, ()> = Model::new(NoSpace, (), 0);
        let id = m
            .add_agent(Bare { id: AgentId::EMPTY, value: 3 })
            .unwrap();
        assert_eq!(m.agent(id).unwrap().value, 3);
        m.remove_agent(id).unwrap();
        assert!(m.is_empty());
    }
}

// ── Determinism ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod determinism {
    use super::*;

    fn run(seed: u64) -> Vec<([i32; 2], i64)> {
        let mut m = Model::new(GridSpace::new([8, 8], true, Metric::Chebyshev), (), seed);
        for _ in 0..20 {
            let pos = m.random_position();
            m.add_agent(Walker::at(pos)).unwrap();
        }
        for _ in 0..50 {
            if let Some(id) = m.random_agent() {
                let pos = m.random_position();
                m.move_agent(id, pos).unwrap();
                m.agent_mut(id).unwrap().wealth += 1;
            }
        }
        let mut out: Vec<_> = m.agents().iter().map(|a| (a.pos, a.wealth)).collect();
        out.sort_unstable();
        out
    }

    #[test]
    fn identical_seed_identical_state() {
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn different_seed_diverges() {
        assert_ne!(run(99), run(100));
    }
}

// ── Grid queries through the model ────────────────────────────────────────────

#[cfg(test)]
mod grid_queries {
    use super::*;

    #[test]
    fn nearby_ids_of_excludes_self_keeps_colocated() {
        let mut m = grid_model();
        let a = m.add_agent(Walker::at([2, 2])).unwrap();
        let b = m.add_agent(Walker::at([2, 2])).unwrap();
        let c = m.add_agent(Walker::at([3, 2])).unwrap();
        let _far = m.add_agent(Walker::at([0, 0])).unwrap();
        let mut ids = m.nearby_ids_of(a, 1.0).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![b, c]);
    }

    #[test]
    fn distances_honor_periodicity() {
        let m: Model<Walker, GridSpace<2>, ()> =
            Model::new(GridSpace::new([10, 10], true, Metric::Chebyshev), (), 0);
        assert_eq!(m.manhattan_distance(&[9, 0], &[0, 0]), 1.0);
        assert_eq!(m.euclidean_distance(&[9, 0], &[0, 0]), 1.0);
    }

    #[test]
    fn empty_position_is_first_in_canonical_order() {
        let mut m = grid_model();
        m.add_agent(Walker::at([0, 0])).unwrap();
        assert_eq!(m.empty_position().unwrap(), [0, 1]);
    }
}

// ── Single-occupancy through the model ────────────────────────────────────────

#[cfg(test)]
mod single {
    use super::*;
    use abm_core::AbmError;
    use abm_space::GridSpaceSingle;

    fn single_model(n: usize) -> Model<Walker, GridSpaceSingle<2>, ()> {
        Model::new(GridSpaceSingle::new([n, n], false, Metric::Chebyshev), (), 7)
    }

    #[test]
    fn add_agent_single_fills_then_fails() {
        let mut m = single_model(2);
        for _ in 0..4 {
            m.add_agent_single(Walker::at([0, 0])).unwrap();
        }
        match m.add_agent_single(Walker::at([0, 0])) {
            Err(AbmError::NoEmptyPosition) => {}
            other => panic!("expected NoEmptyPosition, got {other:?}"),
        }
    }

    #[test]
    fn move_into_occupied_cell_fails_cleanly() {
        let mut m = single_model(3);
        let a = m.add_agent(Walker::at([0, 0])).unwrap();
        let b = m.add_agent(Walker::at([1, 1])).unwrap();
        assert!(m.move_agent(a, [1, 1]).is_err());
        // Invariant intact on both sides.
        assert_eq!(m.agent(a).unwrap().pos, [0, 0]);
        assert_eq!(m.id_at(&[0, 0]), a);
        assert_eq!(m.id_at(&[1, 1]), b);
    }

    #[test]
    fn swap_agents_exchanges_positions() {
        let mut m = single_model(3);
        let a = m.add_agent(Walker::at([0, 0])).unwrap();
        let b = m.add_agent(Walker::at([2, 2])).unwrap();
        m.swap_agents(a, b).unwrap();
        assert_eq!(m.agent(a).unwrap().pos, [2, 2]);
        assert_eq!(m.agent(b).unwrap().pos, [0, 0]);
        assert_eq!(m.id_at(&[0, 0]), b);
    }
}

// ── Continuous-space operations ───────────────────────────────────────────────

#[cfg(test)]
mod continuous {
    use super::*;
    use crate::agent::Velocity;
    use crate::continuous_ops::PairKind;
    use abm_space::ContinuousSpace;

    #[derive(Clone, Debug)]
    struct Mote {
        id:   AgentId,
        pos:  [f64; 2],
        vel:  [f64; 2],
        mass: f64,
    }

    impl Mote {
        fn at(pos: [f64; 2]) -> Self {
            Self { id: AgentId::EMPTY, pos, vel: [0.0; 2], mass: 1.0 }
        }
    }

    impl Agent for Mote {
        type Pos = [f64; 2];
        fn id(&self) -> AgentId {
            self.id
        }
        fn set_id(&mut self, id: AgentId) {
            self.id = id;
        }
        fn pos(&self) -> [f64; 2] {
            self.pos
        }
        fn set_pos(&mut self, pos: [f64; 2]) {
            self.pos = pos;
        }
    }

    impl Velocity<2> for Mote {
        fn vel(&self) -> [f64; 2] {
            self.vel
        }
        fn set_vel(&mut self, vel: [f64; 2]) {
            self.vel = vel;
        }
    }

    fn unit_model(periodic: bool) -> Model<Mote, ContinuousSpace<2>, ()> {
        Model::new(
            ContinuousSpace::new([1.0, 1.0], 0.1, periodic).unwrap(),
            (),
            21,
        )
    }

    #[test]
    fn move_by_velocity_wraps() {
        let mut m = unit_model(true);
        let mut mote = Mote::at([0.95, 0.5]);
        mote.vel = [0.1, 0.0];
        let id = m.add_agent(mote).unwrap();
        m.move_by_velocity(id, 1.0).unwrap();
        let pos = m.agent(id).unwrap().pos;
        assert!((pos[0] - 0.05).abs() < 1e-12);
    }

    #[test]
    fn bounded_move_out_of_range_errors() {
        let mut m = unit_model(false);
        let mut mote = Mote::at([0.95, 0.5]);
        mote.vel = [0.1, 0.0];
        let id = m.add_agent(mote).unwrap();
        assert!(m.move_by_velocity(id, 1.0).is_err());
        // Position unchanged on failure.
        assert_eq!(m.agent(id).unwrap().pos, [0.95, 0.5]);
    }

    #[test]
    fn exact_nearby_is_subset_of_inexact() {
        let mut m = unit_model(true);
        for _ in 0..100 {
            let pos = m.random_position();
            m.add_agent(Mote::at(pos)).unwrap();
        }
        let center = [0.5, 0.5];
        let exact = m.nearby_ids(&center, 0.2);
        let inexact = m.nearby_ids_inexact(&center, 0.2);
        for id in &exact {
            assert!(inexact.contains(id));
        }
        for id in &exact {
            let d = m
                .space()
                .euclidean_distance(&center, &m.agent(*id).unwrap().pos);
            assert!(d <= 0.2);
        }
    }

    #[test]
    fn random_walk_preserves_speed() {
        let mut m = unit_model(true);
        let id = m.add_agent(Mote::at([0.5, 0.5])).unwrap();
        m.random_walk(id, 0.05).unwrap();
        let vel = m.agent(id).unwrap().vel;
        let speed = (vel[0] * vel[0] + vel[1] * vel[1]).sqrt();
        assert!((speed - 0.05).abs() < 1e-12);
    }

    #[test]
    fn pairs_all_within_radius_only() {
        let mut m = unit_model(true);
        let a = m.add_agent(Mote::at([0.5, 0.5])).unwrap();
        let b = m.add_agent(Mote::at([0.6, 0.5])).unwrap();
        let _c = m.add_agent(Mote::at([0.9, 0.1])).unwrap();
        let pairs = m.interacting_pairs(0.12, PairKind::All);
        assert_eq!(pairs, vec![(a, b)]);
    }

    #[test]
    fn pairs_respect_periodic_seam_distances() {
        // Mirror-pair regression: two agents straddling the seam are 0.15
        // apart through the wrap, not 0.85.
        let mut m = unit_model(true);
        let a = m.add_agent(Mote::at([0.10, 0.5])).unwrap();
        let b = m.add_agent(Mote::at([0.95, 0.5])).unwrap();
        assert!(m.interacting_pairs(0.14, PairKind::All).is_empty());
        assert_eq!(m.interacting_pairs(0.16, PairKind::All), vec![(a, b)]);
    }

    #[test]
    fn pairs_nearest_each_agent_once() {
        let mut m = unit_model(true);
        // A line of three agents 0.1 apart: greedy-nearest pairs the first
        // two and leaves the third alone.
        let a = m.add_agent(Mote::at([0.3, 0.5])).unwrap();
        let b = m.add_agent(Mote::at([0.4, 0.5])).unwrap();
        let c = m.add_agent(Mote::at([0.5, 0.5])).unwrap();
        let pairs = m.interacting_pairs(0.15, PairKind::Nearest);
        assert_eq!(pairs, vec![(a, b)]);
        let _ = c;
    }

    #[test]
    fn elastic_collision_conserves_momentum() {
        let mut m = unit_model(true);
        let mut x = Mote::at([0.4, 0.5]);
        x.vel = [0.1, 0.0];
        x.mass = 2.0;
        let mut y = Mote::at([0.5, 0.5]);
        y.vel = [-0.1, 0.0];
        y.mass = 3.0;
        let a = m.add_agent(x).unwrap();
        let b = m.add_agent(y).unwrap();

        let before: [f64; 2] = {
            let (pa, pb) = (m.agent(a).unwrap(), m.agent(b).unwrap());
            [
                pa.mass * pa.vel[0] + pb.mass * pb.vel[0],
                pa.mass * pa.vel[1] + pb.mass * pb.vel[1],
            ]
        };
        assert!(m.elastic_collision(a, b, |mote| mote.mass).unwrap());
        let after: [f64; 2] = {
            let (pa, pb) = (m.agent(a).unwrap(), m.agent(b).unwrap());
            [
                pa.mass * pa.vel[0] + pb.mass * pb.vel[0],
                pa.mass * pa.vel[1] + pb.mass * pb.vel[1],
            ]
        };
        for d in 0..2 {
            assert!((before[d] - after[d]).abs() < 1e-10);
        }
        // Second call: now separating, reports no collision.
        assert!(!m.elastic_collision(a, b, |mote| mote.mass).unwrap());
    }
}

// ── Graph operations ──────────────────────────────────────────────────────────

#[cfg(test)]
mod graph {
    use super::*;
    use abm_core::NodeId;
    use abm_space::{GraphSpace, NeighborKind};

    #[derive(Clone, Debug)]
    struct Node {
        id:  AgentId,
        pos: NodeId,
    }

    impl Agent for Node {
        type Pos = NodeId;
        fn id(&self) -> AgentId {
            self.id
        }
        fn set_id(&mut self, id: AgentId) {
            self.id = id;
        }
        fn pos(&self) -> NodeId {
            self.pos
        }
        fn set_pos(&mut self, pos: NodeId) {
            self.pos = pos;
        }
    }

    fn on(v: u32) -> Node {
        Node { id: AgentId::EMPTY, pos: NodeId(v) }
    }

    #[test]
    fn nearby_ids_of_excludes_self_on_path_graph() {
        // Path 0—1—2—3—4, agents on 0, 1, 2.
        let mut m: Model<Node, GraphSpace, ()> = Model::new(GraphSpace::path(5), (), 0);
        let a = m.add_agent(on(0)).unwrap();
        let b = m.add_agent(on(1)).unwrap();
        let c = m.add_agent(on(2)).unwrap();

        // Query by vertex: everyone within one hop of vertex 1.
        let mut ids = m.nearby_ids(NodeId(1), 1, NeighborKind::Default);
        ids.sort_unstable();
        assert_eq!(ids, vec![a, b, c]);

        // Query by agent: the agent itself is excluded.
        let mut ids = m.nearby_ids_of(b, 1, NeighborKind::Default).unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![a, c]);
    }

    #[test]
    fn remove_vertex_evicts_and_remaps() {
        let mut m: Model<Node, GraphSpace, ()> = Model::new(GraphSpace::path(4), (), 0);
        let _a = m.add_agent(on(1)).unwrap();
        let b = m.add_agent(on(3)).unwrap();

        let evicted = m.remove_vertex(NodeId(1)).unwrap();
        assert_eq!(evicted.len(), 1, "agent on removed vertex evicted");
        assert_eq!(m.len(), 1);
        // Vertex 3 was renumbered to 1; agent b's pos follows.
        assert_eq!(m.agent(b).unwrap().pos, NodeId(1));
        assert_eq!(m.ids_in_position(&NodeId(1)), &[b]);
    }

    #[test]
    fn runtime_edges_change_neighborhoods() {
        let mut m: Model<Node, GraphSpace, ()> = Model::new(GraphSpace::new(3), (), 0);
        let a = m.add_agent(on(0)).unwrap();
        let _b = m.add_agent(on(2)).unwrap();
        assert!(m.nearby_ids_of(a, 1, NeighborKind::Default).unwrap().is_empty());
        m.add_edge(NodeId(0), NodeId(2)).unwrap();
        assert_eq!(m.nearby_ids_of(a, 1, NeighborKind::Default).unwrap().len(), 1);
        m.remove_edge(NodeId(0), NodeId(2)).unwrap();
        assert!(m.nearby_ids_of(a, 1, NeighborKind::Default).unwrap().is_empty());
    }
}

// ── OSM operations ────────────────────────────────────────────────────────────

#[cfg(test)]
mod osm {
    use super::*;
    use abm_core::NodeId;
    use abm_space::{OsmNetworkBuilder, OsmPos, OsmSpace};

    #[derive(Clone, Debug)]
    struct Car {
        id:  AgentId,
        pos: OsmPos,
    }

    impl Agent for Car {
        type Pos = OsmPos;
        fn id(&self) -> AgentId {
            self.id
        }
        fn set_id(&mut self, id: AgentId) {
            self.id = id;
        }
        fn pos(&self) -> OsmPos {
            self.pos
        }
        fn set_pos(&mut self, pos: OsmPos) {
            self.pos = pos;
        }
    }

    /// 0 — 1 — 2 line, 100 m per segment.
    fn line_model() -> Model<Car, OsmSpace, ()> {
        let mut b = OsmNetworkBuilder::new();
        let n0 = b.add_node([0.0, 0.0]);
        let n1 = b.add_node([0.001, 0.0]);
        let n2 = b.add_node([0.002, 0.0]);
        b.add_road(n0, n1, 100.0, 10_000);
        b.add_road(n1, n2, 100.0, 10_000);
        Model::new(OsmSpace::new(b.build()), (), 0)
    }

    #[test]
    fn drive_to_destination_updates_position_and_index() {
        let mut m = line_model();
        let id = m
            .add_agent(Car { id: AgentId::EMPTY, pos: OsmPos::at_node(NodeId(0)) })
            .unwrap();
        m.plan_route(id, OsmPos::at_node(NodeId(2)), false).unwrap();
        assert!(!m.is_stationary(id));

        assert!(!m.move_along_route(id, 150.0).unwrap());
        let mid = m.agent(id).unwrap().pos;
        assert_eq!((mid.from, mid.to), (NodeId(1), NodeId(2)));
        assert!((mid.offset - 50.0).abs() < 1e-3);

        assert!(m.move_along_route(id, 50.0).unwrap());
        assert_eq!(m.agent(id).unwrap().pos, OsmPos::at_node(NodeId(2)));
        assert!(m.is_stationary(id));
    }

    #[test]
    fn removing_agent_drops_its_route() {
        let mut m = line_model();
        let id = m
            .add_agent(Car { id: AgentId::EMPTY, pos: OsmPos::at_node(NodeId(0)) })
            .unwrap();
        m.plan_route(id, OsmPos::at_node(NodeId(2)), false).unwrap();
        m.remove_agent(id).unwrap();
        assert!(m.is_stationary(id));
    }

    #[test]
    fn nearby_ids_uses_road_distance() {
        let mut m = line_model();
        let here = m
            .add_agent(Car { id: AgentId::EMPTY, pos: OsmPos::at_node(NodeId(0)) })
            .unwrap();
        let near = m
            .add_agent(Car {
                id:  AgentId::EMPTY,
                pos: OsmPos { from: NodeId(0), to: NodeId(1), offset: 40.0 },
            })
            .unwrap();
        let far = m
            .add_agent(Car {
                id:  AgentId::EMPTY,
                pos: OsmPos { from: NodeId(1), to: NodeId(2), offset: 90.0 },
            })
            .unwrap();

        let pos = m.agent(here).unwrap().pos;
        let mut ids = m.nearby_ids(&pos, 50.0);
        ids.sort_unstable();
        assert_eq!(ids, vec![here, near]);

        let ids = m.nearby_ids_of(here, 200.0).unwrap();
        assert!(ids.contains(&near) && ids.contains(&far));
    }

    #[test]
    fn random_road_position_valid() {
        let mut m = line_model();
        for _ in 0..20 {
            let pos = m.random_road_position().unwrap();
            let canon = abm_space::Space::canonicalize(m.space(), &pos);
            assert!(canon.is_ok());
        }
    }
}
