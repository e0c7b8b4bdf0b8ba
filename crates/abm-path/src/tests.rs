//! Unit tests for abm-path.

use abm_core::{AgentId, ModelRng};
use abm_model::{Agent, Model};
use abm_space::{ContinuousSpace, GridSpace, Metric};

use crate::metric::{CostMetric, DirectDistance, MaxDistance, PenaltyMap};
use crate::pathfinder::{move_along_route, Neighborhood, Pathfinder, RouteCondition};
use crate::ContinuousPathfinder;

// ── Fixtures ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Bot {
    id:  AgentId,
    pos: [i32; 2],
}

impl Agent for Bot {
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

/// 7×6 arena with a wall spanning the column `x = 3` except the top cell
/// `[3, 5]`.  Start `[0, 0]`, goal `[6, 0]`; every crossing is forced
/// through `[3, 5]`.
///
/// Hand-checked optima:
/// - Moore, bounded:       10 moves (5 to the gap, 5 down to the goal).
/// - Von-Neumann:          16 moves (8 + 8, orthogonal only).
/// - Moore, y-periodic:     6 moves (the y-wrap shrinks each leg to 3).
/// - Moore, fully periodic: 1 move (the x-wrap makes the goal adjacent).
fn walled_map() -> Vec<bool> {
    let mut walk = vec![true; 7 * 6];
    for y in 0..5 {
        walk[3 * 6 + y] = false; // flat index = x·6 + y
    }
    walk
}

fn walled_finder_periodicity(neighborhood: Neighborhood, periodic: [bool; 2]) -> Pathfinder<2> {
    Pathfinder::new(
        [7, 6],
        periodic,
        walled_map(),
        CostMetric::Direct(DirectDistance::default()),
        neighborhood,
        0.0,
    )
    .unwrap()
}

fn walled_finder(neighborhood: Neighborhood, periodic: bool) -> Pathfinder<2> {
    walled_finder_periodicity(neighborhood, [periodic; 2])
}

fn route_len(pf: &Pathfinder<2>, id: AgentId) -> usize {
    pf.route(id).map(|r| r.count()).unwrap_or(0)
}

// ── Metric costs ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod metrics {
    use super::*;

    #[test]
    fn direct_defaults_follow_sqrt_rule() {
        assert_eq!(DirectDistance::<2>::default().direction_costs, [10, 14]);
        assert_eq!(DirectDistance::<3>::default().direction_costs, [10, 14, 17]);
    }

    #[test]
    fn direct_delta_costs_2d() {
        let m: CostMetric<2> = CostMetric::Direct(DirectDistance::default());
        assert_eq!(m.delta_cost(&[1, 0]), 10, "orthogonal step");
        assert_eq!(m.delta_cost(&[1, 1]), 14, "diagonal step");
        assert_eq!(m.delta_cost(&[2, 1]), 24, "one diagonal + one straight");
        assert_eq!(m.delta_cost(&[-2, 1]), 24, "sign-independent");
        assert_eq!(m.delta_cost(&[3, 3]), 42);
        assert_eq!(m.delta_cost(&[0, 0]), 0);
    }

    #[test]
    fn chebyshev_counts_moves() {
        let m: CostMetric<2> = CostMetric::Chebyshev(MaxDistance);
        assert_eq!(m.delta_cost(&[3, 1]), 3);
        assert_eq!(m.delta_cost(&[0, 4]), 4);
    }

    #[test]
    fn penalty_adds_absolute_height_difference() {
        // 2×1 map with heights 5 and 12.
        let m: CostMetric<1> = CostMetric::Penalty(PenaltyMap::new(
            vec![5, 12],
            CostMetric::Direct(DirectDistance::new([10])),
        ));
        assert_eq!(m.move_cost(0, 1, &[1]), 10 + 7);
        assert_eq!(m.move_cost(1, 0, &[-1]), 10 + 7);
        // Heuristic ignores the penalty layer.
        assert_eq!(m.delta_cost(&[1]), 10);
    }
}

// ── Construction validation ───────────────────────────────────────────────────

#[cfg(test)]
mod config {
    use super::*;

    #[test]
    fn walkmap_shape_mismatch_rejected() {
        let r = Pathfinder::<2>::new(
            [4, 4],
            [false; 2],
            vec![true; 15],
            CostMetric::default(),
            Neighborhood::Moore,
            0.0,
        );
        assert!(r.is_err());
    }

    #[test]
    fn penalty_shape_mismatch_rejected() {
        let metric = CostMetric::Penalty(PenaltyMap::new(vec![0; 3], CostMetric::default()));
        let r = Pathfinder::<2>::new(
            [4, 4],
            [false; 2],
            vec![true; 16],
            metric,
            Neighborhood::Moore,
            0.0,
        );
        assert!(r.is_err());
    }

    #[test]
    fn chebyshev_with_von_neumann_rejected() {
        let r = Pathfinder::<2>::new(
            [4, 4],
            [false; 2],
            vec![true; 16],
            CostMetric::Chebyshev(MaxDistance),
            Neighborhood::VonNeumann,
            0.0,
        );
        assert!(r.is_err());
    }

    #[test]
    fn negative_epsilon_rejected() {
        let r = Pathfinder::<2>::new(
            [4, 4],
            [false; 2],
            vec![true; 16],
            CostMetric::default(),
            Neighborhood::Moore,
            -0.5,
        );
        assert!(r.is_err());
    }
}

// ── A* planning ───────────────────────────────────────────────────────────────

#[cfg(test)]
mod planning {
    use super::*;

    #[test]
    fn moore_route_through_the_gap() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let id = AgentId(1);
        let route: Vec<[i32; 2]> = pf
            .plan_route(id, &[0, 0], &[6, 0])
            .unwrap()
            .copied()
            .collect();
        assert_eq!(route.len(), 10, "optimal Moore length");
        assert!(route.contains(&[3, 5]), "forced through the gap: {route:?}");
        assert_eq!(*route.last().unwrap(), [6, 0], "route ends at the goal");
        // Consecutive waypoints are Moore-adjacent and walkable.
        let mut prev = [0, 0];
        for wp in &route {
            assert!((wp[0] - prev[0]).abs() <= 1 && (wp[1] - prev[1]).abs() <= 1);
            assert!(pf.is_walkable(wp));
            prev = *wp;
        }
    }

    #[test]
    fn von_neumann_route_is_longer() {
        let mut pf = walled_finder(Neighborhood::VonNeumann, false);
        pf.plan_route(AgentId(1), &[0, 0], &[6, 0]).unwrap();
        assert_eq!(route_len(&pf, AgentId(1)), 16, "orthogonal-only optimum");
    }

    #[test]
    fn periodic_wrap_shortens_the_route() {
        // y wraps only: both legs shrink to Chebyshev 3 through the gap.
        let mut pf = walled_finder_periodicity(Neighborhood::Moore, [false, true]);
        pf.plan_route(AgentId(1), &[0, 0], &[6, 0]).unwrap();
        assert_eq!(route_len(&pf, AgentId(1)), 6, "y-wrap optimum");

        // Both dimensions wrap: the x seam makes the goal one step away.
        let mut pf = walled_finder(Neighborhood::Moore, true);
        pf.plan_route(AgentId(1), &[0, 0], &[6, 0]).unwrap();
        assert_eq!(route_len(&pf, AgentId(1)), 1, "x-wrap optimum");
    }

    #[test]
    fn unreachable_goal_is_no_path() {
        // Close the gap: the right half becomes unreachable.
        let mut walk = walled_map();
        walk[3 * 6 + 5] = false;
        let mut pf = Pathfinder::<2>::new(
            [7, 6],
            [false; 2],
            walk,
            CostMetric::default(),
            Neighborhood::Moore,
            0.0,
        )
        .unwrap();
        assert!(pf.plan_route(AgentId(1), &[0, 0], &[6, 0]).is_err());
        assert!(pf.is_stationary(AgentId(1)));
    }

    #[test]
    fn replanning_overwrites_previous_route() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let id = AgentId(1);
        pf.plan_route(id, &[0, 0], &[6, 0]).unwrap();
        pf.plan_route(id, &[0, 0], &[2, 0]).unwrap();
        assert_eq!(route_len(&pf, id), 2);
    }

    #[test]
    fn inflated_epsilon_still_reaches_goal() {
        let mut pf = Pathfinder::<2>::new(
            [7, 6],
            [false; 2],
            walled_map(),
            CostMetric::default(),
            Neighborhood::Moore,
            1.5,
        )
        .unwrap();
        let route: Vec<[i32; 2]> = pf
            .plan_route(AgentId(1), &[0, 0], &[6, 0])
            .unwrap()
            .copied()
            .collect();
        assert_eq!(*route.last().unwrap(), [6, 0]);
        assert!(route.len() >= 10, "never shorter than the true optimum");
    }

    #[test]
    fn plan_best_route_picks_by_cost() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let id = AgentId(1);
        let near = [2, 0];
        let far = [2, 4];
        let dest = pf
            .plan_best_route(id, &[0, 0], [near, far], RouteCondition::Shortest)
            .unwrap();
        assert_eq!(dest, near);
        let dest = pf
            .plan_best_route(id, &[0, 0], [near, far], RouteCondition::Longest)
            .unwrap();
        assert_eq!(dest, far);
    }

    #[test]
    fn plan_best_route_skips_unreachable_candidates() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        // [3, 0] is inside the wall.
        let dest = pf
            .plan_best_route(AgentId(1), &[0, 0], [[3, 0], [1, 1]], RouteCondition::Shortest)
            .unwrap();
        assert_eq!(dest, [1, 1]);
    }

    #[test]
    fn plan_random_route_lands_on_walkable_reachable_cell() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let mut rng = ModelRng::seeded(8);
        let dest = pf
            .plan_random_route(AgentId(1), &[0, 0], 50, &mut rng)
            .unwrap();
        assert!(pf.is_walkable(&dest));
        assert!(!pf.is_stationary(AgentId(1)));
    }
}

// ── Walkable queries ──────────────────────────────────────────────────────────

#[cfg(test)]
mod walkable {
    use super::*;

    #[test]
    fn nearby_walkable_filters_walls() {
        let pf = walled_finder(Neighborhood::Moore, false);
        let near = pf.nearby_walkable(&[2, 1], 1.0);
        // Moore ring of [2,1] minus the wall cells [3,0], [3,1], [3,2].
        assert_eq!(near.len(), 5);
        assert!(near.iter().all(|p| p[0] != 3));
    }

    #[test]
    fn random_walkable_never_in_wall() {
        let pf = walled_finder(Neighborhood::Moore, false);
        let mut rng = ModelRng::seeded(4);
        for _ in 0..100 {
            let p = pf.random_walkable(&mut rng).unwrap();
            assert!(pf.is_walkable(&p));
        }
    }

    #[test]
    fn set_walkable_updates_queries() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        assert!(!pf.is_walkable(&[3, 0]));
        pf.set_walkable(&[3, 0], true);
        assert!(pf.is_walkable(&[3, 0]));
    }

    #[test]
    fn penaltymap_mutable_in_place() {
        let metric = CostMetric::Penalty(PenaltyMap::new(vec![0; 16], CostMetric::default()));
        let mut pf = Pathfinder::<2>::new(
            [4, 4],
            [false; 2],
            vec![true; 16],
            metric,
            Neighborhood::Moore,
            0.0,
        )
        .unwrap();
        pf.penaltymap_mut().unwrap()[5] = 99;
        assert_eq!(pf.penaltymap().unwrap()[5], 99);
    }
}

// ── Movement through the model ────────────────────────────────────────────────

#[cfg(test)]
mod movement {
    use super::*;

    #[test]
    fn walking_the_route_ends_exactly_at_goal() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let mut model: Model<Bot, GridSpace<2>, ()> =
            Model::new(GridSpace::new([7, 6], false, Metric::Chebyshev), (), 0);
        let id = model
            .add_agent(Bot { id: AgentId::EMPTY, pos: [0, 0] })
            .unwrap();
        pf.plan_route(id, &[0, 0], &[6, 0]).unwrap();

        let mut moves = 0;
        while move_along_route(&mut pf, &mut model, id).unwrap() {
            moves += 1;
            assert!(moves <= 10, "route should finish in ten moves");
        }
        assert_eq!(model.agent(id).unwrap().pos, [6, 0]);
        assert!(pf.is_stationary(id));
        // Stationary agent: further calls are no-ops.
        assert!(!move_along_route(&mut pf, &mut model, id).unwrap());
    }

    #[test]
    fn removing_route_cancels_movement() {
        let mut pf = walled_finder(Neighborhood::Moore, false);
        let mut model: Model<Bot, GridSpace<2>, ()> =
            Model::new(GridSpace::new([7, 6], false, Metric::Chebyshev), (), 0);
        let id = model
            .add_agent(Bot { id: AgentId::EMPTY, pos: [0, 0] })
            .unwrap();
        pf.plan_route(id, &[0, 0], &[6, 0]).unwrap();
        pf.remove_route(id);
        assert!(pf.is_stationary(id));
        assert!(!move_along_route(&mut pf, &mut model, id).unwrap());
        assert_eq!(model.agent(id).unwrap().pos, [0, 0]);
    }
}

// ── Continuous pathfinding ────────────────────────────────────────────────────

#[cfg(test)]
mod continuous {
    use super::*;

    #[derive(Clone, Debug)]
    struct Mote {
        id:  AgentId,
        pos: [f64; 2],
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

    fn open_model() -> Model<Mote, ContinuousSpace<2>, ()> {
        Model::new(
            ContinuousSpace::new([1.0, 1.0], 0.1, false).unwrap(),
            (),
            13,
        )
    }

    #[test]
    fn reaches_exact_destination() {
        let mut model = open_model();
        let id = model
            .add_agent(Mote { id: AgentId::EMPTY, pos: [0.05, 0.05] })
            .unwrap();
        let mut pf = ContinuousPathfinder::open(model.space(), CostMetric::default()).unwrap();
        let dest = [0.9, 0.82];
        pf.plan_route(&model, id, dest).unwrap();
        assert!(!pf.is_stationary(id));

        let mut steps = 0;
        loop {
            let done = pf.move_along_route(&mut model, id, 0.2, 1.0).unwrap();
            steps += 1;
            assert!(steps < 100, "must terminate");
            if done {
                break;
            }
        }
        let pos = model.agent(id).unwrap().pos;
        assert_eq!(pos, dest, "arrival is exact, not cell-center");
        assert!(pf.is_stationary(id));
    }

    #[test]
    fn waypoint_skipping_yields_near_straight_path() {
        // Open space: one generous move should reach the destination
        // directly instead of traversing every cell center.
        let mut model = open_model();
        let id = model
            .add_agent(Mote { id: AgentId::EMPTY, pos: [0.05, 0.05] })
            .unwrap();
        let mut pf = ContinuousPathfinder::open(model.space(), CostMetric::default()).unwrap();
        let dest = [0.95, 0.95];
        pf.plan_route(&model, id, dest).unwrap();
        let done = pf.move_along_route(&mut model, id, 1.5, 1.0).unwrap();
        assert!(done, "1.5 > diagonal length 1.27 when corners are cut");
    }

    #[test]
    fn stationary_move_is_noop() {
        let mut model = open_model();
        let id = model
            .add_agent(Mote { id: AgentId::EMPTY, pos: [0.5, 0.5] })
            .unwrap();
        let mut pf = ContinuousPathfinder::open(model.space(), CostMetric::default()).unwrap();
        assert!(!pf.move_along_route(&mut model, id, 1.0, 1.0).unwrap());
        assert_eq!(model.agent(id).unwrap().pos, [0.5, 0.5]);
    }
}
