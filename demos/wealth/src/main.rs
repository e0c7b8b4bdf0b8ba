//! wealth — smallest example for the rust_abm engine.
//!
//! The classic wealth-exchange (Boltzmann money) model: agents wander a
//! periodic grid and hand one unit of money to a random neighbor.  Total
//! money is conserved; its distribution drifts toward exponential.
//!
//! Writes `agent_data.csv` / `model_data.csv` into `./output` and prints a
//! small end-of-run summary.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use abm_core::{AbmResult, AgentId};
use abm_collect::{Aggregate, AgentSource, Collector, ModelSource};
use abm_model::{Agent, Model};
use abm_output::CsvFrameSink;
use abm_schedule::Randomly;
use abm_sim::{Behavior, Simulation};
use abm_space::{GridSpace, Metric};

// ── Constants ─────────────────────────────────────────────────────────────────

const AGENT_COUNT:   u64 = 100;
const GRID_SIDE:     usize = 20;
const SEED:          u64 = 42;
const STEPS:         u64 = 200;
const START_WEALTH:  i64 = 1;

// ── Agent ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
struct Trader {
    id:     AgentId,
    pos:    [i32; 2],
    wealth: i64,
}

impl Agent for Trader {
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

// ── Behavior ──────────────────────────────────────────────────────────────────

/// Wander one Moore step, then give a unit to a random co-located or
/// adjacent agent (if solvent and anyone is near).
struct WanderAndTrade;

impl Behavior<Trader, GridSpace<2>, ()> for WanderAndTrade {
    fn agent_step(
        &mut self,
        id:    AgentId,
        model: &mut Model<Trader, GridSpace<2>, ()>,
    ) -> AbmResult<()> {
        // Wander.
        let pos = model.agent(id)?.pos();
        let step = [
            pos[0] + model.rng.gen_range(-1..=1),
            pos[1] + model.rng.gen_range(-1..=1),
        ];
        model.move_agent(id, step)?;

        // Trade.
        if model.agent(id)?.wealth == 0 {
            return Ok(());
        }
        let neighbors = model.nearby_ids_of(id, 1.0)?;
        if neighbors.is_empty() {
            return Ok(());
        }
        let partner = neighbors[model.rng.gen_range(0..neighbors.len())];
        model.agent_mut(id)?.wealth -= 1;
        model.agent_mut(partner)?.wealth += 1;
        Ok(())
    }
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let started = Instant::now();

    let mut model = Model::new(GridSpace::new([GRID_SIDE; 2], true, Metric::Chebyshev), (), SEED);
    for _ in 0..AGENT_COUNT {
        let pos = model.random_position();
        model.add_agent(Trader { id: AgentId::EMPTY, pos, wealth: START_WEALTH })?;
    }

    let mut sim = Simulation::new(model, WanderAndTrade).with_scheduler(Randomly);

    let out_dir = Path::new("./output");
    std::fs::create_dir_all(out_dir)?;
    let sink = CsvFrameSink::new(out_dir)?;

    let mut collector = Collector::new(
        vec![
            AgentSource::aggregate("wealth", |a: &Trader| a.wealth.into(), Aggregate::Sum),
            AgentSource::aggregate("wealth", |a: &Trader| a.wealth.into(), Aggregate::Max),
        ],
        vec![ModelSource::new("population", |m| m.len().into())],
    )?
    .offline(Box::new(sink), 50);

    sim.run(STEPS, &mut collector)?;

    let richest = sim
        .model
        .agents()
        .iter()
        .map(|a| a.wealth)
        .max()
        .unwrap_or(0);
    println!(
        "{} agents, {} steps in {:.1?}; richest agent holds {richest} of {} units",
        AGENT_COUNT,
        STEPS,
        started.elapsed(),
        AGENT_COUNT * START_WEALTH as u64,
    );
    println!("frames written to {}", out_dir.display());
    Ok(())
}
