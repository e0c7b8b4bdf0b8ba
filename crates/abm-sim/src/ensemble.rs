//! Ensemble runs: many independent models, one pair of unioned frames.

use abm_core::AbmResult;
use abm_collect::{Collector, Frame, Value};
use abm_model::Agent;

use crate::behavior::Behavior;
use crate::sim::Simulation;

/// Run every simulation for `n` steps and union the collected frames,
/// annotating rows with a 1-based `ensemble` column.
///
/// Each member is a closed universe: it owns its model, RNG, and collector,
/// so members may run on separate threads with no shared state.  With the
/// `parallel` Cargo feature the members run on Rayon's thread pool;
/// otherwise sequentially.  Results are identical either way — the union
/// preserves member order.
pub fn ensemble_run<A, S, P, B>(
    sims:           Vec<Simulation<A, S, P, B>>,
    n:              u64,
    make_collector: impl Fn(usize) -> Collector<A, S, P> + Sync,
) -> AbmResult<(Frame, Frame)>
where
    A: Agent,
    S: Send + abm_space::Space<Pos = A::Pos>,
    P: Send,
    B: Behavior<A, S, P>,
{
    let results = run_members(sims, n, &make_collector)?;
    union(results)
}

#[cfg(not(feature = "parallel"))]
fn run_members<A, S, P, B>(
    sims:           Vec<Simulation<A, S, P, B>>,
    n:              u64,
    make_collector: &(impl Fn(usize) -> Collector<A, S, P> + Sync),
) -> AbmResult<Vec<(Frame, Frame)>>
where
    A: Agent,
    S: Send + abm_space::Space<Pos = A::Pos>,
    P: Send,
    B: Behavior<A, S, P>,
{
    sims.into_iter()
        .enumerate()
        .map(|(i, mut sim)| {
            let mut collector = make_collector(i);
            sim.run(n, &mut collector)?;
            Ok(collector.into_frames())
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn run_members<A, S, P, B>(
    sims:           Vec<Simulation<A, S, P, B>>,
    n:              u64,
    make_collector: &(impl Fn(usize) -> Collector<A, S, P> + Sync),
) -> AbmResult<Vec<(Frame, Frame)>>
where
    A: Agent,
    S: Send + abm_space::Space<Pos = A::Pos>,
    P: Send,
    B: Behavior<A, S, P>,
{
    use rayon::prelude::*;

    sims.into_par_iter()
        .enumerate()
        .map(|(i, mut sim)| {
            let mut collector = make_collector(i);
            sim.run(n, &mut collector)?;
            Ok(collector.into_frames())
        })
        .collect()
}

fn union(results: Vec<(Frame, Frame)>) -> AbmResult<(Frame, Frame)> {
    let mut agent_union: Option<Frame> = None;
    let mut model_union: Option<Frame> = None;
    for (i, (mut agent, mut model)) in results.into_iter().enumerate() {
        let index = Value::Int(i as i64 + 1);
        agent.prepend_const_column("ensemble", index.clone());
        model.prepend_const_column("ensemble", index);
        match agent_union.as_mut() {
            None => agent_union = Some(agent),
            Some(u) => u.vstack(agent).map_err(abm_core::AbmError::from)?,
        }
        match model_union.as_mut() {
            None => model_union = Some(model),
            Some(u) => u.vstack(model).map_err(abm_core::AbmError::from)?,
        }
    }
    Ok((
        agent_union.unwrap_or_default(),
        model_union.unwrap_or_default(),
    ))
}
