//! Parameter scans: the Cartesian product of parameter axes, one model per
//! combination, one pair of annotated, unioned frames.

use abm_core::AbmResult;
use abm_collect::{Collector, Frame, Value};
use abm_model::Agent;

use crate::behavior::Behavior;
use crate::sim::Simulation;

/// One parameter combination handed to the factory: `(axis name, value)`
/// pairs in axis order.
pub type ParamSet = Vec<(String, Value)>;

/// Run the factory-built simulation for every combination of the axes and
/// union the collected frames.
///
/// Frames gain one leading column per annotated axis.  Single-value axes
/// are constants; they are annotated only when `include_constants` is set.
/// Stop predicates, when needed, belong inside the factory's behavior — the
/// scan itself runs every member for `n` steps.
pub fn param_scan<A, S, P, B>(
    axes:              &[(String, Vec<Value>)],
    factory:           impl Fn(&ParamSet) -> AbmResult<Simulation<A, S, P, B>>,
    n:                 u64,
    make_collector:    impl Fn(&ParamSet) -> Collector<A, S, P>,
    include_constants: bool,
) -> AbmResult<(Frame, Frame)>
where
    A: Agent,
    S: abm_space::Space<Pos = A::Pos>,
    B: Behavior<A, S, P>,
{
    let annotate: Vec<bool> = axes
        .iter()
        .map(|(_, values)| include_constants || values.len() > 1)
        .collect();

    let mut agent_union: Option<Frame> = None;
    let mut model_union: Option<Frame> = None;

    for combo in cartesian(axes) {
        let mut sim = factory(&combo)?;
        let mut collector = make_collector(&combo);
        sim.run(n, &mut collector)?;
        let (mut agent, mut model) = collector.into_frames();

        // Prepend in reverse so the final column order matches axis order.
        for (i, (name, value)) in combo.iter().enumerate().rev() {
            if annotate[i] {
                agent.prepend_const_column(name.clone(), value.clone());
                model.prepend_const_column(name.clone(), value.clone());
            }
        }

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

/// All combinations of the axes, varying the last axis fastest.
fn cartesian(axes: &[(String, Vec<Value>)]) -> Vec<ParamSet> {
    let mut combos: Vec<ParamSet> = vec![Vec::new()];
    for (name, values) in axes {
        let mut next = Vec::with_capacity(combos.len() * values.len().max(1));
        for combo in &combos {
            for value in values {
                let mut extended = combo.clone();
                extended.push((name.clone(), value.clone()));
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}
