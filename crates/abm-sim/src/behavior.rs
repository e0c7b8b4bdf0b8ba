//! The `Behavior` trait — the per-step extension point for user code.

use abm_core::{AbmResult, AgentId};
use abm_model::{Agent, Model};

/// Per-step model logic.
///
/// `agent_step` is called once per scheduled, still-alive agent;
/// `model_step` once after all agents.  Both receive `&mut Model`, so they
/// may add, move, and remove agents freely — the driver iterates a buffered
/// ID list, not the container.
///
/// Errors propagate out of `step` and abort it; every engine mutation
/// committed before the failing callback remains applied, and the
/// container/space stay mutually consistent (the engine re-establishes the
/// invariant before every callback).
///
/// # Example
///
/// ```rust,ignore
/// struct Drift;
///
/// impl Behavior<Walker, GridSpace<2>, ()> for Drift {
///     fn agent_step(&mut self, id: AgentId, model: &mut Model<Walker, GridSpace<2>, ()>)
///         -> AbmResult<()>
///     {
///         let pos = model.agent(id)?.pos();
///         model.move_agent(id, [pos[0] + 1, pos[1]])
///     }
/// }
/// ```
pub trait Behavior<A: Agent, S, P>: Send {
    fn agent_step(&mut self, id: AgentId, model: &mut Model<A, S, P>) -> AbmResult<()>;

    /// Called once per step after every agent.  Default: nothing.
    fn model_step(&mut self, model: &mut Model<A, S, P>) -> AbmResult<()> {
        let _ = model;
        Ok(())
    }
}

/// A behavior that does nothing; useful for pure `model_step`-driven models
/// and tests.
pub struct NoopBehavior;

impl<A: Agent, S, P> Behavior<A, S, P> for NoopBehavior {
    fn agent_step(&mut self, _id: AgentId, _model: &mut Model<A, S, P>) -> AbmResult<()> {
        Ok(())
    }
}
