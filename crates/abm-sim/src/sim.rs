//! The `Simulation` struct and its step loop.

use abm_core::{AbmResult, AgentId};
use abm_collect::Collector;
use abm_model::{Agent, Model};
use abm_schedule::{Fastest, Scheduler};

use crate::behavior::Behavior;

/// A model plus the pieces that drive it: the behavior, the scheduler, and
/// the reusable schedule buffer.
///
/// The behavior lives beside the model rather than inside it so the step
/// loop can borrow `&mut behavior` and `&mut model` disjointly — the same
/// split the scheduler gets for the container and the RNG.
pub struct Simulation<A: Agent, S, P, B> {
    pub model:    Model<A, S, P>,
    pub behavior: B,
    scheduler: Box<dyn Scheduler<A>>,
    buf:       Vec<AgentId>,
}

impl<A, S, P, B> Simulation<A, S, P, B>
where
    A: Agent,
    S: abm_space::Space<Pos = A::Pos>,
    B: Behavior<A, S, P>,
{
    /// Drive `model` with `behavior`, visiting agents in container order.
    pub fn new(model: Model<A, S, P>, behavior: B) -> Self {
        Self {
            model,
            behavior,
            scheduler: Box::new(Fastest),
            buf: Vec::new(),
        }
    }

    /// Replace the activation ordering.
    pub fn with_scheduler(mut self, scheduler: impl Scheduler<A> + 'static) -> Self {
        self.scheduler = Box::new(scheduler);
        self
    }

    pub fn set_scheduler(&mut self, scheduler: impl Scheduler<A> + 'static) {
        self.scheduler = Box::new(scheduler);
    }

    // ── Stepping ──────────────────────────────────────────────────────────

    /// Run one step: schedule, agent steps, model step, advance the clock.
    pub fn step(&mut self) -> AbmResult<()> {
        {
            let (agents, rng) = self.model.agents_and_rng();
            self.scheduler.order(agents, rng, &mut self.buf);
        }
        for i in 0..self.buf.len() {
            let id = self.buf[i];
            // Removed mid-step → skipped; added mid-step → not in the buffer.
            if self.model.contains(id) {
                self.behavior.agent_step(id, &mut self.model)?;
            }
        }
        self.behavior.model_step(&mut self.model)?;
        self.model.advance_tick();
        Ok(())
    }

    /// Run exactly `n` steps.
    pub fn step_n(&mut self, n: u64) -> AbmResult<()> {
        for _ in 0..n {
            self.step()?;
        }
        Ok(())
    }

    /// Step until `until(model, s)` is true, where `s` counts steps since
    /// this call.  The predicate is evaluated after each step.
    pub fn step_until(
        &mut self,
        mut until: impl FnMut(&Model<A, S, P>, u64) -> bool,
    ) -> AbmResult<u64> {
        let mut s = 0;
        loop {
            self.step()?;
            s += 1;
            if until(&self.model, s) {
                return Ok(s);
            }
        }
    }

    // ── Running with data collection ──────────────────────────────────────

    /// Run `n` steps, collecting before the first step and after every step.
    ///
    /// The collector's sink (if any) is flushed and closed when this
    /// returns, error or not.
    pub fn run(&mut self, n: u64, collector: &mut Collector<A, S, P>) -> AbmResult<()> {
        let result = self.run_inner(n, collector);
        let closed = collector.finish().map_err(Into::into);
        result.and(closed)
    }

    fn run_inner(&mut self, n: u64, collector: &mut Collector<A, S, P>) -> AbmResult<()> {
        collector.collect(&self.model)?;
        for _ in 0..n {
            self.step()?;
            collector.collect(&self.model)?;
        }
        Ok(())
    }

    /// As [`run`](Self::run), but stepping until the predicate fires.
    pub fn run_until(
        &mut self,
        mut until: impl FnMut(&Model<A, S, P>, u64) -> bool,
        collector: &mut Collector<A, S, P>,
    ) -> AbmResult<u64> {
        let result = (|| {
            collector.collect(&self.model)?;
            let mut s = 0;
            loop {
                self.step()?;
                s += 1;
                collector.collect(&self.model)?;
                if until(&self.model, s) {
                    return Ok(s);
                }
            }
        })();
        let closed = collector.finish().map_err(Into::into);
        match result {
            Ok(s) => closed.map(|()| s),
            Err(e) => Err(e),
        }
    }
}
