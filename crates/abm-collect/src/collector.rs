//! The `Collector`: gathers rows per collection tick, optionally streaming
//! them to an offline sink.

use abm_core::AgentId;
use abm_model::{Agent, Model};

use crate::error::{CollectError, CollectResult};
use crate::frame::Frame;
use crate::source::{AgentSource, ModelSource};
use crate::value::Value;
use crate::when::When;

// ── FrameSink ─────────────────────────────────────────────────────────────────

/// Offline back-end receiving frame chunks (implemented by `abm-output`).
///
/// `finish` flushes and closes; it must be idempotent.
pub trait FrameSink: Send {
    fn write_agent_chunk(&mut self, chunk: &Frame) -> CollectResult<()>;
    fn write_model_chunk(&mut self, chunk: &Frame) -> CollectResult<()>;
    fn finish(&mut self) -> CollectResult<()>;
}

// ── Collector ─────────────────────────────────────────────────────────────────

/// Collects `adata`/`mdata` rows on their collection ticks.
///
/// All `adata` entries must agree on shape: either every entry is per-agent
/// (one row per agent per tick) or every entry is aggregated (one row per
/// tick).  Mixing the two would produce columns of different lengths and is
/// rejected at construction.
pub struct Collector<A: Agent, S, P> {
    adata:      Vec<AgentSource<A>>,
    mdata:      Vec<ModelSource<A, S, P>>,
    when:       When<A, S, P>,
    when_model: When<A, S, P>,
    obtainer:   Box<dyn Fn(Value) -> Value + Send>,

    agent_frame: Frame,
    model_frame: Frame,

    sink: Option<SinkState>,
    /// Scratch for the per-tick ID ordering.
    ids: Vec<AgentId>,
}

struct SinkState {
    sink:             Box<dyn FrameSink>,
    writing_interval: u64,
    ticks_since:      u64,
}

impl<A: Agent, S, P> Collector<A, S, P>
where
    S: abm_space::Space<Pos = A::Pos>,
{
    /// Build a collector; fails when `adata` mixes per-agent and aggregated
    /// entries.
    pub fn new(
        adata: Vec<AgentSource<A>>,
        mdata: Vec<ModelSource<A, S, P>>,
    ) -> CollectResult<Self> {
        let aggregated = adata.iter().filter(|s| s.is_aggregated()).count();
        if aggregated != 0 && aggregated != adata.len() {
            return Err(CollectError::Config(
                "adata mixes per-agent and aggregated entries; split into two collectors"
                    .into(),
            ));
        }

        let agent_frame = if aggregated == 0 && !adata.is_empty() {
            let mut names = vec!["time".to_owned(), "id".to_owned()];
            if A::KINDS.len() > 1 {
                names.push("agent_type".to_owned());
            }
            names.extend(adata.iter().map(AgentSource::column_name));
            Frame::new(names)
        } else {
            let mut names = vec!["time".to_owned()];
            names.extend(adata.iter().map(AgentSource::column_name));
            Frame::new(names)
        };

        let mut model_names = vec!["time".to_owned()];
        model_names.extend(mdata.iter().map(|m| m.column_name().to_owned()));
        let model_frame = Frame::new(model_names);

        Ok(Self {
            adata,
            mdata,
            when:       When::Always,
            when_model: When::Always,
            obtainer:   Box::new(|v| v),
            agent_frame,
            model_frame,
            sink: None,
            ids: Vec::new(),
        })
    }

    /// Agent-level collection cadence (default: every step).
    pub fn when(mut self, when: When<A, S, P>) -> Self {
        self.when = when;
        self
    }

    /// Model-level collection cadence (default: every step).
    pub fn when_model(mut self, when: When<A, S, P>) -> Self {
        self.when_model = when;
        self
    }

    /// Transform applied to every value as it is copied into the frame.
    /// Deep-copying snapshots of mutable properties is the typical override.
    pub fn obtainer(mut self, f: impl Fn(Value) -> Value + Send + 'static) -> Self {
        self.obtainer = Box::new(f);
        self
    }

    /// Stream rows to `sink`, flushing every `writing_interval` collection
    /// ticks.  The in-memory frames stay empty in this mode.
    pub fn offline(mut self, sink: Box<dyn FrameSink>, writing_interval: u64) -> Self {
        self.sink = Some(SinkState {
            sink,
            writing_interval: writing_interval.max(1),
            ticks_since: 0,
        });
        self
    }

    // ── Frame access ──────────────────────────────────────────────────────

    pub fn agent_frame(&self) -> &Frame {
        &self.agent_frame
    }

    pub fn model_frame(&self) -> &Frame {
        &self.model_frame
    }

    /// Take both frames out (ensemble/paramscan union).
    pub fn into_frames(self) -> (Frame, Frame) {
        (self.agent_frame, self.model_frame)
    }

    // ── Collection ────────────────────────────────────────────────────────

    /// Record rows if this model time is a collection tick.  Called by the
    /// driver after `model_step`, and once before stepping begins.
    pub fn collect(&mut self, model: &Model<A, S, P>) -> CollectResult<()> {
        let time = model.tick().0;
        let fired_agents = !self.adata.is_empty() && self.when.fires(model, time);
        let fired_model = !self.mdata.is_empty() && self.when_model.fires(model, time);

        if fired_agents {
            self.collect_agents(model, time)?;
        }
        if fired_model {
            self.collect_model(model, time)?;
        }

        if (fired_agents || fired_model) && self.sink.is_some() {
            self.maybe_flush()?;
        }
        Ok(())
    }

    /// Flush buffered rows and close the sink.  Idempotent; the driver calls
    /// this when a run ends, error or not.
    pub fn finish(&mut self) -> CollectResult<()> {
        if let Some(state) = self.sink.as_mut() {
            let agent_chunk = self.agent_frame.drain_rows();
            if !agent_chunk.is_empty() {
                state.sink.write_agent_chunk(&agent_chunk)?;
            }
            let model_chunk = self.model_frame.drain_rows();
            if !model_chunk.is_empty() {
                state.sink.write_model_chunk(&model_chunk)?;
            }
            state.sink.finish()?;
        }
        Ok(())
    }

    fn collect_agents(&mut self, model: &Model<A, S, P>, time: u64) -> CollectResult<()> {
        // Ascending-ID order keeps rows deterministic regardless of
        // container order.
        self.ids.clear();
        self.ids.extend_from_slice(model.agents().ids());
        self.ids.sort_unstable();

        let aggregated = self.adata.first().map(|s| s.is_aggregated()).unwrap_or(false);
        if aggregated {
            let mut row = Vec::with_capacity(1 + self.adata.len());
            row.push(Value::Int(time as i64));
            for source in &self.adata {
                let mut values = Vec::new();
                for &id in &self.ids {
                    let agent = model.agents().get(id).expect("live id");
                    if let Some(filter) = &source.filter {
                        if !(filter.pred)(agent) {
                            continue;
                        }
                    }
                    values.push((self.obtainer)((source.get)(agent)));
                }
                row.push(source.agg.as_ref().expect("aggregated mode").apply(&values)?);
            }
            self.agent_frame.push_row(row)?;
        } else {
            let tag_kinds = A::KINDS.len() > 1;
            for &id in &self.ids {
                let agent = model.agents().get(id).expect("live id");
                let mut row = Vec::with_capacity(2 + self.adata.len());
                row.push(Value::Int(time as i64));
                row.push(Value::Int(id.0 as i64));
                if tag_kinds {
                    row.push(Value::Text(agent.kind_name().to_owned()));
                }
                for source in &self.adata {
                    row.push((self.obtainer)((source.get)(agent)));
                }
                self.agent_frame.push_row(row)?;
            }
        }
        Ok(())
    }

    fn collect_model(&mut self, model: &Model<A, S, P>, time: u64) -> CollectResult<()> {
        let mut row = Vec::with_capacity(1 + self.mdata.len());
        row.push(Value::Int(time as i64));
        for source in &self.mdata {
            row.push((self.obtainer)((source.get)(model)));
        }
        self.model_frame.push_row(row)
    }

    fn maybe_flush(&mut self) -> CollectResult<()> {
        let state = self.sink.as_mut().expect("checked by caller");
        state.ticks_since += 1;
        if state.ticks_since < state.writing_interval {
            return Ok(());
        }
        state.ticks_since = 0;
        let agent_chunk = self.agent_frame.drain_rows();
        if !agent_chunk.is_empty() {
            state.sink.write_agent_chunk(&agent_chunk)?;
        }
        let model_chunk = self.model_frame.drain_rows();
        if !model_chunk.is_empty() {
            state.sink.write_model_chunk(&model_chunk)?;
        }
        Ok(())
    }
}
