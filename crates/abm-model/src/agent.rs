//! The `Agent` trait — the record every model stores.
//!
//! Users define their own agent struct (or enum, for mixed-variant models)
//! and implement `Agent` for it.  The position type must match the space the
//! model is built over; non-spatial models use `Pos = ()`.
//!
//! # Mixed variants
//!
//! A closed set of agent variants is a plain Rust enum.  `KINDS` lists the
//! variant names in declaration order and `kind()` returns the current
//! variant's index into it; schedulers group by it, data collection emits it
//! as the `agent_type` column, and continuous-space `Types` pairing compares
//! it.  Single-variant models keep the defaults.
//!
//! # Example
//!
//! ```rust,ignore
//! struct Walker {
//!     id:  AgentId,
//!     pos: [i32; 2],
//!     mood: f64,
//! }
//!
//! impl Agent for Walker {
//!     type Pos = [i32; 2];
//!     fn id(&self) -> AgentId { self.id }
//!     fn set_id(&mut self, id: AgentId) { self.id = id; }
//!     fn pos(&self) -> [i32; 2] { self.pos }
//!     fn set_pos(&mut self, pos: [i32; 2]) { self.pos = pos; }
//! }
//! ```

use abm_core::AgentId;

/// A record with identity, a position, and user fields.
///
/// Positions are returned by value: every concrete position type is a small
/// `Copy`-like value (integer vector, real vector, vertex ID, edge+offset).
pub trait Agent: Sized + Send + 'static {
    /// Position type; must equal the space's `Pos`.
    type Pos: Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static;

    fn id(&self) -> AgentId;

    /// Engine-internal: called once when the model allocates an ID for an
    /// agent constructed with `AgentId::EMPTY`.
    fn set_id(&mut self, id: AgentId);

    fn pos(&self) -> Self::Pos;

    /// Engine-internal: called by the model after the space index moved.
    /// User code moves agents through [`Model::move_agent`] so the index and
    /// the field can never disagree.
    ///
    /// [`Model::move_agent`]: crate::Model::move_agent
    fn set_pos(&mut self, pos: Self::Pos);

    /// Variant names in declaration order.
    const KINDS: &'static [&'static str] = &["agent"];

    /// Index of this agent's concrete variant into [`KINDS`](Self::KINDS).
    fn kind(&self) -> usize {
        0
    }

    /// Name of this agent's concrete variant.
    fn kind_name(&self) -> &'static str {
        Self::KINDS[self.kind()]
    }
}

/// Continuous-space agents additionally carry a velocity of the same
/// dimensionality as their position.
pub trait Velocity<const D: usize>: Agent<Pos = [f64; D]> {
    fn vel(&self) -> [f64; D];
    fn set_vel(&mut self, vel: [f64; D]);
}
