//! `abm-model` — agents and the model container.
//!
//! A [`Model`] owns three tightly coupled pieces: the agent container
//! ([`AgentSet`]), one space variant from `abm-space`, and the model RNG.
//! Every public operation leaves the container and the space index in
//! agreement: an agent occupies exactly the cells its `pos` names, and every
//! cell list contains exactly the IDs whose `pos` is that cell.
//!
//! # Crate layout
//!
//! | Module             | Contents                                            |
//! |--------------------|-----------------------------------------------------|
//! | [`agent`]          | `Agent` and `Velocity` traits                       |
//! | [`set`]            | `AgentSet` (id-indexed container), `Backing`        |
//! | [`model`]          | `Model` and the space-generic operations            |
//! | [`continuous_ops`] | velocity moves, pairing, collisions (continuous)    |
//! | [`graph_ops`]      | topology mutation + neighborhoods (graph)           |
//! | [`osm_ops`]        | routing glue (road network)                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `Model` and `AgentSet`.  |

pub mod agent;
pub mod continuous_ops;
pub mod graph_ops;
pub mod model;
pub mod osm_ops;
pub mod set;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agent::{Agent, Velocity};
pub use continuous_ops::PairKind;
pub use model::Model;
pub use set::{AgentSet, Backing};

pub use abm_core::{AbmError, AbmResult, AgentId, ModelRng, NodeId, Tick};
