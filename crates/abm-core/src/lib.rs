//! `abm-core` — foundational types for the `rust_abm` agent-based modeling
//! engine.
//!
//! This crate is a dependency of every other `abm-*` crate.  It intentionally
//! has no `abm-*` dependencies and minimal external ones (only `rand`,
//! `rand_chacha`, `rand_distr`, and `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                    |
//! |-----------|---------------------------------------------|
//! | [`ids`]   | `AgentId`, `NodeId`, `EdgeId`               |
//! | [`rng`]   | `ModelRng` (seedable, checkpointable)       |
//! | [`time`]  | `Tick`                                      |
//! | [`error`] | `AbmError`, `AbmResult`                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                              |
//! |---------|-----------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types. |
//!           | Required by `abm-output` checkpoints.               |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{AbmError, AbmResult};
pub use ids::{AgentId, EdgeId, NodeId};
pub use rng::ModelRng;
pub use time::Tick;
