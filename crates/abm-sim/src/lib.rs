//! `abm-sim` — the stepping driver, ensembles, and parameter scans.
//!
//! # Step anatomy
//!
//! ```text
//! ① Schedule — the scheduler fills the reusable ID buffer.
//! ② Agents   — for each buffered ID still alive: behavior.agent_step.
//!              Agents removed mid-step are skipped when reached; agents
//!              added mid-step are not in the buffer, so they first act
//!              next step (but are immediately visible to queries).
//! ③ Model    — behavior.model_step.
//! ④ Clock    — the model tick advances.
//! ⑤ Collect  — the collector records if this is a collection tick.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                              |
//! |------------|-----------------------------------------------------|
//! | `parallel` | Runs ensemble members on Rayon's thread pool.       |

pub mod behavior;
pub mod ensemble;
pub mod paramscan;
pub mod sim;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use behavior::{Behavior, NoopBehavior};
pub use ensemble::ensemble_run;
pub use paramscan::{param_scan, ParamSet};
pub use sim::Simulation;
