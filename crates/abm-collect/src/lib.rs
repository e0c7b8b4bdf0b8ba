//! `abm-collect` — data collection into column-oriented frames.
//!
//! A [`Collector`] is configured with agent-level sources (`adata`) and
//! model-level sources (`mdata`), a collection cadence for each, and an
//! optional offline sink.  The stepping driver calls
//! [`Collector::collect`] after each step's model callback; rows land in two
//! in-memory [`Frame`]s (and stream to the sink in chunks when configured).
//!
//! # Column naming
//!
//! | Source                              | Column          |
//! |-------------------------------------|-----------------|
//! | per-agent `money`                   | `money`         |
//! | `(money, Sum)`                      | `sum_money`     |
//! | `(money, Sum, rich)`                | `sum_money_rich`|
//!
//! This naming is an external contract: downstream notebooks key on it.
//!
//! # Crate layout
//!
//! | Module        | Contents                                    |
//! |---------------|---------------------------------------------|
//! | [`value`]     | `Value` (dynamically typed cell)            |
//! | [`frame`]     | `Frame`, `Column`                           |
//! | [`source`]    | `AgentSource`, `ModelSource`, `Aggregate`   |
//! | [`when`]      | `When` (collection cadence)                 |
//! | [`collector`] | `Collector`, `FrameSink`                    |
//! | [`error`]     | `CollectError`, `CollectResult<T>`          |

pub mod collector;
pub mod error;
pub mod frame;
pub mod source;
pub mod value;
pub mod when;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use collector::{Collector, FrameSink};
pub use error::{CollectError, CollectResult};
pub use frame::{Column, Frame};
pub use source::{Aggregate, AgentSource, ModelSource};
pub use value::Value;
pub use when::When;
