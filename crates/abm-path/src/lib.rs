//! `abm-path` — A* pathfinding over grid and continuous spaces.
//!
//! A [`Pathfinder`] owns a boolean walkmap congruent with the space's lattice,
//! a cost metric, a neighborhood, and the in-progress routes keyed by agent
//! ID.  Planning writes a route; [`move_along_route`] pops waypoints and moves
//! the agent through the model, so the space index always stays consistent.
//!
//! Continuous spaces overlay the same machinery on their bucket lattice;
//! [`ContinuousPathfinder`] adds exact-destination bookkeeping and
//! waypoint-skipping movement.
//!
//! # Crate layout
//!
//! | Module         | Contents                                            |
//! |----------------|-----------------------------------------------------|
//! | [`metric`]     | `CostMetric`, `DirectDistance`, `MaxDistance`,      |
//! |                | `PenaltyMap`                                        |
//! | [`pathfinder`] | `Pathfinder<D>`, A*, route storage, model glue      |
//! | [`continuous`] | `ContinuousPathfinder<D>`                           |
//! | [`error`]      | `PathError`, `PathResult<T>`                        |

pub mod continuous;
pub mod error;
pub mod metric;
pub mod pathfinder;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use continuous::ContinuousPathfinder;
pub use error::{PathError, PathResult};
pub use metric::{CostMetric, DirectDistance, MaxDistance, PenaltyMap};
pub use pathfinder::{move_along_route, Neighborhood, Pathfinder, RouteCondition};
