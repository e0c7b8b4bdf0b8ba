//! `abm-space` — spatial structures and neighborhood queries.
//!
//! Every concrete space implements the [`Space`] trait: a position→ID index
//! the model keeps in lock-step with its agents.  Discrete spaces (grids and
//! graphs) additionally implement [`DiscreteSpace`] for position enumeration
//! and emptiness queries.
//!
//! # Crate layout
//!
//! | Module          | Contents                                               |
//! |-----------------|--------------------------------------------------------|
//! | [`space`]       | `Space`, `DiscreteSpace`, `NoSpace`                    |
//! | [`lattice`]     | `Lattice<D>` (dims, strides, wrapping), `Metric`       |
//! | [`grid`]        | `GridSpace<D>` (multi-occupancy)                       |
//! | [`grid_single`] | `GridSpaceSingle<D>` (one agent per cell)              |
//! | [`continuous`]  | `ContinuousSpace<D>` (bucketed real space)             |
//! | [`graph`]       | `GraphSpace` (runtime-mutable vertex topology)         |
//! | [`osm`]         | `OsmSpace`, `OsmNetwork` (road network + routing)      |
//! | [`error`]       | `SpaceError`, `SpaceResult<T>`                         |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on the space index types.   |
//!           | The OSM road network itself is never serialized; re-attach it |
//!           | after loading a checkpoint.                                   |

pub mod continuous;
pub mod error;
pub mod graph;
pub mod grid;
pub mod grid_single;
pub mod lattice;
pub mod osm;
pub mod space;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use continuous::ContinuousSpace;
pub use error::{SpaceError, SpaceResult};
pub use graph::{GraphSpace, NeighborKind, VertexRemap};
pub use grid::GridSpace;
pub use grid_single::GridSpaceSingle;
pub use lattice::{Lattice, Metric};
pub use osm::{OsmNetwork, OsmNetworkBuilder, OsmPos, OsmSpace};
pub use space::{DiscreteSpace, LatticeSpace, NoSpace, Space};
