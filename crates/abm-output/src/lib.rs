//! `abm-output` — persistence back-ends for the rust_abm engine.
//!
//! Three concerns live here:
//!
//! 1. **Agent CSV dump/load** — one row per agent (`id`, flattened position,
//!    user fields), loading through serde records with an optional
//!    column-map.
//! 2. **Frame sinks** — [`abm_collect::FrameSink`] implementations streaming
//!    collection frames to CSV (always), Parquet (feature `parquet`), or
//!    SQLite (feature `sqlite`).
//! 3. **Binary checkpoints** — whole-model bincode snapshots (agents,
//!    properties, space index, RNG state, tick, max ID).  Behavior and
//!    scheduler are re-bound by the caller on load; OSM models re-attach
//!    their road network.
//!
//! | Module       | Contents                                      |
//! |--------------|-----------------------------------------------|
//! | [`agents_csv`] | `dump_agents_csv`, `load_csv_records`, `FlatPos` |
//! | [`csv_sink`]   | `CsvFrameSink`                              |
//! | [`parquet_sink`] | `ParquetFrameSink` (feature `parquet`)    |
//! | [`sqlite_sink`]  | `SqliteFrameSink` (feature `sqlite`)      |
//! | [`checkpoint`]   | `save_checkpoint`, `load_checkpoint`      |
//! | [`error`]        | `OutputError`, `OutputResult<T>`          |

pub mod agents_csv;
pub mod checkpoint;
pub mod csv_sink;
pub mod error;

#[cfg(feature = "parquet")]
pub mod parquet_sink;

#[cfg(feature = "sqlite")]
pub mod sqlite_sink;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use agents_csv::{dump_agents_csv, load_csv_records, FlatPos};
pub use checkpoint::{load_checkpoint, load_checkpoint_osm, save_checkpoint};
pub use csv_sink::CsvFrameSink;
pub use error::{OutputError, OutputResult};

#[cfg(feature = "parquet")]
pub use parquet_sink::ParquetFrameSink;

#[cfg(feature = "sqlite")]
pub use sqlite_sink::SqliteFrameSink;
