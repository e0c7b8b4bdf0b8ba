//! Binary whole-model checkpoints.
//!
//! A checkpoint is a bincode snapshot of the full [`Model`]: agents,
//! properties, space index, RNG state, current tick, and `max_id`.  Loading
//! restores all of it exactly, so a resumed run draws the same random
//! sequence the original would have.
//!
//! Behaviors and schedulers are code, not data — the caller re-binds them
//! when building the [`Simulation`] around the loaded model.  OSM models
//! additionally re-attach their road network (rebuilt from the original map
//! source), which is never serialized.
//!
//! [`Simulation`]: ../abm_sim/struct.Simulation.html

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use abm_model::{Agent, Model};
use abm_space::{OsmNetwork, OsmPos, OsmSpace};

use crate::error::OutputResult;

/// Write a whole-model snapshot to `path`.
pub fn save_checkpoint<A, S, P>(model: &Model<A, S, P>, path: &Path) -> OutputResult<()>
where
    A: Agent + Serialize,
    S: Serialize,
    P: Serialize,
{
    let file = BufWriter::new(File::create(path)?);
    bincode::serialize_into(file, model)?;
    Ok(())
}

/// Restore a model snapshot from `path`.
pub fn load_checkpoint<A, S, P>(path: &Path) -> OutputResult<Model<A, S, P>>
where
    A: Agent + DeserializeOwned,
    S: DeserializeOwned,
    P: DeserializeOwned,
{
    let file = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(file)?)
}

/// Restore an OSM-space model and re-attach its road network.
///
/// The network must be rebuilt from the same map source the original model
/// used; agent positions and in-progress routes reference its node IDs.
pub fn load_checkpoint_osm<A, P>(
    path:    &Path,
    network: OsmNetwork,
) -> OutputResult<Model<A, OsmSpace, P>>
where
    A: Agent<Pos = OsmPos> + DeserializeOwned,
    P: DeserializeOwned,
{
    let mut model: Model<A, OsmSpace, P> = load_checkpoint(path)?;
    model.attach_network(network);
    Ok(model)
}
