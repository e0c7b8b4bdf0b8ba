//! Row-oriented agent persistence.
//!
//! # Dump format
//!
//! One row per agent: `id`, the flattened position columns, then the user
//! fields in the order given.  Position flattening is per position type
//! ([`FlatPos`]): a 2-D grid agent gets `pos_0, pos_1`, a road agent gets
//! `pos_from, pos_to, pos_offset`, a non-spatial agent gets nothing.
//!
//! # Loading
//!
//! Loading goes through serde: define a flat record mirroring the CSV and
//! deserialize with [`load_csv_records`].  A column-map (`target → source`)
//! renames headers before deserialization — required for mixed-variant
//! files whose source columns don't match the record's field names.

use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use abm_core::{AgentId, NodeId};
use abm_collect::{AgentSource, Value};
use abm_model::{Agent, Model};
use abm_space::{OsmPos, Space};

use crate::error::{OutputError, OutputResult};

// ── FlatPos ───────────────────────────────────────────────────────────────────

/// Flattens a position into named scalar columns.
pub trait FlatPos {
    fn headers() -> Vec<String>;
    fn flatten(&self) -> Vec<Value>;
}

impl FlatPos for () {
    fn headers() -> Vec<String> {
        Vec::new()
    }
    fn flatten(&self) -> Vec<Value> {
        Vec::new()
    }
}

impl<const D: usize> FlatPos for [i32; D] {
    fn headers() -> Vec<String> {
        (0..D).map(|d| format!("pos_{d}")).collect()
    }
    fn flatten(&self) -> Vec<Value> {
        self.iter().map(|&c| Value::Int(c as i64)).collect()
    }
}

impl<const D: usize> FlatPos for [f64; D] {
    fn headers() -> Vec<String> {
        (0..D).map(|d| format!("pos_{d}")).collect()
    }
    fn flatten(&self) -> Vec<Value> {
        self.iter().map(|&c| Value::Float(c)).collect()
    }
}

impl FlatPos for NodeId {
    fn headers() -> Vec<String> {
        vec!["pos".to_owned()]
    }
    fn flatten(&self) -> Vec<Value> {
        vec![Value::Int(self.0 as i64)]
    }
}

impl FlatPos for OsmPos {
    fn headers() -> Vec<String> {
        vec!["pos_from".to_owned(), "pos_to".to_owned(), "pos_offset".to_owned()]
    }
    fn flatten(&self) -> Vec<Value> {
        vec![
            Value::Int(self.from.0 as i64),
            Value::Int(self.to.0 as i64),
            Value::Float(self.offset as f64),
        ]
    }
}

// ── Dump ──────────────────────────────────────────────────────────────────────

/// Write every agent as one CSV row: `id`, position columns, then `fields`.
///
/// Rows come out in ascending-ID order so dumps are reproducible regardless
/// of container order.
pub fn dump_agents_csv<A, S, P>(
    model:  &Model<A, S, P>,
    path:   &Path,
    fields: &[AgentSource<A>],
) -> OutputResult<()>
where
    A: Agent,
    A::Pos: FlatPos,
    S: Space<Pos = A::Pos>,
{
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = vec!["id".to_owned()];
    header.extend(<A::Pos as FlatPos>::headers());
    header.extend(fields.iter().map(AgentSource::column_name));
    writer.write_record(&header)?;

    let mut ids: Vec<AgentId> = model.agents().ids().to_vec();
    ids.sort_unstable();
    for id in ids {
        let agent = model.agents().get(id).expect("live id");
        let mut row: Vec<String> = vec![id.0.to_string()];
        row.extend(agent.pos().flatten().iter().map(Value::to_string));
        row.extend(fields.iter().map(|f| f.value_of(agent).to_string()));
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

// ── Load ──────────────────────────────────────────────────────────────────────

/// Read flat serde records from a CSV file.
///
/// With a column-map, each `(target, source)` pair renames the file's
/// `source` header to `target` before deserialization; unmapped headers are
/// kept as-is.  A `source` absent from the file is an error.
pub fn load_csv_records<R: DeserializeOwned>(
    path:   &Path,
    colmap: Option<&[(&str, &str)]>,
) -> OutputResult<Vec<R>> {
    let file = std::fs::File::open(path)?;
    load_csv_records_from(file, colmap)
}

/// Like [`load_csv_records`] but from any reader (testing with `Cursor`).
pub fn load_csv_records_from<R: DeserializeOwned>(
    reader: impl Read,
    colmap: Option<&[(&str, &str)]>,
) -> OutputResult<Vec<R>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let effective = match colmap {
        None => headers.clone(),
        Some(map) => {
            for (_, source) in map {
                if !headers.iter().any(|h| h == *source) {
                    return Err(OutputError::ColumnMap(format!(
                        "source column '{source}' not in file headers"
                    )));
                }
            }
            headers
                .iter()
                .map(|h| {
                    map.iter()
                        .find(|(_, source)| *source == h)
                        .map(|(target, _)| *target)
                        .unwrap_or(h)
                })
                .collect()
        }
    };

    let mut out = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        out.push(record.deserialize(Some(&effective))?);
    }
    Ok(out)
}
