//! CSV frame sink.
//!
//! Creates two files in the configured output directory:
//! - `agent_data.csv`
//! - `model_data.csv`
//!
//! Headers are written with the first chunk (column names are not known
//! before then); `Null` cells become empty fields.

use std::fs::File;
use std::path::Path;

use csv::Writer;

use abm_collect::{CollectError, CollectResult, Frame, FrameSink};

use crate::error::OutputResult;

/// Streams collection frames to two CSV files.
pub struct CsvFrameSink {
    agents:         Writer<File>,
    model:          Writer<File>,
    agents_started: bool,
    model_started:  bool,
    finished:       bool,
}

impl CsvFrameSink {
    /// Create (or truncate) the two CSV files in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            agents:         Writer::from_path(dir.join("agent_data.csv"))?,
            model:          Writer::from_path(dir.join("model_data.csv"))?,
            agents_started: false,
            model_started:  false,
            finished:       false,
        })
    }

    fn write_chunk(
        writer:  &mut Writer<File>,
        started: &mut bool,
        chunk:   &Frame,
    ) -> CollectResult<()> {
        let io_err = |e: csv::Error| CollectError::Sink(e.to_string());
        if !*started {
            writer
                .write_record(chunk.column_names())
                .map_err(io_err)?;
            *started = true;
        }
        for idx in 0..chunk.len() {
            let row = chunk.row(idx).expect("index in range");
            writer
                .write_record(row.iter().map(|v| v.to_string()))
                .map_err(io_err)?;
        }
        Ok(())
    }
}

impl FrameSink for CsvFrameSink {
    fn write_agent_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        Self::write_chunk(&mut self.agents, &mut self.agents_started, chunk)
    }

    fn write_model_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        Self::write_chunk(&mut self.model, &mut self.model_started, chunk)
    }

    fn finish(&mut self) -> CollectResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.agents
            .flush()
            .map_err(|e| CollectError::Sink(e.to_string()))?;
        self.model
            .flush()
            .map_err(|e| CollectError::Sink(e.to_string()))?;
        Ok(())
    }
}
