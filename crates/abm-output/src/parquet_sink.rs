//! Parquet frame sink (feature `parquet`).
//!
//! Creates two files in the configured output directory:
//! - `agent_data.parquet`
//! - `model_data.parquet`
//!
//! The Arrow schema is inferred from the first chunk flushed to each file
//! (first non-null cell per column decides the type; an all-null column
//! falls back to Utf8).  `finish()` **must** run to write the Parquet
//! footer; the collector guarantees it when a run ends.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanBuilder, Float64Builder, Int64Builder, StringBuilder};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use abm_collect::{CollectError, CollectResult, Frame, FrameSink, Value};

use crate::error::OutputResult;

fn snappy_props() -> WriterProperties {
    WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build()
}

/// One lazily opened Parquet file.
struct LazyWriter {
    path:   PathBuf,
    writer: Option<ArrowWriter<File>>,
    schema: Option<Arc<Schema>>,
}

impl LazyWriter {
    fn new(path: PathBuf) -> Self {
        Self { path, writer: None, schema: None }
    }

    fn write(&mut self, chunk: &Frame) -> CollectResult<()> {
        let sink_err = |e: String| CollectError::Sink(e);
        if self.writer.is_none() {
            let schema = infer_schema(chunk);
            let file = File::create(&self.path).map_err(|e| sink_err(e.to_string()))?;
            let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(snappy_props()))
                .map_err(|e| sink_err(e.to_string()))?;
            self.schema = Some(schema);
            self.writer = Some(writer);
        }
        let schema = self.schema.as_ref().expect("schema set with writer");
        let batch = build_batch(schema, chunk).map_err(|e| sink_err(e.to_string()))?;
        self.writer
            .as_mut()
            .expect("writer set above")
            .write(&batch)
            .map_err(|e| sink_err(e.to_string()))?;
        Ok(())
    }

    fn close(&mut self) -> CollectResult<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .close()
                .map_err(|e| CollectError::Sink(e.to_string()))?;
        }
        Ok(())
    }
}

/// Streams collection frames to two Parquet files.
pub struct ParquetFrameSink {
    agents: LazyWriter,
    model:  LazyWriter,
}

impl ParquetFrameSink {
    pub fn new(dir: &Path) -> OutputResult<Self> {
        Ok(Self {
            agents: LazyWriter::new(dir.join("agent_data.parquet")),
            model:  LazyWriter::new(dir.join("model_data.parquet")),
        })
    }
}

impl FrameSink for ParquetFrameSink {
    fn write_agent_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        self.agents.write(chunk)
    }

    fn write_model_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        self.model.write(chunk)
    }

    fn finish(&mut self) -> CollectResult<()> {
        self.agents.close()?;
        self.model.close()
    }
}

// ── Schema inference & batch building ─────────────────────────────────────────

fn infer_schema(chunk: &Frame) -> Arc<Schema> {
    let fields: Vec<Field> = chunk
        .columns()
        .iter()
        .map(|col| {
            let dtype = col
                .values
                .iter()
                .find(|v| !v.is_null())
                .map(|v| match v {
                    Value::Int(_) => DataType::Int64,
                    Value::Float(_) => DataType::Float64,
                    Value::Bool(_) => DataType::Boolean,
                    Value::Text(_) | Value::Null => DataType::Utf8,
                })
                .unwrap_or(DataType::Utf8);
            Field::new(&col.name, dtype, true)
        })
        .collect();
    Arc::new(Schema::new(fields))
}

fn build_batch(schema: &Arc<Schema>, chunk: &Frame) -> Result<RecordBatch, String> {
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(chunk.width());
    for (field, col) in schema.fields().iter().zip(chunk.columns()) {
        let array: ArrayRef = match field.data_type() {
            DataType::Int64 => {
                let mut b = Int64Builder::new();
                for v in &col.values {
                    match v {
                        Value::Int(i) => b.append_value(*i),
                        Value::Null => b.append_null(),
                        other => return Err(format!(
                            "column '{}' mixes Int64 with {other:?}",
                            col.name
                        )),
                    }
                }
                Arc::new(b.finish())
            }
            DataType::Float64 => {
                let mut b = Float64Builder::new();
                for v in &col.values {
                    match v {
                        Value::Float(f) => b.append_value(*f),
                        Value::Int(i) => b.append_value(*i as f64),
                        Value::Null => b.append_null(),
                        other => return Err(format!(
                            "column '{}' mixes Float64 with {other:?}",
                            col.name
                        )),
                    }
                }
                Arc::new(b.finish())
            }
            DataType::Boolean => {
                let mut b = BooleanBuilder::new();
                for v in &col.values {
                    match v {
                        Value::Bool(x) => b.append_value(*x),
                        Value::Null => b.append_null(),
                        other => return Err(format!(
                            "column '{}' mixes Boolean with {other:?}",
                            col.name
                        )),
                    }
                }
                Arc::new(b.finish())
            }
            _ => {
                let mut b = StringBuilder::new();
                for v in &col.values {
                    match v {
                        Value::Null => b.append_null(),
                        other => b.append_value(other.to_string()),
                    }
                }
                Arc::new(b.finish())
            }
        };
        arrays.push(array);
    }
    RecordBatch::try_new(Arc::clone(schema), arrays).map_err(|e| e.to_string())
}
