//! SQLite frame sink (feature `sqlite`).
//!
//! Creates a single `output.db` in the configured output directory with two
//! tables, `agent_data` and `model_data`, whose columns mirror the frame
//! columns.  Tables are created with the first chunk; inserts are batched in
//! one transaction per chunk.

use std::path::Path;

use rusqlite::types::Value as SqlValue;
use rusqlite::Connection;

use abm_collect::{CollectError, CollectResult, Frame, FrameSink, Value};

use crate::error::OutputResult;

/// Streams collection frames into an SQLite database.
pub struct SqliteFrameSink {
    conn:           Connection,
    agents_created: bool,
    model_created:  bool,
    finished:       bool,
}

impl SqliteFrameSink {
    /// Open (or create) `output.db` in `dir`.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        let conn = Connection::open(dir.join("output.db"))?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Ok(Self {
            conn,
            agents_created: false,
            model_created:  false,
            finished:       false,
        })
    }

    fn write_table(
        conn:    &Connection,
        created: &mut bool,
        table:   &str,
        chunk:   &Frame,
    ) -> CollectResult<()> {
        let err = |e: rusqlite::Error| CollectError::Sink(e.to_string());

        if !*created {
            let cols: Vec<String> = chunk
                .columns()
                .iter()
                .map(|c| {
                    let affinity = c
                        .values
                        .iter()
                        .find(|v| !v.is_null())
                        .map(|v| match v {
                            Value::Int(_) | Value::Bool(_) => "INTEGER",
                            Value::Float(_) => "REAL",
                            _ => "TEXT",
                        })
                        .unwrap_or("TEXT");
                    format!("\"{}\" {affinity}", c.name)
                })
                .collect();
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} ({});",
                cols.join(", ")
            ))
            .map_err(err)?;
            *created = true;
        }

        let placeholders: Vec<String> =
            (1..=chunk.width()).map(|i| format!("?{i}")).collect();
        let insert = format!("INSERT INTO {table} VALUES ({})", placeholders.join(", "));

        let tx = conn.unchecked_transaction().map_err(err)?;
        {
            let mut stmt = tx.prepare_cached(&insert).map_err(err)?;
            for idx in 0..chunk.len() {
                let row = chunk.row(idx).expect("index in range");
                let params: Vec<SqlValue> = row.into_iter().map(to_sql).collect();
                stmt.execute(rusqlite::params_from_iter(params)).map_err(err)?;
            }
        }
        tx.commit().map_err(err)?;
        Ok(())
    }
}

fn to_sql(v: Value) -> SqlValue {
    match v {
        Value::Int(i) => SqlValue::Integer(i),
        Value::Float(f) => SqlValue::Real(f),
        Value::Bool(b) => SqlValue::Integer(b as i64),
        Value::Text(s) => SqlValue::Text(s),
        Value::Null => SqlValue::Null,
    }
}

impl FrameSink for SqliteFrameSink {
    fn write_agent_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        Self::write_table(&self.conn, &mut self.agents_created, "agent_data", chunk)
    }

    fn write_model_chunk(&mut self, chunk: &Frame) -> CollectResult<()> {
        Self::write_table(&self.conn, &mut self.model_created, "model_data", chunk)
    }

    fn finish(&mut self) -> CollectResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.conn
            .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
            .map_err(|e| CollectError::Sink(e.to_string()))
    }
}
