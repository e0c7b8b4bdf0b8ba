//! `Frame` — a minimal column-oriented table.

use crate::error::{CollectError, CollectResult};
use crate::value::Value;

/// One named column.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name:   String,
    pub values: Vec<Value>,
}

/// Column-oriented table; every column has the same row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// An empty frame with the given column names.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: names
                .into_iter()
                .map(|name| Column { name: name.into(), values: Vec::new() })
                .collect(),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Row count (all columns agree).
    pub fn len(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Append one row; the arity must match the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> CollectResult<()> {
        if row.len() != self.columns.len() {
            return Err(CollectError::Config(format!(
                "row has {} values, frame has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (col, value) in self.columns.iter_mut().zip(row) {
            col.values.push(value);
        }
        Ok(())
    }

    /// One row as an owned vector.
    pub fn row(&self, idx: usize) -> Option<Vec<Value>> {
        if idx >= self.len() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[idx].clone()).collect())
    }

    /// Insert a constant-valued column at the front (ensemble / parameter
    /// annotation).
    pub fn prepend_const_column(&mut self, name: impl Into<String>, value: Value) {
        let len = self.len();
        self.columns.insert(
            0,
            Column { name: name.into(), values: vec![value; len] },
        );
    }

    /// Append `other`'s rows; the column names must match exactly.
    pub fn vstack(&mut self, other: Frame) -> CollectResult<()> {
        if self.columns.len() != other.columns.len()
            || self
                .columns
                .iter()
                .zip(&other.columns)
                .any(|(a, b)| a.name != b.name)
        {
            return Err(CollectError::Config(format!(
                "vstack column mismatch: {:?} vs {:?}",
                self.column_names().collect::<Vec<_>>(),
                other.column_names().collect::<Vec<_>>()
            )));
        }
        for (a, b) in self.columns.iter_mut().zip(other.columns) {
            a.values.extend(b.values);
        }
        Ok(())
    }

    /// Move all rows out into a new frame with the same columns, leaving
    /// this one empty (offline chunk flushing).
    pub fn drain_rows(&mut self) -> Frame {
        Frame {
            columns: self
                .columns
                .iter_mut()
                .map(|c| Column {
                    name:   c.name.clone(),
                    values: std::mem::take(&mut c.values),
                })
                .collect(),
        }
    }
}
