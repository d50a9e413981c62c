//! In-memory tabular frame shared by every pipeline stage.
//!
//! A [`Frame`] is an ordered list of column names plus rows of optional cell
//! values, where `None` is a null cell. Column names are not required to be
//! unique; lookups by name resolve to the first occurrence.

use std::collections::HashMap;

use anyhow::{Result, anyhow};

use crate::data::Value;

pub type Row = Vec<Option<Value>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Frame {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, None);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> Option<impl Iterator<Item = Option<&'a Value>> + use<'a>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_ref()))
    }

    /// Projects the named columns in the given order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame> {
        let indices = names
            .iter()
            .map(|name| {
                self.column_index(name.as_ref())
                    .ok_or_else(|| anyhow!("Column '{}' not present", name.as_ref()))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.project(&indices))
    }

    /// Keeps only the columns for which `keep` returns true, preserving order.
    pub fn retain_columns<F>(&self, mut keep: F) -> Frame
    where
        F: FnMut(&str) -> bool,
    {
        let indices = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, name)| keep(name))
            .map(|(idx, _)| idx)
            .collect::<Vec<_>>();
        self.project(&indices)
    }

    fn project(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: indices.iter().map(|&idx| self.columns[idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
                .collect(),
        }
    }

    /// Inserts a column holding the same value on every row.
    pub fn insert_constant(&mut self, position: usize, name: &str, value: Option<Value>) {
        let position = position.min(self.columns.len());
        self.columns.insert(position, name.to_string());
        for row in &mut self.rows {
            row.insert(position, value.clone());
        }
    }

    pub fn push_constant(&mut self, name: &str, value: Option<Value>) {
        let end = self.columns.len();
        self.insert_constant(end, name, value);
    }

    /// Drops rows whose value in `column` is null. Returns the number removed.
    pub fn drop_null_in(&mut self, column: &str) -> usize {
        let Some(idx) = self.column_index(column) else {
            return 0;
        };
        let before = self.rows.len();
        self.rows.retain(|row| row[idx].is_some());
        before - self.rows.len()
    }

    /// Drops rows holding at least one null. Returns the number removed.
    pub fn drop_rows_with_nulls(&mut self) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| row.iter().all(Option::is_some));
        before - self.rows.len()
    }

    /// Joins frames column-wise by row index. Shorter frames are padded with nulls.
    pub fn hconcat(frames: Vec<Frame>) -> Frame {
        let height = frames.iter().map(Frame::height).max().unwrap_or(0);
        let mut joined = Frame::new(
            frames
                .iter()
                .flat_map(|frame| frame.columns.iter().cloned())
                .collect(),
        );
        joined.rows = vec![Vec::with_capacity(joined.columns.len()); height];
        for frame in frames {
            let width = frame.width();
            let mut rows = frame.rows.into_iter();
            for target in &mut joined.rows {
                match rows.next() {
                    Some(row) => target.extend(row),
                    None => target.extend(std::iter::repeat_n(None, width)),
                }
            }
        }
        joined
    }

    /// Reorders this frame's columns to `expected`, matching names regardless of
    /// physical position. Repeated names match by occurrence. Returns `None` when
    /// the two column lists are not the same multiset of names.
    pub fn reordered_to(&self, expected: &[String]) -> Option<Frame> {
        if expected.len() != self.columns.len() {
            return None;
        }
        let mut positions: HashMap<&str, Vec<usize>> = HashMap::new();
        for (idx, name) in self.columns.iter().enumerate().rev() {
            positions.entry(name.as_str()).or_default().push(idx);
        }
        let mut indices = Vec::with_capacity(expected.len());
        for name in expected {
            indices.push(positions.get_mut(name.as_str())?.pop()?);
        }
        Some(self.project(&indices))
    }
}
