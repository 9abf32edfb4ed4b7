use std::collections::HashMap;

use crate::error::{Result, ToolError};

/// A rectangular table of string cells with a unique, ordered header.
///
/// Both trackers are carried around in this shape: every cell is already
/// coerced to a string and missing cells are represented as `""`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    positions: HashMap<String, usize>,
}

impl Table {
    /// Builds a table, padding short rows with empty cells.
    ///
    /// Fails when a header name repeats or a row is wider than the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut positions = HashMap::with_capacity(columns.len());
        for (idx, column) in columns.iter().enumerate() {
            if positions.insert(column.clone(), idx).is_some() {
                return Err(ToolError::InvalidTable(format!(
                    "duplicate column '{column}'"
                )));
            }
        }

        let width = columns.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (row_idx, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(ToolError::InvalidTable(format!(
                    "row {} has {} cells but the header only has {width}",
                    row_idx + 1,
                    row.len()
                )));
            }
            row.resize(width, String::new());
            padded.push(row);
        }

        Ok(Self {
            columns,
            rows: padded,
            positions,
        })
    }

    /// Convenience constructor for literal tables.
    pub fn from_rows<C, R, V>(columns: C, rows: R) -> Result<Self>
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    /// Returns the cell at `row`/`column`, or `None` when either is unknown.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|cells| cells[col].as_str())
    }

    /// Returns the cell at `row` and a known column position.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        &self.rows[row][col]
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        self.rows[row][col] = value.into();
    }

    /// Appends `column` filled with empty cells unless it already exists and
    /// returns its position.
    pub fn ensure_column(&mut self, column: &str) -> usize {
        if let Some(idx) = self.column_index(column) {
            return idx;
        }
        let idx = self.columns.len();
        self.columns.push(column.to_string());
        self.positions.insert(column.to_string(), idx);
        for row in &mut self.rows {
            row.push(String::new());
        }
        idx
    }

    /// Keeps only the rows whose index is flagged `true` in `keep`.
    pub(crate) fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.rows.retain(|_| flags.next().copied().unwrap_or(true));
    }
}
