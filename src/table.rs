//! Dynamic stat tables
//!
//! The stats API returns tabular result sets whose columns differ per
//! endpoint, so box-score data flows through a named-column table rather
//! than a fixed struct. Values stay as strings until a consumer needs
//! numbers; game ids are compared as integers.

use crate::{Result, SpreadError};
use std::path::Path;

/// Column holding the game id in every box-score table.
pub const GAME_ID_COLUMN: &str = "gameId";

/// A named-column table of string values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl StatTable {
    pub fn new(columns: Vec<String>) -> Self {
        StatTable {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Add a row. The row must match the table arity.
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SpreadError::ColumnMismatch(format!(
                "row has {} values, table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// All values of a named column.
    pub fn column_values(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| SpreadError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Game ids parsed as integers. Unparseable cells are skipped.
    pub fn game_ids(&self) -> Result<Vec<i64>> {
        let values = self.column_values(GAME_ID_COLUMN)?;
        Ok(values.iter().filter_map(|v| v.trim().parse().ok()).collect())
    }

    /// Append another table's rows. Columns must match exactly; when this
    /// table is empty and has no columns, it adopts the other's schema.
    pub fn append(&mut self, other: StatTable) -> Result<()> {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.columns != other.columns {
            return Err(SpreadError::ColumnMismatch(format!(
                "cannot append table with columns {:?} to table with columns {:?}",
                other.columns, self.columns
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Read a table from CSV, dropping the leading index column.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<StatTable> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path.as_ref())?;
        let headers = reader.headers()?.clone();
        let columns: Vec<String> = headers.iter().skip(1).map(|h| h.to_string()).collect();

        let mut table = StatTable::new(columns);
        for record in reader.records() {
            let record = record?;
            let row: Vec<String> = record.iter().skip(1).map(|v| v.to_string()).collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Write the table to CSV with a renumbered leading index column.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path.as_ref())?;

        let mut header = Vec::with_capacity(self.columns.len() + 1);
        header.push(String::new());
        header.extend(self.columns.iter().cloned());
        writer.write_record(&header)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = Vec::with_capacity(row.len() + 1);
            record.push(i.to_string());
            record.extend(row.iter().cloned());
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}
