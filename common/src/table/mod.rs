pub mod cleaner;

pub use cleaner::{clean_table, infer_column_type, normalize_column_names};

use crate::error::{Result, Text2SqlError};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// format used both for timestamp inference and for storing timestamps as text
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(v) => write!(f, "{}", v),
            // debug formatting keeps the `.0` on integral floats
            Cell::Float(v) => write!(f, "{:?}", v),
            Cell::Boolean(v) => write!(f, "{}", v),
            Cell::Timestamp(v) => write!(f, "{}", v.format(TIMESTAMP_FORMAT)),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Timestamp,
    Text,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Text => "text",
        }
    }

    /// value a null cell takes after cleaning; `Cell::Null` means no fill
    pub fn null_fill(&self) -> Cell {
        match self {
            ColumnType::Integer => Cell::Integer(0),
            ColumnType::Float => Cell::Float(0.0),
            ColumnType::Boolean | ColumnType::Timestamp => Cell::Null,
            ColumnType::Text => Cell::Text(String::new()),
        }
    }

    pub fn admits(&self, cell: &Cell) -> bool {
        matches!(
            (self, cell),
            (ColumnType::Integer, Cell::Integer(_))
                | (ColumnType::Float, Cell::Float(_))
                | (ColumnType::Boolean, Cell::Boolean(_))
                | (ColumnType::Timestamp, Cell::Timestamp(_))
                | (ColumnType::Text, Cell::Text(_))
        )
    }
}

/// raw rows as read from a file, before any cleaning
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        for (idx, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Text2SqlError::Load(format!(
                    "row {} has {} cells, expected {}",
                    idx + 1,
                    row.len(),
                    columns.len()
                )));
            }
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

/// a table after name normalization, trimming, type inference and null fill
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTable {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Cell>>,
}

impl CleanTable {
    pub(crate) fn from_parts(columns: Vec<ColumnDef>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

impl From<CleanTable> for Table {
    fn from(table: CleanTable) -> Self {
        Table {
            columns: table.columns.into_iter().map(|c| c.name).collect(),
            rows: table.rows,
        }
    }
}
