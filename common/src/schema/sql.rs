use crate::table::{CleanTable, ColumnType};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Real,
    Boolean,
    Datetime,
    /// never produced by inference, kept so date-only columns have a target
    Date,
    Text,
}

impl SqlType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Real => "REAL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::Datetime => "DATETIME",
            SqlType::Date => "DATE",
            SqlType::Text => "TEXT",
        }
    }
}

impl From<ColumnType> for SqlType {
    fn from(column_type: ColumnType) -> Self {
        match column_type {
            ColumnType::Integer => SqlType::Integer,
            ColumnType::Float => SqlType::Real,
            ColumnType::Boolean => SqlType::Boolean,
            ColumnType::Timestamp => SqlType::Datetime,
            ColumnType::Text => SqlType::Text,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<(String, SqlType)>,
}

impl TableSchema {
    pub fn from_table(table: &CleanTable, table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            columns: table
                .columns()
                .iter()
                .map(|c| (c.name.to_lowercase(), SqlType::from(c.column_type)))
                .collect(),
        }
    }

    /// `CREATE TABLE name (col TYPE, ...);` with identifiers left unquoted
    pub fn to_create_table(&self) -> String {
        let clauses: Vec<String> = self
            .columns
            .iter()
            .map(|(name, sql_type)| format!("{} {}", name, sql_type))
            .collect();

        format!("CREATE TABLE {} ({});", self.table_name, clauses.join(", "))
    }
}

/// the create table statement the language model sees as grounding
pub fn generate_schema(table: &CleanTable, table_name: &str) -> String {
    let schema = TableSchema::from_table(table, table_name).to_create_table();
    tracing::info!("schema inferred from table: {}", schema);
    schema
}
