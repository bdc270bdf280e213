pub mod sqlite;

pub use sqlite::{SqliteSession, SqliteStore};

use crate::error::Result;
use crate::table::CleanTable;
use serde_json::{Map, Value};

/// a raw result row: column name to value, in select order
pub type ResultRow = Map<String, Value>;

/// relational engine the pipeline materializes into and queries
pub trait SqlStore: Send + Sync {
    /// create `name` from the table, replacing any previous table of that name
    fn create_table(&self, table: &CleanTable, name: &str) -> Result<()>;

    fn execute(&self, sql: &str) -> Result<Vec<ResultRow>>;

    fn drop_table(&self, name: &str) -> Result<()>;
}
