use crate::error::{Result, Text2SqlError};
use crate::schema::sql::TableSchema;
use crate::store::{ResultRow, SqlStore};
use crate::table::{Cell, CleanTable, TIMESTAMP_FORMAT};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::Connection;
use serde_json::{Map, Number, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// sqlite database file; every operation opens its own scoped session
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
    _scratch: Option<Arc<TempDir>>,
}

impl SqliteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _scratch: None,
        }
    }

    /// database in a private temporary directory, removed with the last clone of the store
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("text2sql-").tempdir()?;
        let path = dir.path().join("text2sql.db");
        tracing::debug!("using temporary sqlite database {}", path.display());

        Ok(Self {
            path,
            _scratch: Some(Arc::new(dir)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// open a connection that is closed when the session is dropped
    pub fn session(&self) -> Result<SqliteSession> {
        tracing::debug!("connecting to sqlite database {}", self.path.display());
        let conn = Connection::open(&self.path)?;
        Ok(SqliteSession {
            conn: Some(conn),
            path: self.path.clone(),
        })
    }
}

impl SqlStore for SqliteStore {
    fn create_table(&self, table: &CleanTable, name: &str) -> Result<()> {
        self.session()?.create_table(table, name)
    }

    fn execute(&self, sql: &str) -> Result<Vec<ResultRow>> {
        self.session()?.execute(sql)
    }

    fn drop_table(&self, name: &str) -> Result<()> {
        self.session()?.drop_table(name)
    }
}

pub struct SqliteSession {
    conn: Option<Connection>,
    path: PathBuf,
}

impl SqliteSession {
    fn conn(&mut self) -> Result<&mut Connection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Text2SqlError::Store("sqlite session already closed".to_string()))
    }

    #[tracing::instrument(skip(self, table), fields(rows = table.row_count()))]
    pub fn create_table(&mut self, table: &CleanTable, name: &str) -> Result<()> {
        let schema = TableSchema::from_table(table, name);
        let columns: Vec<String> = schema
            .columns
            .iter()
            .map(|(column, sql_type)| format!("{} {}", quote_ident(column), sql_type))
            .collect();
        let names: Vec<String> = schema.columns.iter().map(|(c, _)| quote_ident(c)).collect();
        let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{}", i)).collect();

        let conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({columns});",
            table = quote_ident(name),
            columns = columns.join(", ")
        ))?;

        if !names.is_empty() {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(name),
                names.join(", "),
                placeholders.join(", ")
            ))?;
            for row in table.rows() {
                stmt.execute(rusqlite::params_from_iter(row.iter().map(cell_to_sql)))?;
            }
        }

        tx.commit()?;
        tracing::info!("table {} created with {} rows", name, table.row_count());
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub fn execute(&mut self, sql: &str) -> Result<Vec<ResultRow>> {
        if sql.trim().is_empty() {
            return Err(Text2SqlError::Store("sql query is empty".to_string()));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut results = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut record = Map::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), sql_to_json(row.get_ref(idx)?));
            }
            results.push(record);
        }

        tracing::info!(rows = results.len(), "sql query executed");
        Ok(results)
    }

    pub fn drop_table(&mut self, name: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(&format!("DROP TABLE IF EXISTS {};", quote_ident(name)))?;
        tracing::debug!("table {} dropped", name);
        Ok(())
    }
}

impl Drop for SqliteSession {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            match conn.close() {
                Ok(()) => tracing::debug!("closed sqlite connection to {}", self.path.display()),
                Err((_, e)) => tracing::warn!("error closing sqlite connection: {}", e),
            }
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn cell_to_sql(cell: &Cell) -> SqlValue {
    match cell {
        Cell::Null => SqlValue::Null,
        Cell::Integer(v) => SqlValue::Integer(*v),
        Cell::Float(v) => SqlValue::Real(*v),
        Cell::Boolean(v) => SqlValue::Integer(i64::from(*v)),
        Cell::Timestamp(v) => SqlValue::Text(v.format(TIMESTAMP_FORMAT).to_string()),
        Cell::Text(v) => SqlValue::Text(v.clone()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::from(v),
        ValueRef::Real(v) => Number::from_f64(v).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::String(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{clean_table, Table};
    use serde_json::json;

    fn member_table() -> CleanTable {
        let raw = Table::new(
            vec!["name".to_string(), "age".to_string(), "is_member".to_string()],
            vec![
                vec![Cell::text("Ana"), Cell::text("30"), Cell::text("true")],
                vec![Cell::text("Bo"), Cell::text("25"), Cell::text("false")],
            ],
        )
        .unwrap();
        clean_table(raw).unwrap()
    }

    #[test]
    fn test_create_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&member_table(), "t").unwrap();
        let rows = store.execute("SELECT name FROM t WHERE is_member = true").unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(Value::Object(rows[0].clone()), json!({"name": "Ana"}));
    }

    #[test]
    fn test_create_table_replaces_previous() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&member_table(), "t").unwrap();
        store.create_table(&member_table(), "t").unwrap();

        let rows = store.execute("SELECT COUNT(*) AS n FROM t").unwrap();
        assert_eq!(rows[0]["n"], json!(2));
    }

    #[test]
    fn test_column_order_is_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&member_table(), "t").unwrap();
        let rows = store.execute("SELECT is_member, age, name FROM t ORDER BY age").unwrap();
        let keys: Vec<&String> = rows[0].keys().collect();

        assert_eq!(keys, vec!["is_member", "age", "name"]);
        assert_eq!(rows[0]["is_member"], json!(0));
    }

    #[test]
    fn test_malformed_sql_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&member_table(), "t").unwrap();
        assert!(matches!(store.execute("SELEC name FRM t"), Err(Text2SqlError::Store(_))));
        assert!(matches!(store.execute("   "), Err(Text2SqlError::Store(_))));
    }

    #[test]
    fn test_drop_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&member_table(), "t").unwrap();
        store.drop_table("t").unwrap();
        assert!(store.execute("SELECT * FROM t").is_err());
    }

    #[test]
    fn test_timestamps_stored_as_text() {
        let raw = Table::new(
            vec!["joined".to_string()],
            vec![vec![Cell::text("2024-01-01 09:30:00")]],
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("test.db"));

        store.create_table(&clean_table(raw).unwrap(), "t").unwrap();
        let rows = store.execute("SELECT joined FROM t").unwrap();
        assert_eq!(rows[0]["joined"], json!("2024-01-01 09:30:00"));
    }

    #[test]
    fn test_temporary_stores_are_isolated() {
        let first = SqliteStore::temporary().unwrap();
        let second = SqliteStore::temporary().unwrap();
        assert_ne!(first.path(), second.path());

        first.create_table(&member_table(), "t").unwrap();
        assert!(second.execute("SELECT * FROM t").is_err());
        assert_eq!(first.execute("SELECT name FROM t").unwrap().len(), 2);
    }

    #[test]
    fn test_temporary_store_removed_on_drop() {
        let store = SqliteStore::temporary().unwrap();
        store.create_table(&member_table(), "t").unwrap();
        let path = store.path().to_path_buf();
        assert!(path.exists());

        let clone = store.clone();
        drop(store);
        assert!(path.exists());

        drop(clone);
        assert!(!path.exists());
    }

    #[test]
    fn test_sql_to_json_non_finite_real_is_null() {
        assert_eq!(sql_to_json(ValueRef::Real(f64::NAN)), Value::Null);
        assert_eq!(sql_to_json(ValueRef::Real(f64::INFINITY)), Value::Null);
        assert_eq!(sql_to_json(ValueRef::Real(1.5)), json!(1.5));
    }

    #[test]
    fn test_sql_to_json_blob_is_lossy_text() {
        assert_eq!(sql_to_json(ValueRef::Blob(b"ab")), json!("ab"));
        assert_eq!(sql_to_json(ValueRef::Blob(&[0x61, 0xff])), json!("a\u{fffd}"));
        assert_eq!(sql_to_json(ValueRef::Null), Value::Null);
    }
}
