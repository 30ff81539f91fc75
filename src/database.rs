//! running generated scripts and reading tables through a caller-owned connection.
//!
//! nothing here parameterises queries: script files are executed verbatim and table
//! names are interpolated as-is, so both must come from a trusted source.

use std::fs;
use std::path::Path;

use log::info;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::dataset::Cell;
use crate::error::{EtlError, Result};

/// column names and rows of a query, in arrival order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// the minimal surface needed from a database connection.
pub trait SqlConnection {
    /// executes a multi-statement batch as one unit.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// runs a single query and collects the full result.
    fn query(&mut self, sql: &str) -> Result<ResultSet>;
}

impl SqlConnection for rusqlite::Connection {
    fn execute_batch(&mut self, sql: &str) -> Result<()> {
        rusqlite::Connection::execute_batch(self, sql)?;
        Ok(())
    }

    fn query(&mut self, sql: &str) -> Result<ResultSet> {
        let mut stmt = self.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut result = stmt.query([])?;
        while let Some(row) = result.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(sqlite_cell(row.get_ref(i)?));
            }
            rows.push(cells);
        }

        Ok(ResultSet { columns, rows })
    }
}

fn sqlite_cell(value: ValueRef<'_>) -> Cell {
    match value {
        ValueRef::Null => Cell::Null,
        ValueRef::Integer(i) => Cell::Integer(i),
        ValueRef::Real(f) => Cell::Float(f),
        ValueRef::Text(bytes) => Cell::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Cell::Other(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

/// executes a `.sql` file against the connection as one batch.
pub fn run_sql_file<C: SqlConnection + ?Sized>(path: &Path, connection: &mut C) -> Result<()> {
    let is_sql = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("sql"));
    if !is_sql {
        return Err(EtlError::UnsupportedFormat(format!(
            "{}: this function only processes .sql files",
            path.display()
        )));
    }

    info!("Running SQL file: {}", path.display());
    let sql = fs::read_to_string(path)?;
    connection.execute_batch(&sql)
}

/// selects every row of `table_name`; the name is interpolated verbatim.
pub fn read_table<C: SqlConnection + ?Sized>(table_name: &str, connection: &mut C) -> Result<ResultSet> {
    connection.query(&format!("SELECT * FROM {table_name};"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use tempfile::tempdir;

    #[test]
    fn test_read_table_in_arrival_order() {
        let mut conn = Connection::open_in_memory().expect("open db");
        SqlConnection::execute_batch(
            &mut conn,
            "CREATE TABLE t (a INTEGER, b TEXT, c REAL);
             INSERT INTO t VALUES (2, 'x', 1.5);
             INSERT INTO t VALUES (1, NULL, NULL);",
        )
        .expect("seed table");

        let result = read_table("t", &mut conn).expect("read table");
        assert_eq!(result.columns, vec!["a", "b", "c"]);
        assert_eq!(
            result.rows,
            vec![
                vec![Cell::Integer(2), Cell::Text("x".into()), Cell::Float(1.5)],
                vec![Cell::Integer(1), Cell::Null, Cell::Null],
            ]
        );
    }

    #[test]
    fn test_blob_is_hex() {
        let mut conn = Connection::open_in_memory().expect("open db");
        let result = conn.query("SELECT x'00ff';").expect("query");
        assert_eq!(result.rows, vec![vec![Cell::Other("00ff".into())]]);
    }

    #[test]
    fn test_run_sql_file_rejects_other_extensions() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("script.txt");
        fs::write(&path, "CREATE TABLE t (a INTEGER);").expect("write script");
        let mut conn = Connection::open_in_memory().expect("open db");
        assert!(matches!(
            run_sql_file(&path, &mut conn),
            Err(EtlError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_run_sql_file_executes_batch() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("seed.SQL");
        fs::write(
            &path,
            "CREATE TABLE t (a INTEGER);\nINSERT INTO t VALUES (1);\nINSERT INTO t VALUES (2);\n",
        )
        .expect("write script");
        let mut conn = Connection::open_in_memory().expect("open db");
        run_sql_file(&path, &mut conn).expect("run script");
        let result = read_table("t", &mut conn).expect("read table");
        assert_eq!(result.rows.len(), 2);
    }

    #[test]
    fn test_missing_table_is_database_error() {
        let mut conn = Connection::open_in_memory().expect("open db");
        assert!(matches!(
            read_table("nowhere", &mut conn),
            Err(EtlError::Database(_))
        ));
    }
}
