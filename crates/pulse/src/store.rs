// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! DuckDB-backed target store.
//!
//! Tables are replaced wholesale inside one transaction: either the new
//! contents are visible after commit, or the previous contents remain.

use crate::error::{PulseError, Result};
use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int32Type, Int64Type};
use arrow_array::{Array, RecordBatch};
use arrow_schema::{DataType, Field};
use diagnostics::*;
use duckdb::types::Value;
use duckdb::{AccessMode, Config, Connection};
use std::path::{Path, PathBuf};

/// Result batches as produced by DuckDB's own Arrow build.
pub type QueryBatch = duckdb::arrow::record_batch::RecordBatch;

pub struct Store {
    conn: Connection,
    location: String,
}

impl Store {
    /// Open (creating if needed) a writable store file.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PulseError::io(parent, e))?;
        }
        let conn = Connection::open(path)?;
        let location = path.display().to_string();
        debug!("Opened store {location}", location);
        Ok(Self { conn, location })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            location: ":memory:".to_string(),
        })
    }

    /// Open an existing store for queries only.
    pub fn open_read_only(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(PulseError::configuration(format!(
                "store {} does not exist; run a build first",
                path.display()
            )));
        }
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;
        Ok(Self {
            conn,
            location: path.display().to_string(),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let found: i64 = self.conn.query_row(
            "SELECT count(*) FROM information_schema.tables WHERE table_name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(found > 0)
    }

    /// Row count of `name`, or `None` when the table has never been written.
    pub fn row_count(&self, name: &str) -> Result<Option<u64>> {
        if !self.table_exists(name)? {
            return Ok(None);
        }
        let sql = format!("SELECT count(*) FROM {}", quote_ident(name));
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(Some(u64::try_from(count).unwrap_or_default()))
    }

    /// Names of all tables, sorted.
    pub fn tables(&self) -> Result<Vec<String>> {
        self.query_strings(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'main' ORDER BY table_name",
        )
    }

    /// First column of every result row, as text.
    pub fn query_strings(&self, sql: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(values)
    }

    /// Atomically replace the contents of `name` with `batch`.
    ///
    /// The table is recreated from the batch schema, so column order and
    /// types always follow the batch. Returns the number of rows written.
    pub fn replace_table(&mut self, name: &str, batch: &RecordBatch) -> Result<usize> {
        let ddl = create_table_sql(name, batch.schema().fields().iter().map(|f| f.as_ref()))?;
        let rows = batch.num_rows();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&ddl)?;
        {
            let mut appender = tx.appender(name)?;
            for row in 0..rows {
                let values = row_values(batch, row)?;
                appender.append_row(duckdb::appender_params_from_iter(values))?;
            }
            appender.flush()?;
        }
        tx.commit()?;

        let location = self.location.as_str();
        debug!("Replaced {name} in {location} with {rows} rows", name, location, rows);
        Ok(rows)
    }

    /// Run `sql` and collect every result batch.
    pub fn query_arrow(&self, sql: &str) -> Result<Vec<QueryBatch>> {
        let mut stmt = self.conn.prepare(sql)?;
        let batches: Vec<QueryBatch> = stmt.query_arrow([])?.collect();
        Ok(batches)
    }

    /// Write the result of `sql` to a CSV file with a header row.
    pub fn copy_to_csv(&self, sql: &str, out: &Path) -> Result<PathBuf> {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PulseError::io(parent, e))?;
        }
        let body = sql.trim().trim_end_matches(';');
        let target = out.display().to_string().replace('\'', "''");
        self.conn
            .execute_batch(&format!("COPY ({body}) TO '{target}' (HEADER, DELIMITER ',')"))?;
        Ok(out.to_path_buf())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_type(field: &Field) -> Result<&'static str> {
    match field.data_type() {
        DataType::Utf8 => Ok("VARCHAR"),
        DataType::Int32 => Ok("INTEGER"),
        DataType::Int64 => Ok("BIGINT"),
        DataType::Float64 => Ok("DOUBLE"),
        other => Err(PulseError::configuration(format!(
            "column {} has unsupported type {other}",
            field.name()
        ))),
    }
}

fn create_table_sql<'a>(name: &str, fields: impl Iterator<Item = &'a Field>) -> Result<String> {
    let mut columns = Vec::new();
    for field in fields {
        let nullability = if field.is_nullable() { "" } else { " NOT NULL" };
        columns.push(format!(
            "{} {}{nullability}",
            quote_ident(field.name()),
            column_type(field)?
        ));
    }
    Ok(format!(
        "CREATE OR REPLACE TABLE {} ({})",
        quote_ident(name),
        columns.join(", ")
    ))
}

fn row_values(batch: &RecordBatch, row: usize) -> Result<Vec<Value>> {
    batch
        .columns()
        .iter()
        .map(|column| {
            if column.is_null(row) {
                return Ok(Value::Null);
            }
            match column.data_type() {
                DataType::Utf8 => Ok(Value::Text(column.as_string::<i32>().value(row).to_string())),
                DataType::Int32 => Ok(Value::Int(column.as_primitive::<Int32Type>().value(row))),
                DataType::Int64 => Ok(Value::BigInt(column.as_primitive::<Int64Type>().value(row))),
                DataType::Float64 => {
                    Ok(Value::Double(column.as_primitive::<Float64Type>().value(row)))
                }
                other => Err(PulseError::configuration(format!(
                    "cannot load column type {other}"
                ))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow_array::{Float64Array, Int32Array, StringArray};
    use arrow_schema::Schema;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn batch(states: &[&str]) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("state", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
            Field::new("amount", DataType::Float64, true),
        ]));
        let n = states.len();
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(states.to_vec())),
                Arc::new(Int32Array::from(vec![2022; n])),
                Arc::new(Float64Array::from(
                    (0..n).map(|i| (i > 0).then_some(i as f64)).collect::<Vec<_>>(),
                )),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_replace_and_count() {
        let mut store = Store::open_in_memory().unwrap();
        assert_eq!(store.row_count("t").unwrap(), None);

        assert_eq!(store.replace_table("t", &batch(&["goa", "kerala"])).unwrap(), 2);
        assert_eq!(store.row_count("t").unwrap(), Some(2));

        assert_eq!(store.replace_table("t", &batch(&["assam"])).unwrap(), 1);
        assert_eq!(store.row_count("t").unwrap(), Some(1));
        assert_eq!(store.tables().unwrap(), vec!["t".to_string()]);
    }

    #[test]
    fn test_nulls_survive_load() {
        let mut store = Store::open_in_memory().unwrap();
        store.replace_table("t", &batch(&["goa", "kerala"])).unwrap();
        let nulls: i64 = store
            .conn
            .query_row("SELECT count(*) FROM t WHERE amount IS NULL", [], |r| r.get(0))
            .unwrap();
        assert_eq!(nulls, 1);
    }

    #[test]
    fn test_ddl_quotes_camel_case() {
        let fields = [
            Field::new("registeredUsers", DataType::Int64, true),
            Field::new("state", DataType::Utf8, false),
        ];
        let sql = create_table_sql("map_user", fields.iter()).unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE TABLE \"map_user\" (\"registeredUsers\" BIGINT, \"state\" VARCHAR NOT NULL)"
        );
    }

    #[test]
    fn test_file_store_read_only_and_csv() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("db").join("pulse.duckdb");
        {
            let mut store = Store::open(&path).unwrap();
            store.replace_table("t", &batch(&["goa", "kerala", "assam"])).unwrap();
        }

        let store = Store::open_read_only(&path).unwrap();
        assert_eq!(store.row_count("t").unwrap(), Some(3));

        let batches = store.query_arrow("SELECT state FROM t ORDER BY state").unwrap();
        let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
        assert_eq!(rows, 3);

        let out = tmp.path().join("out").join("t.csv");
        store.copy_to_csv("SELECT state, year FROM t ORDER BY state;", &out).unwrap();
        let csv = std::fs::read_to_string(&out).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("state,year"));
        assert_eq!(lines.next(), Some("assam,2022"));
    }

    #[test]
    fn test_read_only_missing_store() {
        let tmp = tempdir().unwrap();
        let err = Store::open_read_only(&tmp.path().join("none.duckdb")).err().unwrap();
        assert!(matches!(err, PulseError::Configuration { .. }));
    }
}
