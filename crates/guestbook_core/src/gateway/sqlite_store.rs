//! SQLite table gateway.
//!
//! # Responsibility
//! - Read every column of the guest table with SQLite's dynamic typing.
//! - Replace the table with the canonical layout on write.
//!
//! # Invariants
//! - A missing database file or table reads as `Ok(None)`; reads never
//!   create files.
//! - Writes run in one transaction: readers see the old or the new table,
//!   never a mix.
//! - Rows are read in insertion order (`rowid`).

use super::{GatewayResult, PersistenceGateway};
use crate::db::{open_db, stored_schema_version, table_exists, validate_table_name};
use crate::schema::{CanonicalRecords, FieldType, RawRecords, RawValue};
use log::{debug, error, info};
use rusqlite::types::{Value, ValueRef};
use rusqlite::params_from_iter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Table used when none is configured.
pub const DEFAULT_TABLE: &str = "guests";

/// Guest list stored as one table in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteGateway {
    path: PathBuf,
    table: String,
}

impl SqliteGateway {
    /// Gateway on the [`DEFAULT_TABLE`] of the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: DEFAULT_TABLE.to_string(),
        }
    }

    /// Gateway on a custom table.
    ///
    /// # Errors
    /// - Returns an error when `table` is not a plain SQL identifier.
    pub fn with_table(path: impl AsRef<Path>, table: &str) -> GatewayResult<Self> {
        validate_table_name(table)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn read_table(&self) -> GatewayResult<Option<RawRecords>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let conn = open_db(&self.path)?;
        if !table_exists(&conn, &self.table)? {
            return Ok(None);
        }

        let written_with = stored_schema_version(&conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT * FROM \"{}\" ORDER BY rowid;",
            self.table
        ))?;
        let columns: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let width = columns.len();

        let mut table = RawRecords::new(columns);
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for index in 0..width {
                cells.push(raw_from_sql(row.get_ref(index)?));
            }
            table.push_row(cells);
        }

        debug!(
            "event=store_read module=gateway status=decoded backend=sqlite schema_version={} columns={} rows={}",
            written_with,
            width,
            table.row_count()
        );
        Ok(Some(table))
    }

    fn write_table(&self, records: &CanonicalRecords) -> GatewayResult<()> {
        let mut conn = open_db(&self.path)?;
        let schema = records.schema();

        let column_defs = schema
            .fields()
            .iter()
            .map(|spec| {
                format!(
                    "\"{}\" {}",
                    spec.field.column_name(),
                    column_type(spec.field_type)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let column_list = schema
            .column_names()
            .iter()
            .map(|name| format!("\"{name}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = (1..=schema.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");

        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\";
             CREATE TABLE \"{table}\" ({column_defs});",
            table = self.table
        ))?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO \"{}\" ({column_list}) VALUES ({placeholders});",
                self.table
            ))?;
            for row in records.rows() {
                insert.execute(params_from_iter(row.iter().map(sql_from_raw)))?;
            }
        }
        tx.execute_batch(&format!(
            "PRAGMA user_version = {};",
            schema.version().number()
        ))?;
        tx.commit()?;
        Ok(())
    }
}

impl PersistenceGateway for SqliteGateway {
    fn read(&self) -> GatewayResult<Option<RawRecords>> {
        let started_at = Instant::now();
        match self.read_table() {
            Ok(table) => {
                info!(
                    "event=store_read module=gateway status=ok backend=sqlite found={} duration_ms={}",
                    table.is_some(),
                    started_at.elapsed().as_millis()
                );
                Ok(table)
            }
            Err(err) => {
                error!(
                    "event=store_read module=gateway status=error backend=sqlite duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn write(&mut self, records: &CanonicalRecords) -> GatewayResult<()> {
        let started_at = Instant::now();
        match self.write_table(records) {
            Ok(()) => {
                info!(
                    "event=store_write module=gateway status=ok backend=sqlite rows={} duration_ms={}",
                    records.row_count(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=store_write module=gateway status=error backend=sqlite duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(err)
            }
        }
    }

    fn describe(&self) -> String {
        format!("sqlite:{}#{}", self.path.display(), self.table)
    }
}

fn column_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Text => "TEXT NOT NULL DEFAULT ''",
        FieldType::Count | FieldType::Flag => "INTEGER NOT NULL DEFAULT 0",
    }
}

fn raw_from_sql(value: ValueRef<'_>) -> RawValue {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => RawValue::Missing,
        ValueRef::Integer(number) => RawValue::Integer(number),
        ValueRef::Real(number) => RawValue::Real(number),
        ValueRef::Text(bytes) => RawValue::Text(String::from_utf8_lossy(bytes).into_owned()),
    }
}

fn sql_from_raw(value: &RawValue) -> Value {
    match value {
        RawValue::Missing => Value::Null,
        RawValue::Bool(flag) => Value::Integer(i64::from(*flag)),
        RawValue::Integer(number) => Value::Integer(*number),
        RawValue::Real(number) => Value::Real(*number),
        RawValue::Text(text) => Value::Text(text.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::{raw_from_sql, sql_from_raw, SqliteGateway, DEFAULT_TABLE};
    use crate::gateway::{GatewayError, PersistenceGateway};
    use crate::schema::RawValue;
    use rusqlite::types::{Value, ValueRef};

    #[test]
    fn sql_values_map_to_raw_cells() {
        assert_eq!(raw_from_sql(ValueRef::Null), RawValue::Missing);
        assert_eq!(raw_from_sql(ValueRef::Integer(3)), RawValue::Integer(3));
        assert_eq!(
            raw_from_sql(ValueRef::Text("済".as_bytes())),
            RawValue::Text("済".to_string())
        );
        assert_eq!(sql_from_raw(&RawValue::Bool(true)), Value::Integer(1));
        assert_eq!(sql_from_raw(&RawValue::Missing), Value::Null);
    }

    #[test]
    fn missing_database_reads_as_no_data_without_creating_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("guests.db");
        let gateway = SqliteGateway::new(&path);

        assert_eq!(gateway.table(), DEFAULT_TABLE);
        assert_eq!(gateway.read().unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn rejects_unsafe_table_names() {
        let err = SqliteGateway::with_table("/tmp/x.db", "a\"b").unwrap_err();
        assert!(matches!(err, GatewayError::Db(_)));
    }
}
