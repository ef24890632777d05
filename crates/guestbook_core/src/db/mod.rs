//! SQLite connection bootstrap.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the table gateway.
//! - Read and record the schema revision a table was written with.
//!
//! # Invariants
//! - The written schema revision is mirrored to `PRAGMA user_version`.
//! - Table names reaching SQL text are validated identifiers.

use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;

pub use open::open_db;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,63}$").expect("valid identifier regex"));

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    InvalidTableName(String),
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::InvalidTableName(name) => write!(
                f,
                "invalid table name `{name}`; expected letters, digits and underscores"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::InvalidTableName(_) => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Validates `name` for use as an unparameterized table identifier.
pub fn validate_table_name(name: &str) -> DbResult<()> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(DbError::InvalidTableName(name.to_string()))
    }
}

/// Returns whether `table` exists in the main schema.
pub fn table_exists(conn: &Connection, table: &str) -> DbResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Schema revision recorded by the last writer, `0` if never written.
pub fn stored_schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::{validate_table_name, DbError};

    #[test]
    fn table_names_must_be_identifiers() {
        assert!(validate_table_name("guests").is_ok());
        assert!(validate_table_name("_party_2024").is_ok());
        assert!(matches!(
            validate_table_name("guests; DROP TABLE x"),
            Err(DbError::InvalidTableName(_))
        ));
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("9lives").is_err());
    }
}
