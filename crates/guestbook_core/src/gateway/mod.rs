//! Persistence gateways.
//!
//! # Responsibility
//! - Define the storage contract the ledger session talks to.
//! - Provide in-memory, CSV file and SQLite table backends.
//!
//! # Invariants
//! - `read` returns `Ok(None)` when the store holds no guest list yet; it
//!   never invents data.
//! - `write` receives canonical fields only and replaces the stored list.
//! - Gateways do not reconcile or coerce; that is the caller's job.

pub mod csv_store;
pub mod memory;
pub mod sqlite_store;

use crate::db::DbError;
use crate::schema::{CanonicalRecords, RawRecords};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::path::Path;

pub use csv_store::CsvGateway;
pub use memory::MemoryGateway;
pub use sqlite_store::SqliteGateway;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Storage failure reported by a gateway.
#[derive(Debug)]
pub enum GatewayError {
    /// The store exists but this process may not read or write it.
    PermissionDenied(String),
    /// The store cannot be reached or was configured wrongly.
    Unavailable(String),
    /// The store was reached but its content is not tabular.
    Malformed(String),
    Io(io::Error),
    Csv(csv::Error),
    Db(DbError),
}

impl GatewayError {
    /// Stable short code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "permission_denied",
            Self::Unavailable(_) => "unavailable",
            Self::Malformed(_) => "malformed",
            Self::Io(_) => "io",
            Self::Csv(_) => "csv",
            Self::Db(_) => "db",
        }
    }
}

impl Display for GatewayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied(details) => write!(f, "permission denied: {details}"),
            Self::Unavailable(details) => write!(f, "store unavailable: {details}"),
            Self::Malformed(details) => write!(f, "malformed store content: {details}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::Csv(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GatewayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Csv(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for GatewayError {
    fn from(value: io::Error) -> Self {
        match value.kind() {
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(value.to_string()),
            _ => Self::Io(value),
        }
    }
}

impl From<csv::Error> for GatewayError {
    fn from(value: csv::Error) -> Self {
        if let csv::ErrorKind::Io(err) = value.kind() {
            if err.kind() == io::ErrorKind::PermissionDenied {
                return Self::PermissionDenied(err.to_string());
            }
        }
        Self::Csv(value)
    }
}

impl From<DbError> for GatewayError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for GatewayError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for a guest list.
pub trait PersistenceGateway {
    /// Reads the stored table as-is; `Ok(None)` means no data.
    fn read(&self) -> GatewayResult<Option<RawRecords>>;

    /// Replaces the stored table with `records`.
    fn write(&mut self, records: &CanonicalRecords) -> GatewayResult<()>;

    /// Short human-readable description for logs and CLI output.
    fn describe(&self) -> String;
}

impl<G: PersistenceGateway + ?Sized> PersistenceGateway for Box<G> {
    fn read(&self) -> GatewayResult<Option<RawRecords>> {
        (**self).read()
    }

    fn write(&mut self, records: &CanonicalRecords) -> GatewayResult<()> {
        (**self).write(records)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Opens the backend matching the file extension of `path`.
///
/// - `.csv` -> [`CsvGateway`]
/// - `.db`, `.sqlite`, `.sqlite3` -> [`SqliteGateway`] on `table`
///   (default `guests`)
///
/// Opening never touches the file; failures surface on `read`/`write`.
///
/// # Errors
/// - [`GatewayError::Unavailable`] for an unknown extension or an invalid
///   table name.
pub fn open_store(
    path: impl AsRef<Path>,
    table: Option<&str>,
) -> GatewayResult<Box<dyn PersistenceGateway>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvGateway::new(path))),
        "db" | "sqlite" | "sqlite3" => {
            let gateway = match table {
                Some(table) => SqliteGateway::with_table(path, table)?,
                None => SqliteGateway::new(path),
            };
            Ok(Box::new(gateway))
        }
        other => Err(GatewayError::Unavailable(format!(
            "unsupported store extension `{other}`; expected csv|db|sqlite|sqlite3"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{open_store, GatewayError};
    use std::io;

    #[test]
    fn open_store_picks_backend_by_extension() {
        let csv = open_store("/tmp/guests.CSV", None).unwrap();
        assert!(csv.describe().starts_with("csv:"));

        let sqlite = open_store("/tmp/guests.sqlite3", Some("party")).unwrap();
        assert!(sqlite.describe().ends_with("#party"));

        let err = open_store("/tmp/guests.xlsx", None).err().unwrap();
        assert!(matches!(err, GatewayError::Unavailable(_)));
    }

    #[test]
    fn permission_errors_get_their_own_kind() {
        let err = GatewayError::from(io::Error::new(io::ErrorKind::PermissionDenied, "ro"));
        assert_eq!(err.code(), "permission_denied");

        let err = GatewayError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert_eq!(err.code(), "io");
    }
}
