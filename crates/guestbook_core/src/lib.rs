//! Core logic for the guestbook ledger.
//!
//! Loads a guest list of whatever shape the store holds, reconciles it onto
//! the canonical schema, and computes fees and totals over it.

pub mod db;
pub mod fees;
pub mod gateway;
pub mod logging;
pub mod model;
pub mod schema;
pub mod session;

pub use fees::{
    aggregate, format_yen, project, subtotal, Category, DerivedTotals, FeeTable, Headcount,
    RowView, Yen, FEE_TABLE,
};
pub use gateway::{
    open_store, CsvGateway, GatewayError, GatewayResult, MemoryGateway, PersistenceGateway,
    SqliteGateway,
};
pub use logging::{default_log_level, init_logging, logging_status, LogConfig, LoggingError};
pub use model::guest::GuestRecord;
pub use model::ledger::Ledger;
pub use schema::coerce::coerce;
pub use schema::reconcile::{reconcile, reconcile_or_default, LoadFailure, ReconcileError};
pub use schema::{
    CanonicalRecords, CanonicalSchema, Field, FieldType, FieldValue, RawRecords, RawValue,
    SchemaVersion,
};
pub use session::{EditError, LedgerSession, LedgerState, LoadReport, LoadSource, SaveFailure};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
