//! Ledger session state.
//!
//! # Responsibility
//! - Own the in-memory ledger of one editing session.
//! - Track clean/dirty status across load, edit and save.
//! - Run the load pipeline (read -> reconcile -> coerce) and the save path.
//!
//! # Invariants
//! - `Loaded` and `Saved` are clean; `Edited` is dirty.
//! - A failed load never empties a loaded ledger; before the first
//!   successful load it installs the built-in sample.
//! - A sample installed over an unreadable or invalid store is never safe
//!   to write back (`LoadReport::safe_to_overwrite`).
//! - A failed save leaves the ledger and its dirty flag untouched.
//! - Only canonical fields are written; derived totals never are.
//! - Single writer, last save wins.

use crate::fees::{aggregate, project, DerivedTotals, RowView};
use crate::gateway::{GatewayError, PersistenceGateway};
use crate::model::guest::GuestRecord;
use crate::model::ledger::Ledger;
use crate::schema::coerce::coerce;
use crate::schema::reconcile::{reconcile_or_default, LoadFailure};
use crate::schema::{CanonicalSchema, Field, FieldValue, RawValue};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerState {
    /// Nothing loaded yet; edits are rejected.
    Uninitialized,
    /// Freshly loaded (or defaulted); clean.
    Loaded,
    /// Has edits not yet saved; dirty.
    Edited,
    /// Last save succeeded; clean.
    Saved,
}

impl LedgerState {
    pub fn is_dirty(self) -> bool {
        matches!(self, Self::Edited)
    }

    pub fn is_clean(self) -> bool {
        matches!(self, Self::Loaded | Self::Saved)
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Loaded => "loaded",
            Self::Edited => "edited",
            Self::Saved => "saved",
        }
    }
}

/// Where the ledger came from after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadSource {
    /// Stored data was read and reconciled.
    Store,
    /// The built-in sample replaced unusable data.
    DefaultSample,
    /// The load failed and the previous in-memory ledger was kept.
    Retained,
}

/// Informational result of [`LedgerSession::load`].
#[derive(Debug)]
pub struct LoadReport {
    pub source: LoadSource,
    /// Why stored data was not used, if it was not.
    pub failure: Option<LoadFailure>,
    /// Raw headers that were discarded.
    pub dropped_columns: Vec<String>,
    /// Canonical fields filled with defaults.
    pub synthesized_fields: Vec<Field>,
    /// Rows in the ledger after the load.
    pub rows: usize,
}

impl LoadReport {
    /// Whether saving this session may replace what the store holds.
    ///
    /// False when the sample stands in for a store that exists but could
    /// not be used: writing would discard the stored list.
    pub fn safe_to_overwrite(&self) -> bool {
        match (self.source, &self.failure) {
            (LoadSource::DefaultSample, Some(failure)) => !failure.store_may_hold_data(),
            _ => true,
        }
    }
}

/// Rejected edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    NotLoaded,
    RowOutOfRange { index: usize, len: usize },
    /// The value type does not fit the field.
    TypeMismatch { field: Field },
}

impl Display for EditError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "no ledger loaded"),
            Self::RowOutOfRange { index, len } => {
                write!(f, "row {index} out of range (ledger has {len} rows)")
            }
            Self::TypeMismatch { field } => {
                write!(f, "value type does not match field `{}`", field.column_name())
            }
        }
    }
}

impl Error for EditError {}

/// Recoverable save failure; the session stays usable.
#[derive(Debug)]
pub enum SaveFailure {
    /// Nothing loaded, so there is nothing to save.
    NotLoaded,
    /// The gateway refused or failed the write.
    Rejected(GatewayError),
}

impl Display for SaveFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotLoaded => write!(f, "no ledger loaded"),
            Self::Rejected(err) => write!(f, "save failed: {err}"),
        }
    }
}

impl Error for SaveFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotLoaded => None,
            Self::Rejected(err) => Some(err),
        }
    }
}

impl From<GatewayError> for SaveFailure {
    fn from(value: GatewayError) -> Self {
        Self::Rejected(value)
    }
}

pub type EditResult<T> = Result<T, EditError>;

/// One editing session over one ledger.
#[derive(Debug, Clone)]
pub struct LedgerSession {
    schema: CanonicalSchema,
    ledger: Ledger,
    state: LedgerState,
}

impl LedgerSession {
    /// Creates an uninitialized session on the current schema.
    pub fn new() -> Self {
        Self::with_schema(CanonicalSchema::current())
    }

    pub fn with_schema(schema: CanonicalSchema) -> Self {
        Self {
            schema,
            ledger: Ledger::new(),
            state: LedgerState::Uninitialized,
        }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    /// The live ledger, for binding to a view.
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Loads from `gateway` through reconcile and coerce.
    ///
    /// Never fails: see [`LoadReport`] for what happened. A successful load
    /// replaces the ledger, including unsaved edits.
    pub fn load<G: PersistenceGateway + ?Sized>(&mut self, gateway: &G) -> LoadReport {
        let started_at = Instant::now();
        let outcome = reconcile_or_default(gateway.read(), &self.schema);

        let source = match (&outcome.failure, self.state) {
            (None, _) => LoadSource::Store,
            (Some(_), LedgerState::Uninitialized) => LoadSource::DefaultSample,
            (Some(_), _) => LoadSource::Retained,
        };

        if source != LoadSource::Retained {
            self.ledger = Ledger::from_canonical(&outcome.reconciled.records);
            self.state = LedgerState::Loaded;
        }

        match &outcome.failure {
            None => info!(
                "event=ledger_load module=session status=ok rows={} dropped_columns={} synthesized_fields={} duration_ms={}",
                self.ledger.len(),
                outcome.reconciled.dropped.len(),
                outcome.reconciled.synthesized.len(),
                started_at.elapsed().as_millis()
            ),
            Some(failure) => warn!(
                "event=ledger_load module=session status=fallback source={} rows={} duration_ms={} error_code={} error={}",
                match source {
                    LoadSource::Retained => "retained",
                    _ => "default_sample",
                },
                self.ledger.len(),
                started_at.elapsed().as_millis(),
                failure.code(),
                failure
            ),
        }

        LoadReport {
            source,
            failure: outcome.failure,
            dropped_columns: outcome.reconciled.dropped,
            synthesized_fields: outcome.reconciled.synthesized,
            rows: self.ledger.len(),
        }
    }

    /// Appends a row made of schema defaults and returns its index.
    pub fn add_row(&mut self) -> EditResult<usize> {
        self.ensure_loaded()?;
        let index = self.ledger.push(GuestRecord::from_defaults(&self.schema));
        self.mark_edited();
        Ok(index)
    }

    /// Appends `record` as-is and returns its index.
    pub fn insert_row(&mut self, record: GuestRecord) -> EditResult<usize> {
        self.ensure_loaded()?;
        let index = self.ledger.push(record);
        self.mark_edited();
        Ok(index)
    }

    /// Mutates the row at `index` in place.
    pub fn update_row<F>(&mut self, index: usize, edit: F) -> EditResult<()>
    where
        F: FnOnce(&mut GuestRecord),
    {
        self.ensure_loaded()?;
        let len = self.ledger.len();
        let record = self
            .ledger
            .get_mut(index)
            .ok_or(EditError::RowOutOfRange { index, len })?;
        edit(record);
        self.mark_edited();
        Ok(())
    }

    /// Assigns a typed value to one field; counts are clamped at 0.
    pub fn set_field(&mut self, index: usize, field: Field, value: FieldValue) -> EditResult<()> {
        self.ensure_loaded()?;
        let len = self.ledger.len();
        let record = self
            .ledger
            .get_mut(index)
            .ok_or(EditError::RowOutOfRange { index, len })?;
        if !record.set_field(field, value) {
            return Err(EditError::TypeMismatch { field });
        }
        self.mark_edited();
        Ok(())
    }

    /// Assigns grid input to one field.
    ///
    /// The value goes through the coercer first, so any input is accepted;
    /// negative counts clamp to 0.
    pub fn set_field_raw(
        &mut self,
        index: usize,
        field: Field,
        value: &RawValue,
    ) -> EditResult<()> {
        self.set_field(index, field, coerce(value, field.field_type()))
    }

    /// Removes the row at `index` and returns it.
    pub fn delete_row(&mut self, index: usize) -> EditResult<GuestRecord> {
        self.ensure_loaded()?;
        let len = self.ledger.len();
        let removed = self
            .ledger
            .remove(index)
            .ok_or(EditError::RowOutOfRange { index, len })?;
        self.mark_edited();
        Ok(removed)
    }

    /// Fresh derived totals for the current ledger.
    pub fn totals(&self) -> DerivedTotals {
        aggregate(&self.ledger)
    }

    /// Display rows with their subtotals.
    pub fn rows(&self) -> Vec<RowView<'_>> {
        project(&self.ledger)
    }

    /// Writes canonical fields to `gateway`.
    ///
    /// # Errors
    /// - [`SaveFailure::NotLoaded`] before the first load.
    /// - [`SaveFailure::Rejected`] when the gateway fails; the session keeps
    ///   its ledger and dirty state so the save can be retried.
    pub fn save<G: PersistenceGateway + ?Sized>(
        &mut self,
        gateway: &mut G,
    ) -> Result<(), SaveFailure> {
        if self.state == LedgerState::Uninitialized {
            return Err(SaveFailure::NotLoaded);
        }

        let started_at = Instant::now();
        let records = self.ledger.to_canonical(&self.schema);
        match gateway.write(&records) {
            Ok(()) => {
                self.state = LedgerState::Saved;
                info!(
                    "event=ledger_save module=session status=ok rows={} schema_version={} duration_ms={}",
                    records.row_count(),
                    self.schema.version().number(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                warn!(
                    "event=ledger_save module=session status=error state={} duration_ms={} error_code={} error={}",
                    self.state.as_str(),
                    started_at.elapsed().as_millis(),
                    err.code(),
                    err
                );
                Err(SaveFailure::from(err))
            }
        }
    }

    fn ensure_loaded(&self) -> EditResult<()> {
        match self.state {
            LedgerState::Uninitialized => Err(EditError::NotLoaded),
            _ => Ok(()),
        }
    }

    fn mark_edited(&mut self) {
        self.state = LedgerState::Edited;
    }
}

impl Default for LedgerSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::{EditError, LedgerSession, LedgerState, LoadSource, SaveFailure};
    use crate::gateway::MemoryGateway;
    use crate::model::guest::GuestRecord;
    use crate::schema::{Field, FieldValue, RawRecords, RawValue};

    fn loaded_session() -> (LedgerSession, MemoryGateway) {
        let raw = RawRecords::new(["name", "count_adult", "paid"])
            .with_rows(vec![vec!["Aiko".into(), "2".into(), "済".into()]]);
        let gateway = MemoryGateway::with_records(raw);
        let mut session = LedgerSession::new();
        let report = session.load(&gateway);
        assert_eq!(report.source, LoadSource::Store);
        (session, gateway)
    }

    #[test]
    fn sample_over_unusable_store_is_not_safe_to_overwrite() {
        let mut unreadable = MemoryGateway::new();
        unreadable.set_fail_reads(true);
        let report = LedgerSession::new().load(&unreadable);
        assert_eq!(report.source, LoadSource::DefaultSample);
        assert!(!report.safe_to_overwrite());

        let foreign = MemoryGateway::with_records(
            RawRecords::new(["sku", "qty"]).with_rows(vec![vec!["A-1".into(), "4".into()]]),
        );
        let report = LedgerSession::new().load(&foreign);
        assert_eq!(report.source, LoadSource::DefaultSample);
        assert!(!report.safe_to_overwrite());

        let report = LedgerSession::new().load(&MemoryGateway::new());
        assert_eq!(report.source, LoadSource::DefaultSample);
        assert!(report.safe_to_overwrite());
    }

    #[test]
    fn edits_before_load_are_rejected() {
        let mut session = LedgerSession::new();
        assert_eq!(session.state(), LedgerState::Uninitialized);
        assert_eq!(session.add_row(), Err(EditError::NotLoaded));
        assert!(matches!(
            session.save(&mut MemoryGateway::new()),
            Err(SaveFailure::NotLoaded)
        ));
    }

    #[test]
    fn state_moves_through_loaded_edited_saved() {
        let (mut session, mut gateway) = loaded_session();
        assert_eq!(session.state(), LedgerState::Loaded);
        assert!(!session.is_dirty());

        session
            .set_field(0, Field::CountChild, FieldValue::Count(1))
            .unwrap();
        assert_eq!(session.state(), LedgerState::Edited);

        session.save(&mut gateway).unwrap();
        assert_eq!(session.state(), LedgerState::Saved);
        assert!(session.state().is_clean());
    }

    #[test]
    fn added_rows_use_schema_defaults_not_previous_row() {
        let (mut session, _) = loaded_session();
        let index = session.add_row().unwrap();
        let added = session.ledger().get(index).unwrap();
        assert_eq!(added, &GuestRecord::new(""));
        assert!(!added.paid);
    }

    #[test]
    fn clearing_name_keeps_the_row() {
        let (mut session, _) = loaded_session();
        session
            .set_field_raw(0, Field::Name, &RawValue::Missing)
            .unwrap();
        assert_eq!(session.ledger().len(), 1);
        assert_eq!(session.ledger().get(0).unwrap().name, "");
    }

    #[test]
    fn raw_edits_are_coerced_and_clamped() {
        let (mut session, _) = loaded_session();
        session
            .set_field_raw(0, Field::CountAdult, &RawValue::from("-3"))
            .unwrap();
        session
            .set_field_raw(0, Field::Paid, &RawValue::from("no"))
            .unwrap();
        let record = session.ledger().get(0).unwrap();
        assert_eq!(record.count_adult, 0);
        assert!(!record.paid);
    }

    #[test]
    fn typed_edits_reject_mismatched_values() {
        let (mut session, _) = loaded_session();
        let err = session
            .set_field(0, Field::Paid, FieldValue::Text("yes".to_string()))
            .unwrap_err();
        assert_eq!(err, EditError::TypeMismatch { field: Field::Paid });
        assert_eq!(session.state(), LedgerState::Loaded);
    }

    #[test]
    fn out_of_range_rows_are_rejected() {
        let (mut session, _) = loaded_session();
        assert_eq!(
            session.delete_row(4).unwrap_err(),
            EditError::RowOutOfRange { index: 4, len: 1 }
        );
        assert!(session.update_row(9, |record| record.paid = true).is_err());
    }

    #[test]
    fn failed_save_keeps_session_dirty_and_usable() {
        let (mut session, mut gateway) = loaded_session();
        session.update_row(0, |record| record.count_child = 1).unwrap();
        gateway.set_fail_writes(true);

        let err = session.save(&mut gateway).unwrap_err();

        assert!(matches!(err, SaveFailure::Rejected(_)));
        assert_eq!(session.state(), LedgerState::Edited);
        assert_eq!(session.totals().total_expected, 11_500);

        gateway.set_fail_writes(false);
        session.save(&mut gateway).unwrap();
        assert_eq!(session.state(), LedgerState::Saved);
    }

    #[test]
    fn failed_reload_retains_current_ledger() {
        let (mut session, mut gateway) = loaded_session();
        session.delete_row(0).unwrap();
        gateway.set_fail_reads(true);

        let report = session.load(&gateway);

        assert_eq!(report.source, LoadSource::Retained);
        assert!(report.failure.is_some());
        assert!(session.ledger().is_empty());
        assert_eq!(session.state(), LedgerState::Edited);
    }
}
