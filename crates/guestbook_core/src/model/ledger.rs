//! Ordered guest ledger.

use super::guest::GuestRecord;
use crate::schema::coerce::coerce_row;
use crate::schema::{CanonicalRecords, CanonicalSchema};
use serde::{Deserialize, Serialize};

/// Ordered sequence of guest records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    records: Vec<GuestRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<GuestRecord>) -> Self {
        Self { records }
    }

    /// Built-in ledger used when no stored guest list can be loaded.
    ///
    /// Three rows covering every category and both payment states, so a
    /// fresh session shows non-trivial totals:
    ///
    /// | name            | adult | child | teacher | paid  |
    /// |-----------------|-------|-------|---------|-------|
    /// | Sample Family   | 2     | 1     | 0       | true  |
    /// | Sample Teacher  | 0     | 0     | 1       | false |
    /// | Sample Guest    | 1     | 0     | 0       | false |
    pub fn default_sample() -> Self {
        let mut family = GuestRecord::with_counts("Sample Family", 2, 1, 0);
        family.paid = true;
        Self::from_records(vec![
            family,
            GuestRecord::with_counts("Sample Teacher", 0, 0, 1),
            GuestRecord::with_counts("Sample Guest", 1, 0, 0),
        ])
    }

    /// Coerces canonical rows into typed records.
    pub fn from_canonical(records: &CanonicalRecords) -> Self {
        let schema = records.schema();
        let records = records
            .rows()
            .iter()
            .map(|row| GuestRecord::from_values(&coerce_row(row, schema), schema))
            .collect();
        Self { records }
    }

    /// Projects the ledger onto `schema`, canonical fields only.
    pub fn to_canonical(&self, schema: &CanonicalSchema) -> CanonicalRecords {
        let rows = self
            .records
            .iter()
            .map(|record| {
                schema
                    .fields()
                    .iter()
                    .map(|spec| record.field_value(spec.field).into_raw())
                    .collect()
            })
            .collect();
        CanonicalRecords::new(schema.clone(), rows)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GuestRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GuestRecord> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut GuestRecord> {
        self.records.get_mut(index)
    }

    pub fn push(&mut self, record: GuestRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Removes the record at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<GuestRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }
}

impl<'a> IntoIterator for &'a Ledger {
    type Item = &'a GuestRecord;
    type IntoIter = std::slice::Iter<'a, GuestRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
