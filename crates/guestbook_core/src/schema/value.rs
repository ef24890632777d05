//! Raw and typed cell values plus the tabular containers that carry them.

use super::{CanonicalSchema, Field};
use std::fmt::{Display, Formatter};

static MISSING: RawValue = RawValue::Missing;

/// A cell as delivered by a storage backend, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Absent column, empty cell or SQL `NULL`.
    Missing,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl RawValue {
    /// Builds a value from a textual cell; an empty cell is [`RawValue::Missing`].
    pub fn from_cell(cell: &str) -> Self {
        if cell.is_empty() {
            Self::Missing
        } else {
            Self::Text(cell.to_string())
        }
    }
}

impl Display for RawValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Real(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// A coerced value of a canonical field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    /// Signed; the coercer does not clamp.
    Count(i64),
    Flag(bool),
}

impl FieldValue {
    /// Converts back to a raw cell for writing. Feeding the result through
    /// the coercer yields `self` again.
    pub fn into_raw(self) -> RawValue {
        match self {
            Self::Text(value) => RawValue::Text(value),
            Self::Count(value) => RawValue::Integer(value),
            Self::Flag(value) => RawValue::Bool(value),
        }
    }
}

/// Untyped table: arbitrary headers and rows of raw cells.
///
/// Rows may be shorter or longer than the header; readers treat cells past
/// the end of a row as missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecords {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl RawRecords {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Vec<Vec<RawValue>>) -> Self {
        self.rows = rows;
        self
    }

    pub fn push_row(&mut self, row: Vec<RawValue>) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// No header and no data at all.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.rows.is_empty()
    }

    /// Cell at `(row, column)`, or [`RawValue::Missing`] when out of range.
    pub fn cell(&self, row: usize, column: usize) -> &RawValue {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&MISSING)
    }
}

/// Table whose columns are exactly the fields of a [`CanonicalSchema`], in
/// canonical order. Cells are still raw; the coercer types them.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecords {
    schema: CanonicalSchema,
    rows: Vec<Vec<RawValue>>,
}

impl CanonicalRecords {
    /// Builds canonical records from rows already laid out in schema order.
    ///
    /// Rows are padded with [`RawValue::Missing`] or truncated to the schema
    /// width so the column invariant always holds.
    pub fn new(schema: CanonicalSchema, rows: Vec<Vec<RawValue>>) -> Self {
        let width = schema.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, RawValue::Missing);
                row
            })
            .collect();
        Self { schema, rows }
    }

    pub fn schema(&self) -> &CanonicalSchema {
        &self.schema
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.schema.column_names()
    }

    /// Cell of `field` in `row`, if the schema carries the field.
    pub fn value(&self, row: usize, field: Field) -> Option<&RawValue> {
        let column = self.schema.position(field)?;
        self.rows.get(row).and_then(|cells| cells.get(column))
    }

    /// Flattens into an untyped table with canonical headers.
    pub fn to_raw(&self) -> RawRecords {
        RawRecords::new(self.column_names()).with_rows(self.rows.clone())
    }
}
