//! Schema reconciliation.
//!
//! # Responsibility
//! - Map a raw table of arbitrary shape onto the canonical schema.
//! - Substitute the built-in sample ledger when the source is unusable.
//!
//! # Invariants
//! - Output columns are exactly the schema fields, in canonical order.
//! - Raw columns outside the schema are dropped and never written back.
//! - Missing canonical columns are synthesized from schema defaults.
//! - Load failures never propagate as errors; they are reported alongside
//!   the substituted records.

use super::{CanonicalRecords, CanonicalSchema, Field, RawRecords, RawValue};
use crate::gateway::{GatewayError, GatewayResult};
use crate::model::ledger::Ledger;
use log::{debug, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reasons a raw table cannot be read as a guest list at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// Data rows exist but there is no header to name them.
    HeaderlessRows { rows: usize },
    /// Data rows exist but no header matches any canonical field.
    NoCanonicalColumns { columns: Vec<String> },
}

impl Display for ReconcileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderlessRows { rows } => {
                write!(f, "{rows} data row(s) without a header row")
            }
            Self::NoCanonicalColumns { columns } => write!(
                f,
                "none of the {} column(s) matches a guest list field",
                columns.len()
            ),
        }
    }
}

impl Error for ReconcileError {}

/// Why a load fell back instead of using stored data.
#[derive(Debug)]
pub enum LoadFailure {
    /// The store could not be read.
    Unreadable(GatewayError),
    /// The store holds no guest list yet.
    Absent,
    /// The store was read but does not look like a guest list.
    StructurallyInvalid(ReconcileError),
}

impl LoadFailure {
    /// Stable short code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreadable(_) => "unreadable",
            Self::Absent => "absent",
            Self::StructurallyInvalid(_) => "structurally_invalid",
        }
    }

    /// Whether the store may still hold a guest list that was not used.
    pub fn store_may_hold_data(&self) -> bool {
        !matches!(self, Self::Absent)
    }
}

impl Display for LoadFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unreadable(err) => write!(f, "guest list could not be read: {err}"),
            Self::Absent => write!(f, "no stored guest list found"),
            Self::StructurallyInvalid(err) => write!(f, "stored guest list is invalid: {err}"),
        }
    }
}

impl Error for LoadFailure {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unreadable(err) => Some(err),
            Self::Absent => None,
            Self::StructurallyInvalid(err) => Some(err),
        }
    }
}

impl From<GatewayError> for LoadFailure {
    fn from(value: GatewayError) -> Self {
        Self::Unreadable(value)
    }
}

impl From<ReconcileError> for LoadFailure {
    fn from(value: ReconcileError) -> Self {
        Self::StructurallyInvalid(value)
    }
}

/// Canonical records plus a description of what reconciliation changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub records: CanonicalRecords,
    /// Canonical fields found in the raw table, with the header they came from.
    pub matched: Vec<(Field, String)>,
    /// Canonical fields filled with defaults because no column carried them.
    pub synthesized: Vec<Field>,
    /// Raw headers that were discarded.
    pub dropped: Vec<String>,
}

/// Result of the load-time pipeline: records are always usable.
#[derive(Debug)]
pub struct LoadOutcome {
    pub reconciled: Reconciled,
    /// Set when `reconciled` holds the built-in sample instead of stored data.
    pub failure: Option<LoadFailure>,
}

impl LoadOutcome {
    pub fn used_default(&self) -> bool {
        self.failure.is_some()
    }
}

/// Maps `raw` onto `schema`.
///
/// Header matching goes through [`Field::from_header`], so renamed columns
/// from older revisions are picked up. If two headers resolve to the same
/// field the first one wins.
///
/// # Errors
/// - [`ReconcileError::HeaderlessRows`] when rows exist without any header.
/// - [`ReconcileError::NoCanonicalColumns`] when rows exist but no header is
///   recognized.
pub fn reconcile(
    raw: &RawRecords,
    schema: &CanonicalSchema,
) -> Result<Reconciled, ReconcileError> {
    if raw.columns().is_empty() && raw.row_count() > 0 {
        return Err(ReconcileError::HeaderlessRows {
            rows: raw.row_count(),
        });
    }

    let mut sources: Vec<Option<usize>> = vec![None; schema.len()];
    let mut matched = Vec::new();
    let mut dropped = Vec::new();

    for (column, header) in raw.columns().iter().enumerate() {
        let slot = Field::from_header(header)
            .and_then(|field| schema.position(field).map(|position| (field, position)));
        match slot {
            Some((field, position)) if sources[position].is_none() => {
                sources[position] = Some(column);
                matched.push((field, header.clone()));
            }
            _ => dropped.push(header.clone()),
        }
    }

    if matched.is_empty() && raw.row_count() > 0 {
        return Err(ReconcileError::NoCanonicalColumns {
            columns: raw.columns().to_vec(),
        });
    }

    let synthesized: Vec<Field> = schema
        .fields()
        .iter()
        .zip(&sources)
        .filter(|(_, source)| source.is_none())
        .map(|(spec, _)| spec.field)
        .collect();

    let rows = (0..raw.row_count())
        .map(|row| {
            schema
                .fields()
                .iter()
                .zip(&sources)
                .map(|(spec, source)| match source {
                    Some(column) => raw.cell(row, *column).clone(),
                    None => spec.default.clone().into_raw(),
                })
                .collect::<Vec<RawValue>>()
        })
        .collect();

    debug!(
        "event=reconcile module=schema status=ok rows={} matched={} synthesized={} dropped={}",
        raw.row_count(),
        matched.len(),
        synthesized.len(),
        dropped.len()
    );

    Ok(Reconciled {
        records: CanonicalRecords::new(schema.clone(), rows),
        matched,
        synthesized,
        dropped,
    })
}

/// Runs the load-time pipeline over a gateway read result.
///
/// Unreadable, absent or structurally invalid sources are replaced by
/// [`Ledger::default_sample`]. A table with a header and no rows is a valid
/// empty guest list.
pub fn reconcile_or_default(
    source: GatewayResult<Option<RawRecords>>,
    schema: &CanonicalSchema,
) -> LoadOutcome {
    let attempt = match source {
        Ok(Some(raw)) if !raw.is_empty() => reconcile(&raw, schema).map_err(LoadFailure::from),
        Ok(_) => Err(LoadFailure::Absent),
        Err(err) => Err(LoadFailure::from(err)),
    };

    match attempt {
        Ok(reconciled) => LoadOutcome {
            reconciled,
            failure: None,
        },
        Err(failure) => {
            warn!(
                "event=reconcile module=schema status=fallback source=default_sample error_code={}",
                failure.code()
            );
            LoadOutcome {
                reconciled: Reconciled {
                    records: Ledger::default_sample().to_canonical(schema),
                    matched: Vec::new(),
                    synthesized: Vec::new(),
                    dropped: Vec::new(),
                },
                failure: Some(failure),
            }
        }
    }
}
