//! Field value coercion.
//!
//! # Responsibility
//! - Turn any raw cell into the typed value of its canonical field.
//!
//! # Invariants
//! - Coercion is total: every input maps to a value, failures become the
//!   field type's default.
//! - Coercion is idempotent: `coerce(coerce(x).into_raw()) == coerce(x)`.
//! - Counts are truncated toward zero but never clamped here.

use super::{CanonicalSchema, FieldType, FieldValue, RawValue};
use log::debug;

/// Accepted spellings of a set `paid` flag, compared after trim + lowercase.
pub const TRUTHY_VALUES: &[&str] = &["true", "1", "t", "y", "yes", "済", "ok", "o"];

/// Coerces one raw value into the typed value of `field_type`.
pub fn coerce(value: &RawValue, field_type: FieldType) -> FieldValue {
    match field_type {
        FieldType::Text => FieldValue::Text(coerce_text(value)),
        FieldType::Count => FieldValue::Count(coerce_count(value)),
        FieldType::Flag => FieldValue::Flag(coerce_flag(value)),
    }
}

/// Coerces a canonical row, cell by cell, using the schema's field types.
///
/// Cells past the end of `row` are treated as missing.
pub fn coerce_row(row: &[RawValue], schema: &CanonicalSchema) -> Vec<FieldValue> {
    schema
        .fields()
        .iter()
        .enumerate()
        .map(|(index, spec)| match row.get(index) {
            Some(RawValue::Missing) | None => spec.default.clone(),
            Some(value) => coerce(value, spec.field_type),
        })
        .collect()
}

pub fn coerce_text(value: &RawValue) -> String {
    value.to_string()
}

pub fn coerce_count(value: &RawValue) -> i64 {
    match value {
        RawValue::Missing => 0,
        RawValue::Bool(flag) => i64::from(*flag),
        RawValue::Integer(number) => *number,
        RawValue::Real(number) => truncate(*number).unwrap_or_else(|| {
            debug!("event=coerce module=schema status=defaulted field_type=count reason=non_finite");
            0
        }),
        RawValue::Text(text) => parse_count(text).unwrap_or_else(|| {
            debug!("event=coerce module=schema status=defaulted field_type=count reason=unparseable");
            0
        }),
    }
}

pub fn coerce_flag(value: &RawValue) -> bool {
    match value {
        RawValue::Missing => false,
        RawValue::Bool(flag) => *flag,
        RawValue::Integer(number) => *number == 1,
        RawValue::Real(number) => *number == 1.0,
        RawValue::Text(text) => {
            let folded = text.trim().to_lowercase();
            TRUTHY_VALUES.contains(&folded.as_str())
        }
    }
}

fn parse_count(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if let Ok(number) = trimmed.parse::<i64>() {
        return Some(number);
    }
    trimmed.parse::<f64>().ok().and_then(truncate)
}

fn truncate(number: f64) -> Option<i64> {
    if number.is_finite() {
        // `as` saturates at the i64 bounds.
        Some(number.trunc() as i64)
    } else {
        None
    }
}
