//! Guest record.
//!
//! # Responsibility
//! - Hold one guest entry with per-category headcounts and payment state.
//! - Clamp incoming counts at the record boundary.
//!
//! # Invariants
//! - Counts are `u32`; negative coerced values clamp to 0 on the way in.
//! - Derived figures (subtotal) are never stored on the record.

use crate::fees::Category;
use crate::schema::{CanonicalSchema, Field, FieldValue};
use serde::{Deserialize, Serialize};

/// One row of the guest list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestRecord {
    pub name: String,
    pub count_adult: u32,
    pub count_child: u32,
    /// Added in schema v2; older lists load with 0.
    pub count_teacher: u32,
    pub paid: bool,
    pub note: String,
}

impl GuestRecord {
    /// Creates an unpaid record with no headcounts.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            count_adult: 0,
            count_child: 0,
            count_teacher: 0,
            paid: false,
            note: String::new(),
        }
    }

    /// Creates an unpaid record with the given headcounts.
    pub fn with_counts(name: impl Into<String>, adult: u32, child: u32, teacher: u32) -> Self {
        Self {
            count_adult: adult,
            count_child: child,
            count_teacher: teacher,
            ..Self::new(name)
        }
    }

    /// Builds a record from schema defaults only.
    pub fn from_defaults(schema: &CanonicalSchema) -> Self {
        Self::from_values(&schema.default_row(), schema)
    }

    /// Builds a record from a coerced canonical row.
    ///
    /// Fields the schema does not carry keep their zero value; values of the
    /// wrong type are ignored.
    pub fn from_values(values: &[FieldValue], schema: &CanonicalSchema) -> Self {
        let mut record = Self::new(String::new());
        for (spec, value) in schema.fields().iter().zip(values) {
            record.set_field(spec.field, value.clone());
        }
        record
    }

    pub fn count(&self, category: Category) -> u32 {
        match category {
            Category::Adult => self.count_adult,
            Category::Child => self.count_child,
            Category::Teacher => self.count_teacher,
        }
    }

    pub fn set_count(&mut self, category: Category, count: u32) {
        match category {
            Category::Adult => self.count_adult = count,
            Category::Child => self.count_child = count,
            Category::Teacher => self.count_teacher = count,
        }
    }

    /// Total people on this row.
    pub fn headcount(&self) -> u64 {
        Category::ALL
            .into_iter()
            .map(|category| u64::from(self.count(category)))
            .sum()
    }

    /// Current value of `field`.
    pub fn field_value(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Text(self.name.clone()),
            Field::CountAdult => FieldValue::Count(i64::from(self.count_adult)),
            Field::CountChild => FieldValue::Count(i64::from(self.count_child)),
            Field::CountTeacher => FieldValue::Count(i64::from(self.count_teacher)),
            Field::Paid => FieldValue::Flag(self.paid),
            Field::Note => FieldValue::Text(self.note.clone()),
        }
    }

    /// Assigns `value` to `field`, clamping counts into `0..=u32::MAX`.
    ///
    /// Returns `false` and leaves the record unchanged when the value type
    /// does not match the field type.
    pub fn set_field(&mut self, field: Field, value: FieldValue) -> bool {
        match (field, value) {
            (Field::Name, FieldValue::Text(text)) => self.name = text,
            (Field::Note, FieldValue::Text(text)) => self.note = text,
            (Field::Paid, FieldValue::Flag(flag)) => self.paid = flag,
            (Field::CountAdult, FieldValue::Count(count)) => {
                self.count_adult = clamp_count(count)
            }
            (Field::CountChild, FieldValue::Count(count)) => {
                self.count_child = clamp_count(count)
            }
            (Field::CountTeacher, FieldValue::Count(count)) => {
                self.count_teacher = clamp_count(count)
            }
            _ => return false,
        }
        true
    }
}

fn clamp_count(count: i64) -> u32 {
    u32::try_from(count.max(0)).unwrap_or(u32::MAX)
}
