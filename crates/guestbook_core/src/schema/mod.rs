//! Canonical guest-list schema.
//!
//! # Responsibility
//! - Enumerate the canonical fields, their types and defaults.
//! - Track which schema revision introduced each field.
//! - Resolve raw column headers (including renamed/legacy ones) to fields.
//!
//! # Invariants
//! - Field order is fixed: `name, count_adult, count_child, count_teacher,
//!   paid, note`.
//! - Revisions are additive; a field is never removed or renamed in place.
//!
//! # See also
//! - `reconcile` for mapping raw tables onto this schema.

pub mod coerce;
pub mod reconcile;
mod value;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use value::{CanonicalRecords, FieldValue, RawRecords, RawValue};

static HEADER_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("valid header separator regex"));

/// Schema revision of a persisted guest list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    /// Adult/child headcounts only.
    V1 = 1,
    /// Adds `count_teacher`.
    V2 = 2,
}

impl SchemaVersion {
    /// Revision written by this build.
    pub const CURRENT: SchemaVersion = SchemaVersion::V2;

    pub fn number(self) -> u32 {
        self as u32
    }
}

/// Canonical field identifiers, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Name,
    CountAdult,
    CountChild,
    CountTeacher,
    Paid,
    Note,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::CountAdult,
        Field::CountChild,
        Field::CountTeacher,
        Field::Paid,
        Field::Note,
    ];

    /// Column name emitted by writers.
    pub fn column_name(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::CountAdult => "count_adult",
            Self::CountChild => "count_child",
            Self::CountTeacher => "count_teacher",
            Self::Paid => "paid",
            Self::Note => "note",
        }
    }

    pub fn field_type(self) -> FieldType {
        match self {
            Self::Name | Self::Note => FieldType::Text,
            Self::CountAdult | Self::CountChild | Self::CountTeacher => FieldType::Count,
            Self::Paid => FieldType::Flag,
        }
    }

    /// First schema revision that carries this field.
    pub fn since(self) -> SchemaVersion {
        match self {
            Self::CountTeacher => SchemaVersion::V2,
            _ => SchemaVersion::V1,
        }
    }

    // Headers seen in older sheets. The Japanese labels come from the
    // spreadsheet the ledger was first kept in.
    fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Name => &["name", "guest", "guest_name", "名前", "氏名"],
            Self::CountAdult => &["count_adult", "adult", "adults", "大人"],
            Self::CountChild => &["count_child", "child", "children", "子供", "子ども"],
            Self::CountTeacher => &["count_teacher", "teacher", "teachers", "先生"],
            Self::Paid => &["paid", "collected", "集金済", "集金済み"],
            Self::Note => &["note", "notes", "memo", "備考", "メモ"],
        }
    }

    /// Resolves a raw column header to a canonical field.
    ///
    /// Matching ignores case, surrounding whitespace, a leading BOM and the
    /// separators `_`, `-` and space, so `countAdult`, `Count Adult` and
    /// `count_adult` all resolve to [`Field::CountAdult`].
    pub fn from_header(header: &str) -> Option<Field> {
        let wanted = normalize_header(header);
        if wanted.is_empty() {
            return None;
        }
        Self::ALL.into_iter().find(|field| {
            field
                .aliases()
                .iter()
                .any(|alias| normalize_header(alias) == wanted)
        })
    }
}

fn normalize_header(header: &str) -> String {
    let trimmed = header.trim_start_matches('\u{feff}').trim();
    HEADER_SEPARATOR_RE
        .replace_all(trimmed, "")
        .to_lowercase()
}

/// Value type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text; missing becomes empty.
    Text,
    /// Integer headcount; unparseable becomes 0.
    Count,
    /// Strict boolean; anything outside the truthy set is `false`.
    Flag,
}

impl FieldType {
    pub fn default_value(self) -> FieldValue {
        match self {
            Self::Text => FieldValue::Text(String::new()),
            Self::Count => FieldValue::Count(0),
            Self::Flag => FieldValue::Flag(false),
        }
    }
}

/// One `(field, type, default)` entry of the canonical schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    pub field_type: FieldType,
    pub default: FieldValue,
    pub since: SchemaVersion,
}

impl FieldSpec {
    fn of(field: Field) -> Self {
        Self {
            field,
            field_type: field.field_type(),
            default: field.field_type().default_value(),
            since: field.since(),
        }
    }
}

/// Ordered canonical field set for one schema revision.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSchema {
    version: SchemaVersion,
    fields: Vec<FieldSpec>,
}

impl CanonicalSchema {
    /// Schema written by this build.
    pub fn current() -> Self {
        Self::for_version(SchemaVersion::CURRENT)
    }

    pub fn for_version(version: SchemaVersion) -> Self {
        let fields = Field::ALL
            .into_iter()
            .filter(|field| field.since() <= version)
            .map(FieldSpec::of)
            .collect();
        Self { version, fields }
    }

    pub fn version(&self) -> SchemaVersion {
        self.version
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: Field) -> bool {
        self.position(field).is_some()
    }

    /// Index of `field` in canonical order.
    pub fn position(&self, field: Field) -> Option<usize> {
        self.fields.iter().position(|spec| spec.field == field)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .map(|spec| spec.field.column_name())
            .collect()
    }

    /// A row made only of schema defaults, in canonical order.
    pub fn default_row(&self) -> Vec<FieldValue> {
        self.fields.iter().map(|spec| spec.default.clone()).collect()
    }
}

impl Default for CanonicalSchema {
    fn default() -> Self {
        Self::current()
    }
}

#[cfg(test)]
mod tests {
    use super::{CanonicalSchema, Field, FieldValue, SchemaVersion};

    #[test]
    fn current_schema_has_canonical_order() {
        let schema = CanonicalSchema::current();
        assert_eq!(
            schema.column_names(),
            vec![
                "name",
                "count_adult",
                "count_child",
                "count_teacher",
                "paid",
                "note"
            ]
        );
        assert_eq!(schema.version(), SchemaVersion::V2);
    }

    #[test]
    fn v1_schema_lacks_teacher_count() {
        let schema = CanonicalSchema::for_version(SchemaVersion::V1);
        assert!(!schema.contains(Field::CountTeacher));
        assert_eq!(schema.position(Field::Paid), Some(3));
    }

    #[test]
    fn headers_resolve_through_aliases() {
        assert_eq!(Field::from_header("countAdult"), Some(Field::CountAdult));
        assert_eq!(Field::from_header(" Count Adult "), Some(Field::CountAdult));
        assert_eq!(Field::from_header("大人"), Some(Field::CountAdult));
        assert_eq!(Field::from_header("\u{feff}名前"), Some(Field::Name));
        assert_eq!(Field::from_header("集金済"), Some(Field::Paid));
        assert_eq!(Field::from_header("個人計"), None);
        assert_eq!(Field::from_header(""), None);
    }

    #[test]
    fn default_row_uses_typed_defaults() {
        let row = CanonicalSchema::current().default_row();
        assert_eq!(row[0], FieldValue::Text(String::new()));
        assert_eq!(row[1], FieldValue::Count(0));
        assert_eq!(row[4], FieldValue::Flag(false));
    }
}
