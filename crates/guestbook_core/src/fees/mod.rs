//! Fee calculation.
//!
//! # Responsibility
//! - Price each guest row from fixed per-category unit prices.
//! - Aggregate headcounts and money over a whole ledger.
//! - Provide a display projection that carries derived figures next to rows.
//!
//! # Invariants
//! - Everything here is pure and recomputed from scratch on every call.
//! - Derived figures are never written back to storage.
//! - `outstanding = total_expected - total_collected`; it may go negative.

use crate::model::guest::GuestRecord;
use crate::model::ledger::Ledger;
use serde::{Deserialize, Serialize};

/// Money in whole yen.
pub type Yen = i64;

/// Priced guest category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Adult,
    Child,
    Teacher,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Adult, Category::Child, Category::Teacher];

    pub fn label(self) -> &'static str {
        match self {
            Self::Adult => "adult",
            Self::Child => "child",
            Self::Teacher => "teacher",
        }
    }
}

/// Unit price per category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeTable {
    pub adult: Yen,
    pub child: Yen,
    pub teacher: Yen,
}

impl FeeTable {
    pub const fn price(&self, category: Category) -> Yen {
        match category {
            Category::Adult => self.adult,
            Category::Child => self.child,
            Category::Teacher => self.teacher,
        }
    }
}

/// Prices used by every calculation in this crate.
pub const FEE_TABLE: FeeTable = FeeTable {
    adult: 5000,
    child: 1500,
    teacher: 2000,
};

/// People per category across a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Headcount {
    pub adult: u64,
    pub child: u64,
    pub teacher: u64,
}

impl Headcount {
    pub fn get(&self, category: Category) -> u64 {
        match category {
            Category::Adult => self.adult,
            Category::Child => self.child,
            Category::Teacher => self.teacher,
        }
    }

    pub fn total(&self) -> u64 {
        self.adult + self.child + self.teacher
    }

    fn count_record(&mut self, record: &GuestRecord) {
        self.adult += u64::from(record.count_adult);
        self.child += u64::from(record.count_child);
        self.teacher += u64::from(record.count_teacher);
    }
}

/// Whole-ledger figures for display and printing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DerivedTotals {
    pub headcount: Headcount,
    /// Sum of every row's subtotal.
    pub total_expected: Yen,
    /// Sum of subtotals of rows marked paid.
    pub total_collected: Yen,
    pub outstanding: Yen,
    pub paid_records: usize,
    pub unpaid_records: usize,
}

/// One ledger row with its derived subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowView<'a> {
    pub index: usize,
    #[serde(flatten)]
    pub record: &'a GuestRecord,
    pub subtotal: Yen,
}

/// Fee owed for one row: `Σ count × unit price`.
pub fn subtotal(record: &GuestRecord) -> Yen {
    Category::ALL
        .into_iter()
        .map(|category| Yen::from(record.count(category)) * FEE_TABLE.price(category))
        .sum()
}

/// Aggregates headcounts and money over `ledger`. An empty ledger yields
/// all-zero totals.
pub fn aggregate(ledger: &Ledger) -> DerivedTotals {
    let mut totals = DerivedTotals::default();
    for record in ledger {
        let fee = subtotal(record);
        totals.headcount.count_record(record);
        totals.total_expected += fee;
        if record.paid {
            totals.total_collected += fee;
            totals.paid_records += 1;
        } else {
            totals.unpaid_records += 1;
        }
    }
    totals.outstanding = totals.total_expected - totals.total_collected;
    totals
}

/// Display projection: every row paired with its subtotal.
pub fn project(ledger: &Ledger) -> Vec<RowView<'_>> {
    ledger
        .iter()
        .enumerate()
        .map(|(index, record)| RowView {
            index,
            record,
            subtotal: subtotal(record),
        })
        .collect()
}

/// Formats an amount as `¥12,345` (negative amounts as `-¥12,345`).
pub fn format_yen(amount: Yen) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (position, digit) in digits.chars().enumerate() {
        if position > 0 && (digits.len() - position) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}¥{grouped}")
}
