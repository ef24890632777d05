//! Terminal and JSON output of the ledger.

use guestbook_core::{format_yen, Category, DerivedTotals, LedgerSession, RowView};
use serde::Serialize;

#[derive(Serialize)]
struct Snapshot<'a> {
    rows: Vec<RowView<'a>>,
    totals: DerivedTotals,
    unsaved_changes: bool,
}

pub fn print_json(session: &LedgerSession) -> serde_json::Result<()> {
    let snapshot = Snapshot {
        rows: session.rows(),
        totals: session.totals(),
        unsaved_changes: session.is_dirty(),
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

pub fn print_table(session: &LedgerSession) {
    let rows = session.rows();
    let name_width = rows
        .iter()
        .map(|row| row.record.name.chars().count())
        .max()
        .unwrap_or(0)
        .max(4);

    println!(
        "{:>3}  {:<name_width$}  {:>5}  {:>5}  {:>7}  {:<4}  {:>10}  note",
        "#", "name", "adult", "child", "teacher", "paid", "subtotal"
    );
    for row in &rows {
        let record = row.record;
        println!(
            "{:>3}  {:<name_width$}  {:>5}  {:>5}  {:>7}  {:<4}  {:>10}  {}",
            row.index + 1,
            record.name,
            record.count_adult,
            record.count_child,
            record.count_teacher,
            if record.paid { "yes" } else { "no" },
            format_yen(row.subtotal),
            record.note
        );
    }

    print_totals(&session.totals());
}

fn print_totals(totals: &DerivedTotals) {
    let headcount = Category::ALL
        .into_iter()
        .map(|category| format!("{} {}", category.label(), totals.headcount.get(category)))
        .collect::<Vec<_>>()
        .join(", ");

    println!();
    println!("Collected:   {}", format_yen(totals.total_collected));
    println!("Expected:    {}", format_yen(totals.total_expected));
    println!("Outstanding: {}", format_yen(totals.outstanding));
    println!(
        "Headcount:   {headcount} (total {}, {} paid / {} unpaid rows)",
        totals.headcount.total(),
        totals.paid_records,
        totals.unpaid_records
    );
}
