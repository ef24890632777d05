use guestbook_core::{aggregate, project, GuestRecord, Ledger};

#[test]
fn guest_record_serializes_with_canonical_field_names() {
    let mut record = GuestRecord::with_counts("Aiko", 2, 1, 0);
    record.paid = true;

    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["name"], "Aiko");
    assert_eq!(json["count_adult"], 2);
    assert_eq!(json["count_child"], 1);
    assert_eq!(json["count_teacher"], 0);
    assert_eq!(json["paid"], true);
    assert_eq!(json["note"], "");

    let decoded: GuestRecord = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, record);
}

#[test]
fn row_view_flattens_record_and_adds_subtotal() {
    let ledger = Ledger::from_records(vec![GuestRecord::with_counts("Ren", 1, 0, 1)]);
    let rows = project(&ledger);

    let json = serde_json::to_value(&rows).unwrap();
    assert_eq!(json[0]["index"], 0);
    assert_eq!(json[0]["name"], "Ren");
    assert_eq!(json[0]["subtotal"], 7000);
}

#[test]
fn totals_serialize_headcount_by_category() {
    let ledger = Ledger::default_sample();
    let json = serde_json::to_value(aggregate(&ledger)).unwrap();

    assert_eq!(json["headcount"]["adult"], 3);
    assert_eq!(json["headcount"]["teacher"], 1);
    assert_eq!(json["total_expected"], 18_500);
    assert_eq!(json["total_collected"], 11_500);
    assert_eq!(json["outstanding"], 7_000);
}
