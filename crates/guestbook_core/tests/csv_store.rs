use guestbook_core::{
    open_store, CsvGateway, LedgerSession, LoadFailure, LoadSource, PersistenceGateway,
};
use std::fs;

#[test]
fn legacy_spreadsheet_export_loads_and_saves_canonically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guests.csv");
    fs::write(
        &path,
        "\u{feff}名前,大人,子供,集金済,個人計\n\
         Aiko,2,1,TRUE,11500\n\
         Ren,1.0,,False,5000\n\
         Mei,abc,2,済,3000\n",
    )
    .unwrap();
    let mut gateway = CsvGateway::new(&path);
    let mut session = LedgerSession::new();

    let report = session.load(&gateway);

    assert_eq!(report.source, LoadSource::Store);
    assert_eq!(report.dropped_columns, vec!["個人計".to_string()]);
    let ledger = session.ledger();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.get(0).unwrap().name, "Aiko");
    assert!(ledger.get(0).unwrap().paid);
    assert_eq!(ledger.get(1).unwrap().count_adult, 1);
    assert_eq!(ledger.get(1).unwrap().count_child, 0);
    assert!(!ledger.get(1).unwrap().paid);
    assert_eq!(ledger.get(2).unwrap().count_adult, 0);
    assert_eq!(session.totals().total_collected, 11_500 + 3_000);

    session.save(&mut gateway).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next(),
        Some("name,count_adult,count_child,count_teacher,paid,note")
    );
    assert_eq!(lines.next(), Some("Aiko,2,1,0,true,"));
    assert!(!written.contains("11500"));
    assert!(!dir.path().join("guests.csv.tmp").exists());
}

#[test]
fn ragged_rows_are_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ragged.csv");
    fs::write(&path, "name,count_adult,paid\nAiko\nRen,1,yes,extra,cells\n").unwrap();

    let mut session = LedgerSession::new();
    let report = session.load(&CsvGateway::new(&path));

    assert!(report.failure.is_none());
    assert_eq!(session.ledger().get(0).unwrap().count_adult, 0);
    assert!(session.ledger().get(1).unwrap().paid);
}

#[test]
fn foreign_csv_falls_back_to_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inventory.csv");
    fs::write(&path, "sku,qty\nA-1,4\n").unwrap();

    let mut session = LedgerSession::new();
    let report = session.load(&CsvGateway::new(&path));

    assert_eq!(report.source, LoadSource::DefaultSample);
    assert!(matches!(
        report.failure,
        Some(LoadFailure::StructurallyInvalid(_))
    ));
}

#[test]
fn saving_into_a_missing_directory_fails_but_keeps_edits() {
    let dir = tempfile::tempdir().unwrap();
    let mut gateway = open_store(dir.path().join("nope").join("guests.csv"), None).unwrap();
    let mut session = LedgerSession::new();
    session.load(&gateway);
    session.add_row().unwrap();

    assert!(session.save(&mut gateway).is_err());
    assert!(session.is_dirty());
    assert_eq!(session.ledger().len(), 4);
    assert!(gateway.read().unwrap().is_none());
}

#[test]
fn damaged_bytes_in_one_cell_keep_the_rest_of_the_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("guests.csv");
    let mut content = b"name,count_adult,paid,note\nAiko,2,yes,\n".to_vec();
    content.extend_from_slice(b"Ren,1,no,caf\xff\n");
    content.extend_from_slice(b"Mei,3,yes,\n");
    fs::write(&path, content).unwrap();

    let mut session = LedgerSession::new();
    let report = session.load(&CsvGateway::new(&path));

    assert!(report.failure.is_none());
    assert_eq!(report.source, LoadSource::Store);
    let ledger = session.ledger();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.get(1).unwrap().note, "caf\u{fffd}");
    assert_eq!(ledger.get(2).unwrap().count_adult, 3);
}
