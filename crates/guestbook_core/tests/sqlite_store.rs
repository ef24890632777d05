use guestbook_core::{
    CanonicalSchema, LedgerSession, LoadSource, PersistenceGateway, RawValue, SchemaVersion,
    SqliteGateway,
};
use rusqlite::Connection;

#[test]
fn legacy_table_with_extra_columns_is_reconciled_and_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("party.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE guests (
            subtotal INTEGER,
            name TEXT,
            adult INTEGER,
            child REAL,
            paid INTEGER
        );
        INSERT INTO guests VALUES (6500, 'Aiko', 1, 1.0, 1);
        INSERT INTO guests VALUES (NULL, 'Ren', NULL, 2.7, 0);
        INSERT INTO guests VALUES (0, NULL, -2, NULL, NULL);",
    )
    .unwrap();
    drop(conn);

    let mut gateway = SqliteGateway::new(&path);
    let mut session = LedgerSession::new();
    let report = session.load(&gateway);

    assert_eq!(report.source, LoadSource::Store);
    assert_eq!(report.dropped_columns, vec!["subtotal".to_string()]);
    let ledger = session.ledger();
    assert_eq!(ledger.len(), 3);
    assert_eq!(ledger.get(1).unwrap().count_child, 2);
    assert_eq!(ledger.get(2).unwrap().name, "");
    assert_eq!(ledger.get(2).unwrap().count_adult, 0);
    assert_eq!(session.totals().total_collected, 6_500);

    session.save(&mut gateway).unwrap();

    let conn = Connection::open(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, SchemaVersion::CURRENT.number());
    let columns: Vec<String> = conn
        .prepare("SELECT * FROM guests;")
        .unwrap()
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    assert_eq!(columns, CanonicalSchema::current().column_names());

    let stored = gateway.read().unwrap().unwrap();
    assert_eq!(stored.cell(0, 4), &RawValue::Integer(1));
    assert_eq!(stored.cell(1, 1), &RawValue::Integer(0));
}

#[test]
fn custom_table_round_trip_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("events.sqlite3");
    let mut gateway = SqliteGateway::with_table(&path, "second_party").unwrap();

    let mut session = LedgerSession::new();
    let report = session.load(&gateway);
    assert_eq!(report.source, LoadSource::DefaultSample);
    for name in ["Yui", "Sora"] {
        let index = session.add_row().unwrap();
        session
            .update_row(index, |record| {
                record.name = name.to_string();
                record.count_teacher = 1;
            })
            .unwrap();
    }
    session.save(&mut gateway).unwrap();

    let mut reloaded = LedgerSession::new();
    let report = reloaded.load(&gateway);
    assert_eq!(report.source, LoadSource::Store);
    assert_eq!(reloaded.ledger(), session.ledger());
    let names: Vec<_> = reloaded
        .ledger()
        .iter()
        .map(|record| record.name.as_str())
        .collect();
    assert_eq!(names[3..], ["Yui", "Sora"]);
}

#[test]
fn database_without_guest_table_loads_sample() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("other.db");
    Connection::open(&path)
        .unwrap()
        .execute_batch("CREATE TABLE unrelated (id INTEGER);")
        .unwrap();

    let mut session = LedgerSession::new();
    let report = session.load(&SqliteGateway::new(&path));

    assert_eq!(report.source, LoadSource::DefaultSample);
}
