use shelfkeep_core::db::open_db;
use shelfkeep_core::{
    open_catalog, Catalog, CatalogConfig, CatalogError, CorruptStorePolicy, Record, RecordStore,
    SqliteRecordStore, Transition,
};
use std::path::Path;

fn corrupt_file(path: &Path) {
    std::fs::write(path, "this is not a catalog store\n".repeat(64)).unwrap();
}

fn snapshot<S: RecordStore>(catalog: &Catalog<S>) -> Vec<Record> {
    catalog.records().cloned().collect()
}

#[test]
fn absent_store_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");

    let catalog = open_catalog(&path, CatalogConfig::default()).unwrap();
    assert!(catalog.is_empty());
    assert!(!catalog.is_dirty());
}

#[test]
fn save_then_load_roundtrips_order_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");

    let expected = {
        let mut catalog = open_catalog(&path, CatalogConfig::default()).unwrap();
        catalog.add_new("Zebra Tales", "Ames", "Z9").unwrap();
        catalog.add_new("Dune", "Herbert", "001").unwrap();
        catalog.add_new("Middlemarch", "Eliot", "M4").unwrap();
        assert_eq!(catalog.issue_by_key("001").unwrap(), Transition::Applied);
        catalog.save().unwrap();
        snapshot(&catalog)
    };

    let reloaded = open_catalog(&path, CatalogConfig::default()).unwrap();
    assert_eq!(snapshot(&reloaded), expected);
    assert!(reloaded.search_by_catalog_number("001").unwrap().is_issued());
    assert!(!reloaded.search_by_catalog_number("Z9").unwrap().is_issued());
}

#[test]
fn add_survives_restart_without_explicit_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");

    {
        let mut catalog = open_catalog(&path, CatalogConfig::default()).unwrap();
        catalog.add_new("1984", "Orwell", "X1").unwrap();
    }

    let reloaded = open_catalog(&path, CatalogConfig::default()).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.search_by_catalog_number("X1").unwrap().author(), "Orwell");
}

#[test]
fn add_without_persist_is_lost_until_saved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    let config = CatalogConfig {
        persist_on_add: false,
        ..CatalogConfig::default()
    };

    {
        let mut catalog = open_catalog(&path, config.clone()).unwrap();
        catalog.add_new("1984", "Orwell", "X1").unwrap();
    }
    assert!(open_catalog(&path, config.clone()).unwrap().is_empty());

    {
        let mut catalog = open_catalog(&path, config.clone()).unwrap();
        catalog.add_new("1984", "Orwell", "X1").unwrap();
        catalog.save().unwrap();
    }
    assert_eq!(open_catalog(&path, config).unwrap().len(), 1);
}

#[test]
fn save_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");

    let mut store = SqliteRecordStore::open(&path).unwrap();
    store
        .replace_all(&[
            Record::new("Old", "Author", "A").unwrap(),
            Record::new("Older", "Author", "B").unwrap(),
        ])
        .unwrap();
    store
        .replace_all(&[Record::new("New", "Author", "B").unwrap()])
        .unwrap();

    let loaded = store.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].title(), "New");
}

#[test]
fn corrupt_store_fails_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    corrupt_file(&path);

    let err = open_catalog(&path, CatalogConfig::default())
        .err()
        .expect("corrupt store must fail under the default policy");
    match err {
        CatalogError::Persistence(inner) => assert!(inner.is_corrupt_store(), "{inner}"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(path.exists(), "failing open must leave the store in place");
}

#[test]
fn corrupt_store_is_quarantined_when_starting_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    corrupt_file(&path);
    let config = CatalogConfig {
        on_corrupt_store: CorruptStorePolicy::StartEmpty,
        ..CatalogConfig::default()
    };

    let mut catalog = open_catalog(&path, config.clone()).unwrap();
    assert!(catalog.is_empty());
    catalog.add_new("Dune", "Herbert", "001").unwrap();

    let quarantined: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("library.sqlite3.corrupt-"))
        .collect();
    assert_eq!(quarantined.len(), 1, "entries: {quarantined:?}");
    let kept = std::fs::read_to_string(dir.path().join(&quarantined[0])).unwrap();
    assert!(kept.starts_with("this is not a catalog store"));

    drop(catalog);
    assert_eq!(open_catalog(&path, config).unwrap().len(), 1);
}

#[test]
fn invalid_rows_are_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    let conn = open_db(&path).unwrap();
    conn.execute(
        "INSERT INTO records (position, catalog_number, title, author, issued)
         VALUES (0, '001', '   ', 'Herbert', 0);",
        [],
    )
    .unwrap();
    drop(conn);

    let err = open_catalog(&path, CatalogConfig::default())
        .err()
        .expect("blank title must be rejected on load");
    match err {
        CatalogError::Persistence(inner) => {
            assert!(inner.is_corrupt_store());
            assert!(inner.to_string().contains("title cannot be empty"), "{inner}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn newer_schema_is_never_quarantined() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let config = CatalogConfig {
        on_corrupt_store: CorruptStorePolicy::StartEmpty,
        ..CatalogConfig::default()
    };
    let err = open_catalog(&path, config)
        .err()
        .expect("future schema must fail");
    assert!(matches!(err, CatalogError::Persistence(ref inner) if !inner.is_corrupt_store()));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn repeated_recovery_keeps_every_quarantined_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    let config = CatalogConfig {
        on_corrupt_store: CorruptStorePolicy::StartEmpty,
        ..CatalogConfig::default()
    };

    std::fs::write(&path, "first broken store\n".repeat(64)).unwrap();
    drop(open_catalog(&path, config.clone()).unwrap());
    std::fs::write(&path, "second broken store\n".repeat(64)).unwrap();
    drop(open_catalog(&path, config).unwrap());

    let mut kept: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|entry| {
            entry
                .file_name()
                .is_some_and(|name| name.to_string_lossy().contains(".corrupt-"))
        })
        .map(|entry| std::fs::read_to_string(entry).unwrap())
        .collect();
    kept.sort();

    assert_eq!(kept.len(), 2, "both corrupt stores must be preserved");
    assert!(kept[0].starts_with("first broken store"));
    assert!(kept[1].starts_with("second broken store"));
}

fn write_foreign_records_table(path: &Path) {
    let conn = rusqlite::Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE records (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO records (name) VALUES ('unrelated');",
    )
    .unwrap();
}

#[test]
fn foreign_schema_fails_by_default_without_touching_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    write_foreign_records_table(&path);

    let err = open_catalog(&path, CatalogConfig::default())
        .err()
        .expect("mismatched schema must fail under the default policy");
    match err {
        CatalogError::Persistence(inner) => {
            assert!(inner.is_corrupt_store(), "{inner}");
            assert!(inner.to_string().contains("schema mismatch"), "{inner}");
        }
        other => panic!("unexpected error: {other}"),
    }

    let conn = rusqlite::Connection::open(&path).unwrap();
    let version: u32 = conn
        .query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, 0, "failed migration must roll back");
}

#[test]
fn foreign_schema_is_quarantined_when_starting_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("library.sqlite3");
    write_foreign_records_table(&path);
    let config = CatalogConfig {
        on_corrupt_store: CorruptStorePolicy::StartEmpty,
        ..CatalogConfig::default()
    };

    let mut catalog = open_catalog(&path, config).unwrap();
    assert!(catalog.is_empty());
    catalog.add_new("Dune", "Herbert", "001").unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
}
