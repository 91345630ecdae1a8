use bookbridge_core::command::{Command, CommandSet, Record, Value};
use bookbridge_core::error::{StoreError, StoreErrorCategory};
use bookbridge_core::store::{ExecOutcome, RawStore};
use bookbridge_core::BOOK_TITLE;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

fn execute_sync(store: &RawStore, command: &Command) -> Result<ExecOutcome, StoreError> {
    let (tx, rx) = mpsc::channel();
    store.execute(command, move |result| {
        tx.send(result).unwrap();
    });
    rx.recv().unwrap()
}

fn query_all_sync(store: &RawStore, command: &Command) -> Result<Vec<Record>, StoreError> {
    let (tx, rx) = mpsc::channel();
    store.query_all(command, move |result| {
        tx.send(result).unwrap();
    });
    rx.recv().unwrap()
}

fn query_one_sync(store: &RawStore, command: &Command) -> Result<Option<Record>, StoreError> {
    let (tx, rx) = mpsc::channel();
    store.query_one(command, move |result| {
        tx.send(result).unwrap();
    });
    rx.recv().unwrap()
}

#[test]
fn create_insert_read_drop_roundtrip() {
    let store = RawStore::open_in_memory().unwrap();
    let commands = CommandSet::well_formed();

    execute_sync(&store, &commands.define).unwrap();

    let outcome = execute_sync(&store, &commands.insert).unwrap();
    assert_eq!(outcome.last_insert_id, 1);
    assert_eq!(outcome.rows_affected, 1);

    let records = query_all_sync(&store, &commands.read).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("id"), Some(&Value::Integer(1)));
    assert_eq!(records[0].get("title"), Some(&Value::Text(BOOK_TITLE.to_string())));

    execute_sync(&store, &commands.drop).unwrap();

    let err = query_all_sync(&store, &commands.read).unwrap_err();
    assert_eq!(err.category, StoreErrorCategory::MissingRelation);
}

#[test]
fn completion_fires_exactly_once_on_success_and_failure() {
    let store = RawStore::open_in_memory().unwrap();
    let commands = CommandSet::well_formed();
    execute_sync(&store, &commands.define).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = mpsc::channel();

    let calls_ok = Arc::clone(&calls);
    let tx_ok = tx.clone();
    store.execute(&commands.insert, move |_| {
        calls_ok.fetch_add(1, Ordering::SeqCst);
        tx_ok.send(()).unwrap();
    });
    rx.recv().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // A failing command notifies exactly once as well.
    let calls_err = Arc::clone(&calls);
    store.execute(&commands.insert, move |result| {
        assert!(result.is_err());
        calls_err.fetch_add(1, Ordering::SeqCst);
        tx.send(()).unwrap();
    });
    rx.recv().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn second_identical_insert_violates_uniqueness() {
    let store = RawStore::open_in_memory().unwrap();
    let commands = CommandSet::well_formed();
    execute_sync(&store, &commands.define).unwrap();

    execute_sync(&store, &commands.insert).unwrap();
    let err = execute_sync(&store, &commands.insert).unwrap_err();
    assert_eq!(err.category, StoreErrorCategory::UniqueConstraint);
}

#[test]
fn undeclared_column_commands_fail_without_side_effects() {
    let store = RawStore::open_in_memory().unwrap();
    let well_formed = CommandSet::well_formed();
    let malformed = CommandSet::malformed();
    execute_sync(&store, &well_formed.define).unwrap();

    let insert_err = execute_sync(&store, &malformed.insert).unwrap_err();
    assert_eq!(insert_err.category, StoreErrorCategory::UndeclaredColumn);

    let read_err = query_all_sync(&store, &malformed.read).unwrap_err();
    assert_eq!(read_err.category, StoreErrorCategory::UndeclaredColumn);

    // The failed insert must not have created a record.
    let records = query_all_sync(&store, &well_formed.read).unwrap();
    assert!(records.is_empty());
}

#[test]
fn query_one_returns_first_match_or_none() {
    let store = RawStore::open_in_memory().unwrap();
    let commands = CommandSet::well_formed();
    execute_sync(&store, &commands.define).unwrap();

    assert_eq!(query_one_sync(&store, &commands.read).unwrap(), None);

    execute_sync(&store, &commands.insert).unwrap();
    let record = query_one_sync(&store, &commands.read).unwrap().unwrap();
    assert_eq!(record.get("title"), Some(&Value::Text(BOOK_TITLE.to_string())));
}

#[test]
fn file_backed_store_keeps_records_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bookbridge.db");
    let commands = CommandSet::well_formed();

    let store = RawStore::open(&path).unwrap();
    execute_sync(&store, &commands.define).unwrap();
    execute_sync(&store, &commands.insert).unwrap();
    drop(store);

    let store = RawStore::open(&path).unwrap();
    let records = query_all_sync(&store, &commands.read).unwrap();
    assert_eq!(records.len(), 1);
}
