#![forbid(unsafe_code)]

use inv_core::{ProductKey, ProductStatus, ProductionStatus, VariantKey};
use inv_storage::{ProductFields, ProductRecord, QuantityChange, SqliteStore, StoreError};

fn open_store() -> (tempfile::TempDir, SqliteStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = SqliteStore::open(dir.path()).expect("open store");
    (dir, store)
}

fn widget(color: &str, size: &str) -> VariantKey {
    VariantKey::try_new("Toys & Games", "GT-TOY-00001 - Widget", color, size).expect("variant key")
}

fn register_widget(store: &mut SqliteStore) {
    store
        .insert_product(&ProductRecord {
            key: ProductKey::try_new("Toys & Games", "GT-TOY-00001 - Widget").expect("key"),
            sku: "GT-TOY-00001".to_string(),
            status: ProductStatus::Live,
            fields: ProductFields::default(),
        })
        .expect("insert product");
}

#[test]
fn stock_decrement_to_zero_removes_row() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");
    store.adjust_stock(&key, 3, None).expect("add stock");

    let change = store.adjust_stock(&key, -3, None).expect("take stock");
    assert_eq!(change, QuantityChange { quantity: 0, removed: true });
    assert!(store.stock_entry(&key).expect("read").is_none());
}

#[test]
fn stock_overdraw_clamps_and_deletes() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");
    store.adjust_stock(&key, 2, None).expect("add stock");

    let change = store.adjust_stock(&key, -10, None).expect("overdraw");
    assert!(change.removed);
    assert_eq!(store.stock_quantity(&key).expect("read"), 0);
}

#[test]
fn stock_rejects_zero_delta_and_decrement_of_missing_row() {
    let (_dir, mut store) = open_store();
    let key = widget("blue", "S");

    let err = store.adjust_stock(&key, 0, None).expect_err("zero delta");
    assert_eq!(err.code(), "INVALID_ARGUMENT");

    let err = store.adjust_stock(&key, -1, None).expect_err("missing row");
    match err {
        StoreError::InvalidArgument(message) => {
            assert_eq!(message, "no existing stock entry to decrement")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(store.list_stock().expect("list").is_empty());
}

#[test]
fn stock_row_takes_sku_from_registry_unless_given() {
    let (_dir, mut store) = open_store();
    register_widget(&mut store);

    let red = widget("red", "M");
    store.adjust_stock(&red, 4, None).expect("add");
    assert_eq!(store.stock_entry(&red).expect("read").expect("row").sku, "GT-TOY-00001");

    let blue = widget("blue", "M");
    store.adjust_stock(&blue, 1, Some("CUSTOM")).expect("add");
    assert_eq!(store.stock_entry(&blue).expect("read").expect("row").sku, "CUSTOM");
}

#[test]
fn stock_adjust_restamps_sku_when_given() {
    let (_dir, mut store) = open_store();
    register_widget(&mut store);
    let key = widget("red", "M");
    store.adjust_stock(&key, 4, None).expect("add");

    store.adjust_stock(&key, 1, Some("GT-TOY-00009")).expect("add with sku");
    let entry = store.stock_entry(&key).expect("read").expect("row");
    assert_eq!(entry.sku, "GT-TOY-00009");
    assert_eq!(entry.quantity, 5);

    store.adjust_stock(&key, -1, None).expect("take");
    assert_eq!(store.stock_entry(&key).expect("read").expect("row").sku, "GT-TOY-00009");
}

#[test]
fn quantity_overflow_is_rejected_and_leaves_rows_alone() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");
    store.adjust_stock(&key, 5, None).expect("add");

    let err = store.adjust_stock(&key, i64::MAX, None).expect_err("overflow");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_eq!(store.stock_quantity(&key).expect("read"), 5);

    store
        .adjust_production(&key, ProductionStatus::Queued, 5)
        .expect("queue");
    let err = store
        .adjust_production(&key, ProductionStatus::Queued, i64::MAX)
        .expect_err("overflow");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    let err = store
        .adjust_production_by_key(&key, i64::MAX, ProductionStatus::Queued)
        .expect_err("overflow");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert_eq!(
        store
            .production_quantity(&key, ProductionStatus::Queued)
            .expect("read"),
        5
    );
}

#[test]
fn stock_never_negative_over_delta_sequences() {
    let (_dir, mut store) = open_store();
    let key = widget("green", "L");
    let deltas = [5, -2, -2, 7, -20, 1, -1, 3, -4, 9, -3, -3, -3];

    let mut expected: i64 = 0;
    for delta in deltas {
        let result = store.adjust_stock(&key, delta, None);
        if expected == 0 && delta < 0 {
            assert!(result.is_err(), "decrement of empty key must fail");
            continue;
        }
        let change = result.expect("adjust");
        expected = (expected + delta).max(0);
        assert_eq!(change.quantity, expected);
        assert_eq!(change.removed, expected == 0);

        let entry = store.stock_entry(&key).expect("read");
        assert_eq!(entry.is_some(), expected > 0, "row exists iff quantity > 0");
        if let Some(entry) = entry {
            assert!(entry.quantity > 0);
        }
    }
}

#[test]
fn set_stock_entry_overwrites_and_zero_deletes() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");
    store.set_stock_entry(&key, "GT-TOY-00001", 7).expect("import");
    store.set_stock_entry(&key, "GT-TOY-00001", 2).expect("import");
    assert_eq!(store.stock_quantity(&key).expect("read"), 2);

    store.set_stock_entry(&key, "GT-TOY-00001", 0).expect("import zero");
    assert!(store.stock_entry(&key).expect("read").is_none());
}

#[test]
fn production_merges_per_status_bucket() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");
    store
        .adjust_production(&key, ProductionStatus::Queued, 2)
        .expect("queue");
    store
        .adjust_production(&key, ProductionStatus::Queued, 3)
        .expect("queue more");
    store
        .adjust_production(&key, ProductionStatus::Printing, 1)
        .expect("printing");

    assert_eq!(
        store.production_quantity(&key, ProductionStatus::Queued).expect("read"),
        5
    );
    assert_eq!(
        store.production_quantity(&key, ProductionStatus::Printing).expect("read"),
        1
    );
    assert_eq!(store.list_production().expect("list").len(), 2);

    let change = store
        .adjust_production(&key, ProductionStatus::Printing, -1)
        .expect("finish printing");
    assert!(change.removed);
    let err = store
        .adjust_production(&key, ProductionStatus::Printing, -1)
        .expect_err("missing bucket");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
}

#[test]
fn production_by_key_is_lenient() {
    let (_dir, mut store) = open_store();
    let key = widget("red", "M");

    let change = store
        .adjust_production_by_key(&key, -4, ProductionStatus::Queued)
        .expect("decrement absent");
    assert!(change.removed);
    assert!(store.list_production().expect("list").is_empty());

    store
        .adjust_production_by_key(&key, 3, ProductionStatus::Queued)
        .expect("add");
    let change = store
        .adjust_production_by_key(&key, 0, ProductionStatus::Queued)
        .expect("no-op");
    assert_eq!(change.quantity, 3);

    store
        .adjust_production_by_key(&key, -5, ProductionStatus::Queued)
        .expect("overdraw");
    assert_eq!(
        store.production_quantity(&key, ProductionStatus::Queued).expect("read"),
        0
    );
}

#[test]
fn reset_clears_ledgers_but_not_products() {
    let (_dir, mut store) = open_store();
    register_widget(&mut store);
    let key = widget("red", "M");
    store.adjust_stock(&key, 3, None).expect("stock");
    store
        .adjust_production(&key, ProductionStatus::Queued, 1)
        .expect("production");

    let counts = store.reset_ledgers(false).expect("reset");
    assert_eq!(counts.stock, 1);
    assert_eq!(counts.production, 1);
    assert!(store.list_stock().expect("list").is_empty());
    assert_eq!(store.list_products().expect("products").len(), 1);
}

#[test]
fn reopen_keeps_schema() {
    let dir = tempfile::tempdir().expect("temp dir");
    {
        let mut store = SqliteStore::open(dir.path()).expect("open");
        store.adjust_stock(&widget("red", "M"), 1, None).expect("stock");
    }
    let store = SqliteStore::open(dir.path()).expect("reopen");
    assert_eq!(store.stock_quantity(&widget("red", "M")).expect("read"), 1);
}

#[test]
fn foreign_database_requires_reset() {
    let dir = tempfile::tempdir().expect("temp dir");
    let conn = rusqlite::Connection::open(dir.path().join("inventory.db")).expect("raw db");
    conn.execute_batch("CREATE TABLE legacy(id INTEGER)").expect("legacy table");
    drop(conn);

    let err = SqliteStore::open(dir.path()).expect_err("must refuse");
    assert_eq!(err.code(), "RESET_REQUIRED");
}
