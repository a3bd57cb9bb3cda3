#![forbid(unsafe_code)]

use inv_core::{ProductKey, ProductStatus};
use inv_storage::{CreateProductRequest, Inventory, ProductFields, ProductRecord, StoreError};
use std::path::{Path, PathBuf};

fn open() -> (tempfile::TempDir, PathBuf, Inventory) {
    let dir = tempfile::tempdir().expect("temp dir");
    let products_dir = dir.path().join("Products");
    let inventory =
        Inventory::open(&products_dir, dir.path().join("data")).expect("open inventory");
    (dir, products_dir, inventory)
}

fn cup_holder(requires_ukca: bool) -> CreateProductRequest {
    CreateProductRequest {
        category: "Automotive".to_string(),
        description: "Cup holder".to_string(),
        tags: " car, cup ".to_string(),
        requires_ukca,
        notes: "Print in PETG".to_string(),
    }
}

fn draft_dir(products_dir: &Path, folder: &str) -> PathBuf {
    products_dir
        .join("Categories")
        .join("_Draft")
        .join("Automotive")
        .join(folder)
}

#[test]
fn create_product_allocates_sku_and_scaffolds_draft() {
    let (_dir, products_dir, mut inventory) = open();

    let product = inventory.create_product(&cup_holder(true)).expect("create");
    assert_eq!(product.sku, "GT-AUT-00001");
    assert_eq!(product.key.folder(), "GT-AUT-00001 - Cup holder");
    assert_eq!(product.status, ProductStatus::Draft);
    assert_eq!(product.fields.ukca, "No");
    assert_eq!(product.fields.tags, "car, cup");

    let dir = draft_dir(&products_dir, "GT-AUT-00001 - Cup holder");
    for sub in ["Media", "STL", "MISC", "UKCA"] {
        assert!(dir.join(sub).is_dir(), "{sub} missing");
    }
    let readme = std::fs::read_to_string(dir.join("README.md")).expect("readme");
    assert!(readme.starts_with("# Cup holder\n\nSKU: GT-AUT-00001\n"));
    assert!(readme.ends_with("## Notes\nPrint in PETG\n"));

    let second = inventory.create_product(&cup_holder(false)).expect("create again");
    assert_eq!(second.sku, "GT-AUT-00002");
    assert_eq!(second.fields.ukca, "N/A");
    assert!(!draft_dir(&products_dir, "GT-AUT-00002 - Cup holder").join("UKCA").exists());
}

#[test]
fn sku_allocation_sees_folders_in_every_subtree() {
    let (_dir, products_dir, mut inventory) = open();
    std::fs::create_dir_all(
        products_dir
            .join("Categories")
            .join("_Archive")
            .join("Automotive")
            .join("GT-AUT-00007 - Old mount"),
    )
    .expect("archived dir");
    inventory
        .store_mut()
        .insert_product(&ProductRecord {
            key: ProductKey::try_new("Automotive", "Unfiled").expect("key"),
            sku: "GT-AUT-00004".to_string(),
            status: ProductStatus::Live,
            fields: ProductFields::default(),
        })
        .expect("insert");

    let product = inventory.create_product(&cup_holder(false)).expect("create");
    assert_eq!(product.sku, "GT-AUT-00008");
}

#[test]
fn create_product_rejects_unknown_category() {
    let (_dir, products_dir, mut inventory) = open();
    let err = inventory
        .create_product(&CreateProductRequest {
            category: "Garden".to_string(),
            description: "Gnome".to_string(),
            ..CreateProductRequest::default()
        })
        .expect_err("unknown category");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert!(!products_dir.join("Categories").exists());
}

#[test]
fn create_product_removes_directory_when_registry_insert_fails() {
    let (_dir, products_dir, mut inventory) = open();
    // Occupies the SKU the allocator is about to hand out, without a folder
    // or a registry row for the category scan to see.
    inventory
        .store_mut()
        .insert_product(&ProductRecord {
            key: ProductKey::try_new("Home & Living", "Squatter").expect("key"),
            sku: "GT-AUT-00001".to_string(),
            status: ProductStatus::Live,
            fields: ProductFields::default(),
        })
        .expect("insert");

    let err = inventory.create_product(&cup_holder(false)).expect_err("sku taken");
    assert_eq!(err.code(), "CONFLICT");
    assert!(!draft_dir(&products_dir, "GT-AUT-00001 - Cup holder").exists());
}

#[test]
fn set_status_moves_between_subtrees() {
    let (_dir, products_dir, mut inventory) = open();
    let product = inventory.create_product(&cup_holder(false)).expect("create");
    let key = product.key.clone();

    let live = inventory.set_status(&key, ProductStatus::Live).expect("go live");
    assert_eq!(live.status, ProductStatus::Live);
    let live_dir = products_dir.join("Categories").join("Automotive").join(key.folder());
    assert!(live_dir.join("STL").is_dir());
    assert!(!draft_dir(&products_dir, key.folder()).exists());

    inventory
        .set_status(&key, ProductStatus::Archived)
        .expect("archive");
    assert!(
        products_dir
            .join("Categories")
            .join("_Archive")
            .join("Automotive")
            .join(key.folder())
            .is_dir()
    );
    assert_eq!(
        inventory.store().list_products_by_status(ProductStatus::Archived).expect("list").len(),
        1
    );

    let same = inventory
        .set_status(&key, ProductStatus::Archived)
        .expect("no-op");
    assert_eq!(same.status, ProductStatus::Archived);
}

#[test]
fn set_status_refuses_existing_destination() {
    let (_dir, products_dir, mut inventory) = open();
    let product = inventory.create_product(&cup_holder(false)).expect("create");
    let live_dir = products_dir
        .join("Categories")
        .join("Automotive")
        .join(product.key.folder());
    std::fs::create_dir_all(&live_dir).expect("stray live dir");

    let err = inventory
        .set_status(&product.key, ProductStatus::Live)
        .expect_err("destination exists");
    assert_eq!(err.code(), "CONFLICT");
    assert!(draft_dir(&products_dir, product.key.folder()).is_dir());
    assert_eq!(
        inventory.store().lookup(&product.key).expect("lookup").expect("product").status,
        ProductStatus::Draft
    );
}

#[test]
fn uploads_are_routed_and_sequenced() {
    let (_dir, products_dir, mut inventory) = open();
    let product = inventory.create_product(&cup_holder(false)).expect("create");
    let key = product.key.clone();
    let sku = Some(product.sku.as_str());

    let first = inventory
        .store_upload(&key, sku, "model.3MF", b"a")
        .expect("upload");
    let second = inventory
        .store_upload(&key, sku, "C:\\Users\\me\\other.3mf", b"b")
        .expect("upload");
    let photo = inventory
        .store_upload(&key, sku, "photo.JPG", b"c")
        .expect("upload");
    let manual = inventory
        .store_upload(&key, None, "manual.pdf", b"d")
        .expect("upload");
    let manual_again = inventory
        .store_upload(&key, None, "manual.pdf", b"e")
        .expect("upload");

    let dir = draft_dir(&products_dir, key.folder());
    assert_eq!(first, dir.join("STL").join("GT-AUT-00001-001.3mf"));
    assert_eq!(second, dir.join("STL").join("GT-AUT-00001-002.3mf"));
    assert_eq!(photo, dir.join("Media").join("GT-AUT-00001-001.jpg"));
    assert_eq!(manual, dir.join("MISC").join("manual.pdf"));
    assert_eq!(manual_again, dir.join("MISC").join("manual-001.pdf"));

    let stl = inventory.list_files(&key, Some("3mf")).expect("list");
    assert_eq!(
        stl,
        vec![
            PathBuf::from("STL").join("GT-AUT-00001-001.3mf"),
            PathBuf::from("STL").join("GT-AUT-00001-002.3mf"),
        ]
    );
}

#[test]
fn quarantine_moves_file_aside() {
    let (_dir, products_dir, mut inventory) = open();
    let product = inventory.create_product(&cup_holder(false)).expect("create");
    let key = product.key.clone();
    inventory
        .store_upload(&key, Some(&product.sku), "model.3mf", b"a")
        .expect("upload");

    let moved = inventory
        .quarantine_file(&key, "STL/GT-AUT-00001-001.3mf")
        .expect("quarantine");
    let dir = draft_dir(&products_dir, key.folder());
    assert_eq!(moved, dir.join("STL").join("_Deleted").join("GT-AUT-00001-001.3mf"));
    assert!(moved.is_file());
    assert!(inventory.list_files(&key, Some(".3mf")).expect("list").is_empty());

    let err = inventory
        .quarantine_file(&key, "STL/GT-AUT-00001-001.3mf")
        .expect_err("already gone");
    assert_eq!(err.code(), "NOT_FOUND");

    let err = inventory
        .quarantine_file(&key, "../../escape.txt")
        .expect_err("unsafe path");
    assert!(matches!(err, StoreError::InvalidArgument(_)));
}

#[test]
fn quarantine_refuses_to_overwrite() {
    let (_dir, _products_dir, mut inventory) = open();
    let product = inventory.create_product(&cup_holder(false)).expect("create");
    let key = product.key.clone();
    inventory
        .store_upload(&key, None, "notes.txt", b"first")
        .expect("upload");
    inventory.quarantine_file(&key, "MISC/notes.txt").expect("quarantine");
    inventory
        .store_upload(&key, None, "notes.txt", b"second")
        .expect("upload");

    let err = inventory
        .quarantine_file(&key, "MISC/notes.txt")
        .expect_err("quarantine slot taken");
    assert_eq!(err.code(), "CONFLICT");
}
