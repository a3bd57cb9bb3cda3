#![forbid(unsafe_code)]

use inv_core::{PrefixSkuPolicy, ProductKey, ProductStatus, ProductionStatus, SkuNamingPolicy};
use inv_storage::{
    DiskFs, Inventory, ProductFields, ProductFs, ProductRecord, ProductTree,
    RenameProductRequest, SqliteStore, StoreError,
};
use std::io;
use std::path::{Path, PathBuf};

const CATEGORY: &str = "Automotive";
const FOLDER: &str = "GT-AUT-00001 - Cup holder";
const SKU: &str = "GT-AUT-00001";

struct Fixture {
    _dir: tempfile::TempDir,
    products_dir: PathBuf,
    storage_dir: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let products_dir = dir.path().join("Products");
        let storage_dir = dir.path().join("data");
        Self {
            _dir: dir,
            products_dir,
            storage_dir,
        }
    }

    fn inventory(&self) -> Inventory {
        Inventory::open(&self.products_dir, &self.storage_dir).expect("open inventory")
    }

    fn inventory_with<F: ProductFs, P: SkuNamingPolicy>(&self, fs: F, policy: P) -> Inventory<F, P> {
        let store = SqliteStore::open(&self.storage_dir).expect("open store");
        Inventory::with_parts(store, ProductTree::new(&self.products_dir), fs, policy)
    }

    fn live_dir(&self, category: &str, folder: &str) -> PathBuf {
        self.products_dir.join("Categories").join(category).join(folder)
    }

    /// Registers the cup holder and lays out its directory.
    fn seed(&self) -> PathBuf {
        let mut inventory = self.inventory();
        register(inventory.store_mut(), CATEGORY, FOLDER, SKU);

        let dir = self.live_dir(CATEGORY, FOLDER);
        write_file(&dir.join("STL").join("GT-AUT-00001-001.3mf"), "one");
        write_file(&dir.join("STL").join("GT-AUT-00001-002.3mf"), "two");
        write_file(&dir.join("README.md"), "# Cup holder");
        write_file(
            &dir.join("STL").join("_Deleted").join("GT-AUT-00001-old.3mf"),
            "old",
        );
        dir
    }
}

fn register(store: &mut SqliteStore, category: &str, folder: &str, sku: &str) {
    store
        .insert_product(&ProductRecord {
            key: ProductKey::try_new(category, folder).expect("key"),
            sku: sku.to_string(),
            status: ProductStatus::Live,
            fields: ProductFields::default(),
        })
        .expect("insert product");
}

fn write_file(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().expect("parent")).expect("create dirs");
    std::fs::write(path, contents).expect("write file");
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn key(category: &str, folder: &str) -> ProductKey {
    ProductKey::try_new(category, folder).expect("key")
}

fn sku_request(new_sku: &str) -> RenameProductRequest {
    RenameProductRequest {
        category: CATEGORY.to_string(),
        folder: FOLDER.to_string(),
        new_sku: Some(new_sku.to_string()),
        ..RenameProductRequest::default()
    }
}

#[test]
fn sku_change_renames_prefixed_files_and_folder() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();

    let outcome = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect("rename");
    assert_eq!(outcome.folder, "GT-AUT-00002 - Cup holder");
    assert_eq!(outcome.sku, "GT-AUT-00002");
    assert_eq!(outcome.files_renamed, 2);
    assert!(outcome.refs_propagated);

    let new_dir = fixture.live_dir(CATEGORY, "GT-AUT-00002 - Cup holder");
    assert!(!fixture.live_dir(CATEGORY, FOLDER).exists());
    assert_eq!(
        file_names(&new_dir.join("STL")),
        vec!["GT-AUT-00002-001.3mf", "GT-AUT-00002-002.3mf", "_Deleted"]
    );
    assert_eq!(
        file_names(&new_dir.join("STL").join("_Deleted")),
        vec!["GT-AUT-00001-old.3mf"]
    );
    assert!(new_dir.join("README.md").is_file());

    let store = inventory.store();
    assert!(!store.exists(&key(CATEGORY, FOLDER)).expect("exists"));
    let product = store
        .lookup(&key(CATEGORY, "GT-AUT-00002 - Cup holder"))
        .expect("lookup")
        .expect("renamed product");
    assert_eq!(product.sku, "GT-AUT-00002");
    assert_eq!(product.status, ProductStatus::Live);
}

#[test]
fn folder_only_rename_touches_no_files() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();

    let outcome = inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: FOLDER.to_string(),
            new_folder: Some("GT-AUT-00001 - Big cup holder".to_string()),
            ..RenameProductRequest::default()
        })
        .expect("rename");
    assert_eq!(outcome.files_renamed, 0);
    assert_eq!(outcome.sku, SKU);

    let new_dir = fixture.live_dir(CATEGORY, "GT-AUT-00001 - Big cup holder");
    assert_eq!(
        file_names(&new_dir.join("STL")),
        vec!["GT-AUT-00001-001.3mf", "GT-AUT-00001-002.3mf", "_Deleted"]
    );
}

#[test]
fn category_move_keeps_status_root() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();

    inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: FOLDER.to_string(),
            new_category: Some("Home & Living".to_string()),
            ..RenameProductRequest::default()
        })
        .expect("rename");
    assert!(fixture.live_dir("Home & Living", FOLDER).join("STL").is_dir());
    assert!(
        inventory
            .store()
            .exists(&key("Home & Living", FOLDER))
            .expect("exists")
    );
}

/// Maps every SKU-led file onto the same name.
struct CollidingPolicy;

impl SkuNamingPolicy for CollidingPolicy {
    fn derive_renamed_filename(&self, old_sku: &str, new_sku: &str, filename: &str) -> Option<String> {
        filename.starts_with(old_sku).then(|| format!("{new_sku}-same.3mf"))
    }

    fn derive_folder_name(&self, old_sku: &str, new_sku: &str, folder: &str) -> Option<String> {
        PrefixSkuPolicy.derive_folder_name(old_sku, new_sku, folder)
    }
}

#[test]
fn colliding_destinations_fail_whole_rename_and_undo_move() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory_with(DiskFs, CollidingPolicy);

    let err = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect_err("collision");
    assert_eq!(err.code(), "FILE_RENAME_CONFLICT");

    let old_dir = fixture.live_dir(CATEGORY, FOLDER);
    assert!(old_dir.is_dir(), "directory move must be undone");
    assert!(!fixture.live_dir(CATEGORY, "GT-AUT-00002 - Cup holder").exists());
    assert_eq!(
        file_names(&old_dir.join("STL")),
        vec!["GT-AUT-00001-001.3mf", "GT-AUT-00001-002.3mf", "_Deleted"]
    );
    let product = inventory
        .store()
        .lookup(&key(CATEGORY, FOLDER))
        .expect("lookup")
        .expect("unchanged product");
    assert_eq!(product.sku, SKU);
}

#[test]
fn existing_destination_file_is_a_rename_conflict() {
    let fixture = Fixture::new();
    let dir = fixture.seed();
    write_file(&dir.join("STL").join("GT-AUT-00002-001.3mf"), "squatter");
    let mut inventory = fixture.inventory();

    let err = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect_err("destination exists");
    match err {
        StoreError::FileRenameConflict { destination } => {
            assert!(destination.ends_with("GT-AUT-00002-001.3mf"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(dir.join("STL").join("GT-AUT-00001-001.3mf").is_file());
    assert!(dir.join("STL").join("GT-AUT-00001-002.3mf").is_file());
}

#[test]
fn registry_target_conflict_changes_nothing() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();
    register(inventory.store_mut(), "Home & Living", FOLDER, "GT-HOM-00001");

    let err = inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: FOLDER.to_string(),
            new_category: Some("Home & Living".to_string()),
            ..RenameProductRequest::default()
        })
        .expect_err("conflict");
    assert_eq!(err.code(), "CONFLICT");
    assert!(fixture.live_dir(CATEGORY, FOLDER).is_dir());
    assert!(!fixture.live_dir("Home & Living", FOLDER).exists());
}

#[test]
fn category_outside_the_tree_is_rejected() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();

    let err = inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: FOLDER.to_string(),
            new_category: Some("../../tmp/evil".to_string()),
            ..RenameProductRequest::default()
        })
        .expect_err("invalid category");
    assert_eq!(err.code(), "INVALID_ARGUMENT");
    assert!(fixture.live_dir(CATEGORY, FOLDER).is_dir());
    assert!(inventory.store().exists(&key(CATEGORY, FOLDER)).expect("exists"));
}

#[test]
fn existing_destination_directory_is_a_conflict() {
    let fixture = Fixture::new();
    fixture.seed();
    std::fs::create_dir_all(fixture.live_dir(CATEGORY, "Stray folder")).expect("stray dir");
    let mut inventory = fixture.inventory();

    let err = inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: FOLDER.to_string(),
            new_folder: Some("Stray folder".to_string()),
            ..RenameProductRequest::default()
        })
        .expect_err("conflict");
    assert_eq!(err.code(), "CONFLICT");
    assert!(fixture.live_dir(CATEGORY, FOLDER).is_dir());
}

#[test]
fn registry_failure_restores_files_and_directory() {
    let fixture = Fixture::new();
    let dir = fixture.seed();
    let mut inventory = fixture.inventory();
    register(inventory.store_mut(), CATEGORY, "Other product", "GT-AUT-00002");

    let err = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect_err("sku owned elsewhere");
    assert_eq!(err.code(), "CONFLICT");

    assert!(dir.is_dir());
    assert!(!fixture.live_dir(CATEGORY, "GT-AUT-00002 - Cup holder").exists());
    assert_eq!(
        file_names(&dir.join("STL")),
        vec!["GT-AUT-00001-001.3mf", "GT-AUT-00001-002.3mf", "_Deleted"]
    );
    assert_eq!(
        inventory
            .store()
            .lookup(&key(CATEGORY, FOLDER))
            .expect("lookup")
            .expect("product")
            .sku,
        SKU
    );
}

/// Disk access that fails renaming one chosen file.
struct FailingFs {
    fail_on: &'static str,
}

impl ProductFs for FailingFs {
    fn exists(&self, path: &Path) -> bool {
        DiskFs.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        DiskFs.is_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        DiskFs.create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        if from.file_name().is_some_and(|name| name == self.fail_on) {
            return Err(io::Error::other("injected rename failure"));
        }
        DiskFs.rename(from, to)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        DiskFs.remove_dir_all(path)
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        DiskFs.write(path, bytes)
    }

    fn list_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        DiskFs.list_files(root)
    }

    fn list_dir_names(&self, dir: &Path) -> io::Result<Vec<String>> {
        DiskFs.list_dir_names(dir)
    }
}

#[test]
fn mid_apply_failure_reverses_applied_renames() {
    let fixture = Fixture::new();
    let dir = fixture.seed();
    let mut inventory = fixture.inventory_with(
        FailingFs {
            fail_on: "GT-AUT-00001-002.3mf",
        },
        PrefixSkuPolicy,
    );

    let err = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect_err("injected failure");
    assert_eq!(err.code(), "IO");

    assert!(dir.is_dir());
    assert_eq!(
        file_names(&dir.join("STL")),
        vec!["GT-AUT-00001-001.3mf", "GT-AUT-00001-002.3mf", "_Deleted"]
    );
    assert!(
        inventory
            .store()
            .exists(&key(CATEGORY, FOLDER))
            .expect("exists")
    );
}

#[test]
fn missing_directory_is_not_found() {
    let fixture = Fixture::new();
    let mut inventory = fixture.inventory();
    register(inventory.store_mut(), CATEGORY, FOLDER, SKU);

    let err = inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect_err("no directory");
    assert_eq!(err.code(), "NOT_FOUND");

    let err = inventory
        .rename_product(&RenameProductRequest {
            category: CATEGORY.to_string(),
            folder: "Unknown".to_string(),
            new_folder: Some("Other".to_string()),
            ..RenameProductRequest::default()
        })
        .expect_err("no product");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[test]
fn rename_moves_dependent_rows_and_merges_collisions() {
    let fixture = Fixture::new();
    fixture.seed();
    let mut inventory = fixture.inventory();
    let old = key(CATEGORY, FOLDER);
    let new = key(CATEGORY, "GT-AUT-00002 - Cup holder");

    {
        let store = inventory.store_mut();
        store.adjust_stock(&old.variant("red", "M"), 5, None).expect("stock");
        // Orphan row already at the destination key gets merged.
        store.adjust_stock(&new.variant("red", "M"), 2, Some("STALE")).expect("stock");
        store
            .adjust_production(&old.variant("red", "M"), ProductionStatus::Queued, 4)
            .expect("production");
        let event = store.create_event("Spring fair", None).expect("event");
        store
            .set_event_target(event.id, &old.variant("red", "M"), 6)
            .expect("target");
    }

    inventory
        .rename_product(&sku_request("GT-AUT-00002"))
        .expect("rename");

    let store = inventory.store();
    assert!(store.stock_entry(&old.variant("red", "M")).expect("read").is_none());
    let moved = store
        .stock_entry(&new.variant("red", "M"))
        .expect("read")
        .expect("moved row");
    assert_eq!(moved.quantity, 7);
    assert_eq!(moved.sku, "GT-AUT-00002");
    assert_eq!(
        store
            .production_quantity(&new.variant("red", "M"), ProductionStatus::Queued)
            .expect("read"),
        4
    );
    let targets = store.list_event_targets(1).expect("targets");
    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].key, new.variant("red", "M"));
}
