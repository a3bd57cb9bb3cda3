#![forbid(unsafe_code)]

mod files;
mod lifecycle;
mod rename;

pub use rename::{FileRename, plan_sku_renames};

use crate::mirror::{DiskFs, ProductFs, ProductTree};
use crate::store::{Product, SqliteStore, StoreError};
use inv_core::{PrefixSkuPolicy, ProductKey, SkuNamingPolicy};
use std::path::{Path, PathBuf};

/// Coordinates the registry, the ledgers and the product directory tree.
///
/// The two halves share no transaction. Operations that touch both order
/// their steps so the directory tree moves first and the registry write
/// commits last, undoing filesystem changes if that write fails.
pub struct Inventory<F: ProductFs = DiskFs, P: SkuNamingPolicy = PrefixSkuPolicy> {
    store: SqliteStore,
    tree: ProductTree,
    fs: F,
    policy: P,
}

impl Inventory {
    pub fn open(
        products_dir: impl Into<PathBuf>,
        storage_dir: impl AsRef<Path>,
    ) -> Result<Self, StoreError> {
        let store = SqliteStore::open(storage_dir)?;
        Ok(Self::with_parts(
            store,
            ProductTree::new(products_dir),
            DiskFs,
            PrefixSkuPolicy,
        ))
    }
}

impl<F: ProductFs, P: SkuNamingPolicy> Inventory<F, P> {
    pub fn with_parts(store: SqliteStore, tree: ProductTree, fs: F, policy: P) -> Self {
        Self {
            store,
            tree,
            fs,
            policy,
        }
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    pub fn tree(&self) -> &ProductTree {
        &self.tree
    }

    /// Directory of a registered product, under its current status root.
    pub fn product_dir(&self, key: &ProductKey) -> Result<PathBuf, StoreError> {
        let product = self.registered(key)?;
        Ok(self.tree.product_dir(product.status, key))
    }

    fn registered(&self, key: &ProductKey) -> Result<Product, StoreError> {
        self.store
            .lookup(key)?
            .ok_or(StoreError::NotFound("product"))
    }

    /// Best-effort directory move used by compensation paths.
    fn move_back(&self, from: &Path, to: &Path) {
        if let Err(err) = self.fs.rename(from, to) {
            tracing::warn!(
                from = %from.display(),
                to = %to.display(),
                error = %err,
                "compensating directory move failed"
            );
        } else {
            tracing::warn!(
                from = %from.display(),
                to = %to.display(),
                "directory move undone"
            );
        }
    }
}
