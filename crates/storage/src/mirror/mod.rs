#![forbid(unsafe_code)]

mod fs;

pub use fs::{DiskFs, ProductFs};

use inv_core::{ProductKey, ProductStatus};
use std::path::{Path, PathBuf};

/// Soft-delete directory name. Excluded from every scan.
pub const QUARANTINE_DIR: &str = "_Deleted";

const CATEGORIES_DIR: &str = "Categories";
const DRAFT_DIR: &str = "_Draft";
const ARCHIVE_DIR: &str = "_Archive";

/// Layout of the on-disk product tree:
///
/// ```text
/// <products_dir>/Categories/<category>/<folder>            Live
/// <products_dir>/Categories/_Draft/<category>/<folder>     Draft
/// <products_dir>/Categories/_Archive/<category>/<folder>   Archived
/// ```
#[derive(Clone, Debug)]
pub struct ProductTree {
    products_dir: PathBuf,
}

impl ProductTree {
    pub fn new(products_dir: impl Into<PathBuf>) -> Self {
        Self {
            products_dir: products_dir.into(),
        }
    }

    pub fn products_dir(&self) -> &Path {
        &self.products_dir
    }

    pub fn categories_dir(&self) -> PathBuf {
        self.products_dir.join(CATEGORIES_DIR)
    }

    pub fn status_root(&self, status: ProductStatus) -> PathBuf {
        let categories = self.categories_dir();
        match status {
            ProductStatus::Live => categories,
            ProductStatus::Draft => categories.join(DRAFT_DIR),
            ProductStatus::Archived => categories.join(ARCHIVE_DIR),
        }
    }

    pub fn category_dir(&self, status: ProductStatus, category: &str) -> PathBuf {
        self.status_root(status).join(category)
    }

    pub fn product_dir(&self, status: ProductStatus, key: &ProductKey) -> PathBuf {
        self.category_dir(status, key.category()).join(key.folder())
    }
}
