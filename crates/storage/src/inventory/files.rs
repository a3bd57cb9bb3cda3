#![forbid(unsafe_code)]

use super::Inventory;
use crate::mirror::{ProductFs, QUARANTINE_DIR};
use crate::store::StoreError;
use inv_core::ids::safe_rel_path;
use inv_core::naming::{next_sequenced_name, split_extension, unique_filename};
use inv_core::{ProductKey, SkuNamingPolicy};
use std::path::PathBuf;

const MEDIA_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".tiff", ".heic", ".mp4", ".mov", ".mkv", ".avi",
    ".webm", ".m4v",
];

/// Subdirectory an upload lands in, by lowercase extension.
fn upload_subdir(ext: &str) -> &'static str {
    if MEDIA_EXTENSIONS.contains(&ext) {
        "Media"
    } else if ext == ".3mf" {
        "STL"
    } else {
        "MISC"
    }
}

impl<F: ProductFs, P: SkuNamingPolicy> Inventory<F, P> {
    /// Soft-deletes a file by moving it into a `_Deleted` directory next to
    /// it. Returns the new location.
    pub fn quarantine_file(&self, key: &ProductKey, rel_path: &str) -> Result<PathBuf, StoreError> {
        let rel = safe_rel_path(rel_path).ok_or(StoreError::InvalidArgument("unsafe relative path"))?;
        let target = self.product_dir(key)?.join(rel);
        if !self.fs.is_file(&target) {
            return Err(StoreError::NotFound("file"));
        }
        let (Some(parent), Some(name)) = (target.parent(), target.file_name()) else {
            return Err(StoreError::InvalidArgument("unsafe relative path"));
        };
        let quarantine = parent.join(QUARANTINE_DIR);
        let destination = quarantine.join(name);
        if self.fs.exists(&destination) {
            return Err(StoreError::Conflict("file already quarantined"));
        }
        self.fs.create_dir_all(&quarantine)?;
        self.fs.rename(&target, &destination)?;
        tracing::info!(
            category = key.category(),
            folder = key.folder(),
            file = %destination.display(),
            "file quarantined"
        );
        Ok(destination)
    }

    /// Writes an uploaded file into `Media/`, `STL/` or `MISC/`.
    ///
    /// With an SKU the file is named `<SKU>-<NNN><ext>` using the next free
    /// sequence number; without one the original name is kept, suffixed when
    /// it is already taken.
    pub fn store_upload(
        &self,
        key: &ProductKey,
        sku: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let name = filename
            .rsplit(['/', '\\'])
            .next()
            .map(str::trim)
            .unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." {
            return Err(StoreError::InvalidArgument("upload filename must not be empty"));
        }
        let ext = split_extension(name).1.to_ascii_lowercase();
        let dest_dir = self.product_dir(key)?.join(upload_subdir(&ext));
        self.fs.create_dir_all(&dest_dir)?;

        let existing = self.fs.list_dir_names(&dest_dir)?;
        let stored_name = match sku.map(str::trim).filter(|sku| !sku.is_empty()) {
            Some(sku) => next_sequenced_name(&existing, sku, &ext)
                .unwrap_or_else(|| unique_filename(&existing, name)),
            None => unique_filename(&existing, name),
        };
        let destination = dest_dir.join(stored_name);
        self.fs.write(&destination, bytes)?;
        tracing::debug!(
            category = key.category(),
            folder = key.folder(),
            file = %destination.display(),
            bytes = bytes.len(),
            "upload stored"
        );
        Ok(destination)
    }

    /// Files of a product relative to its directory, quarantine excluded.
    /// `extension` filters case-insensitively, with or without the dot.
    pub fn list_files(
        &self,
        key: &ProductKey,
        extension: Option<&str>,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let dir = self.product_dir(key)?;
        if !self.fs.exists(&dir) {
            return Err(StoreError::NotFound("product directory"));
        }
        let wanted = extension
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        let mut out = Vec::new();
        for path in self.fs.list_files(&dir)? {
            if let Some(wanted) = wanted.as_deref() {
                let matches = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted));
                if !matches {
                    continue;
                }
            }
            if let Ok(rel) = path.strip_prefix(&dir) {
                out.push(rel.to_path_buf());
            }
        }
        Ok(out)
    }
}
