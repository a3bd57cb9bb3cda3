#![forbid(unsafe_code)]

use super::Inventory;
use crate::mirror::ProductFs;
use crate::store::{ProductRecord, RenameOutcome, RenameProductRequest, StoreError};
use inv_core::{ProductKey, SkuNamingPolicy};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// One planned file rename inside a product directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileRename {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Builds the complete rename set for an SKU change before anything moves.
///
/// Fails with [`StoreError::FileRenameConflict`] when two files map to the
/// same destination or a destination already exists on disk.
pub fn plan_sku_renames<F: ProductFs, P: SkuNamingPolicy>(
    fs: &F,
    policy: &P,
    dir: &Path,
    old_sku: &str,
    new_sku: &str,
) -> Result<Vec<FileRename>, StoreError> {
    let mut plan = Vec::new();
    let mut destinations = BTreeSet::new();
    for from in fs.list_files(dir)? {
        let Some(name) = from.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        let Some(renamed) = policy.derive_renamed_filename(old_sku, new_sku, name) else {
            continue;
        };
        let to = from.with_file_name(renamed);
        if to == from {
            continue;
        }
        if !destinations.insert(to.clone()) || fs.exists(&to) {
            return Err(StoreError::FileRenameConflict { destination: to });
        }
        plan.push(FileRename { from, to });
    }
    Ok(plan)
}

struct DirMove {
    from: PathBuf,
    to: PathBuf,
}

impl<F: ProductFs, P: SkuNamingPolicy> Inventory<F, P> {
    /// Changes a product's category, folder and/or SKU.
    ///
    /// Steps run in order: resolve the target folder, check registry
    /// uniqueness, move the directory, plan and apply SKU file renames,
    /// update the registry, then move dependent ledger rows. Any failure
    /// before the registry write commits undoes the filesystem steps already
    /// taken. The ledger move is best-effort and reported through
    /// `refs_propagated`.
    pub fn rename_product(
        &mut self,
        request: &RenameProductRequest,
    ) -> Result<RenameOutcome, StoreError> {
        let old_key = ProductKey::try_new(&request.category, &request.folder)?;
        let current = self.registered(&old_key)?;
        let old_sku = current.sku.clone();
        let new_sku = non_empty(request.new_sku.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| old_sku.clone());
        let sku_changed = new_sku != old_sku;

        let new_category = non_empty(request.new_category.as_deref()).unwrap_or(old_key.category());
        let new_folder = match non_empty(request.new_folder.as_deref()) {
            Some(folder) => folder.to_string(),
            None if sku_changed => self
                .policy
                .derive_folder_name(&old_sku, &new_sku, old_key.folder())
                .unwrap_or_else(|| old_key.folder().to_string()),
            None => old_key.folder().to_string(),
        };
        let new_key = ProductKey::try_new(new_category, &new_folder)?;
        let key_changed = new_key != old_key;

        if key_changed && self.store.exists(&new_key)? {
            return Err(StoreError::Conflict("product folder already exists"));
        }

        let old_dir = self.tree.product_dir(current.status, &old_key);
        let new_dir = self.tree.product_dir(current.status, &new_key);
        if (key_changed || sku_changed) && !self.fs.exists(&old_dir) {
            return Err(StoreError::NotFound("product directory"));
        }
        let dir_move = if key_changed {
            if self.fs.exists(&new_dir) {
                return Err(StoreError::Conflict("destination directory already exists"));
            }
            if let Some(parent) = new_dir.parent() {
                self.fs.create_dir_all(parent)?;
            }
            self.fs.rename(&old_dir, &new_dir)?;
            Some(DirMove {
                from: old_dir.clone(),
                to: new_dir.clone(),
            })
        } else {
            None
        };

        let plan = if sku_changed && !old_sku.is_empty() {
            match plan_sku_renames(&self.fs, &self.policy, &new_dir, &old_sku, &new_sku) {
                Ok(plan) => plan,
                Err(err) => {
                    self.undo_dir_move(dir_move.as_ref());
                    return Err(err);
                }
            }
        } else {
            Vec::new()
        };

        if let Err((applied, err)) = self.apply_renames(&plan) {
            self.reverse_renames(&plan[..applied]);
            self.undo_dir_move(dir_move.as_ref());
            return Err(StoreError::Io(err));
        }

        let record = ProductRecord {
            key: new_key.clone(),
            sku: new_sku.clone(),
            status: current.status,
            fields: request.fields.clone().unwrap_or_else(|| current.fields.clone()),
        };
        let persisted = match self.store.update_product(&old_key, &record) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound("product")),
            Err(err) => Err(err),
        };
        if let Err(err) = persisted {
            self.reverse_renames(&plan);
            self.undo_dir_move(dir_move.as_ref());
            return Err(err);
        }

        let refs_propagated = if key_changed || sku_changed {
            let sku = sku_changed.then_some(new_sku.as_str());
            match self.store.update_variant_refs(&old_key, &new_key, sku) {
                Ok(_) => true,
                Err(err) => {
                    let err = StoreError::partial("propagate variant refs", err);
                    tracing::warn!(
                        from = %old_key,
                        to = %new_key,
                        code = err.code(),
                        error = %err,
                        "renamed product but dependent rows kept the old key"
                    );
                    false
                }
            }
        } else {
            true
        };

        tracing::info!(
            from = %old_key,
            to = %new_key,
            old_sku = %old_sku,
            sku = %new_sku,
            files_renamed = plan.len(),
            "product renamed"
        );
        Ok(RenameOutcome {
            category: new_key.category().to_string(),
            folder: new_key.folder().to_string(),
            sku: new_sku,
            files_renamed: plan.len(),
            refs_propagated,
        })
    }

    /// Applies `plan` in order. On failure returns how many renames landed.
    fn apply_renames(&self, plan: &[FileRename]) -> Result<(), (usize, std::io::Error)> {
        for (index, rename) in plan.iter().enumerate() {
            if let Err(err) = self.fs.rename(&rename.from, &rename.to) {
                tracing::warn!(
                    from = %rename.from.display(),
                    to = %rename.to.display(),
                    error = %err,
                    "file rename failed"
                );
                return Err((index, err));
            }
        }
        Ok(())
    }

    /// Walks `applied` backwards, moving each file home when its destination
    /// is present and its source slot is still free.
    fn reverse_renames(&self, applied: &[FileRename]) {
        for rename in applied.iter().rev() {
            if !self.fs.exists(&rename.to) || self.fs.exists(&rename.from) {
                continue;
            }
            if let Err(err) = self.fs.rename(&rename.to, &rename.from) {
                tracing::warn!(
                    from = %rename.to.display(),
                    to = %rename.from.display(),
                    error = %err,
                    "compensating file rename failed"
                );
            }
        }
    }

    fn undo_dir_move(&self, dir_move: Option<&DirMove>) {
        if let Some(dir_move) = dir_move {
            self.move_back(&dir_move.to, &dir_move.from);
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
