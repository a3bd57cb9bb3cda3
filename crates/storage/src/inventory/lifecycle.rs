#![forbid(unsafe_code)]

use super::Inventory;
use crate::mirror::ProductFs;
use crate::store::{CreateProductRequest, Product, ProductFields, ProductRecord, StoreError};
use inv_core::ids::{safe_path_component, sanitize_folder_name};
use inv_core::sku::{next_sku, sku_prefix};
use inv_core::{ProductKey, ProductStatus, SkuNamingPolicy};
use std::path::Path;

const SCAFFOLD_DIRS: [&str; 3] = ["Media", "STL", "MISC"];
const UKCA_DIR: &str = "UKCA";

impl<F: ProductFs, P: SkuNamingPolicy> Inventory<F, P> {
    /// Allocates the next SKU for the category, scaffolds a Draft directory
    /// named `"<SKU> - <description>"` and registers it.
    pub fn create_product(&mut self, request: &CreateProductRequest) -> Result<Product, StoreError> {
        let category = safe_path_component(&request.category);
        let description = sanitize_folder_name(&safe_path_component(&request.description));
        if category.is_empty() || description.is_empty() {
            return Err(StoreError::InvalidArgument("category and description are required"));
        }
        let prefix = sku_prefix(&category).ok_or(StoreError::InvalidArgument("unknown category"))?;

        let mut taken = self.store.skus_in_category(&category)?;
        for status in ProductStatus::ALL {
            taken.extend(self.fs.list_dir_names(&self.tree.category_dir(status, &category))?);
        }
        let sku = next_sku(prefix, &taken);
        let key = ProductKey::try_new(&category, &format!("{sku} - {description}"))?;

        let dir = self.tree.product_dir(ProductStatus::Draft, &key);
        if self.store.exists(&key)? || self.fs.exists(&dir) {
            return Err(StoreError::Conflict("product folder already exists"));
        }
        if let Err(err) = self.scaffold(&dir, &description, &sku, request) {
            self.discard_dir(&dir);
            return Err(err);
        }

        let record = ProductRecord {
            key: key.clone(),
            sku: sku.clone(),
            status: ProductStatus::Draft,
            fields: ProductFields {
                ukca: if request.requires_ukca { "No" } else { "N/A" }.to_string(),
                tags: request.tags.clone(),
                ..ProductFields::default()
            },
        };
        match self.store.insert_product(&record) {
            Ok(product) => {
                tracing::info!(
                    category = key.category(),
                    folder = key.folder(),
                    sku = %sku,
                    "product created"
                );
                Ok(product)
            }
            Err(err) => {
                self.discard_dir(&dir);
                Err(err)
            }
        }
    }

    /// Moves the product directory to the subtree for `status`, then records
    /// the new status. A registry failure moves the directory back.
    pub fn set_status(
        &mut self,
        key: &ProductKey,
        status: ProductStatus,
    ) -> Result<Product, StoreError> {
        let current = self.registered(key)?;
        if current.status == status {
            return Ok(current);
        }
        let from = self.tree.product_dir(current.status, key);
        let to = self.tree.product_dir(status, key);
        if !self.fs.exists(&from) {
            return Err(StoreError::NotFound("product directory"));
        }
        if self.fs.exists(&to) {
            return Err(StoreError::Conflict("destination directory already exists"));
        }
        if let Some(parent) = to.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.rename(&from, &to)?;

        let updated = match self.store.set_product_status(key, status) {
            Ok(true) => Ok(()),
            Ok(false) => Err(StoreError::NotFound("product")),
            Err(err) => Err(err),
        };
        if let Err(err) = updated {
            self.move_back(&to, &from);
            return Err(err);
        }
        tracing::info!(
            category = key.category(),
            folder = key.folder(),
            from = current.status.as_str(),
            to = status.as_str(),
            "product status changed"
        );
        self.registered(key)
    }

    fn scaffold(
        &self,
        dir: &Path,
        title: &str,
        sku: &str,
        request: &CreateProductRequest,
    ) -> Result<(), StoreError> {
        self.fs.create_dir_all(dir)?;
        for name in SCAFFOLD_DIRS {
            self.fs.create_dir_all(&dir.join(name))?;
        }
        if request.requires_ukca {
            self.fs.create_dir_all(&dir.join(UKCA_DIR))?;
        }
        let mut readme = readme_template(title, sku);
        let notes = request.notes.trim();
        if !notes.is_empty() {
            readme.push_str(&format!("\n## Notes\n{notes}\n"));
        }
        self.fs.write(&dir.join("README.md"), readme.as_bytes())?;
        Ok(())
    }

    fn discard_dir(&self, dir: &Path) {
        if !self.fs.exists(dir) {
            return;
        }
        if let Err(err) = self.fs.remove_dir_all(dir) {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to remove scaffolded directory");
        }
    }
}

fn readme_template(title: &str, sku: &str) -> String {
    format!(
        "# {title}\n\n\
         SKU: {sku}\n\n\
         ## Short Description\n\n\
         ## Long Description\n\n\
         ## Features / Bullet Points\n\
         - \n- \n- \n\n\
         ## Variations / Sizes\n\n\
         ## Colours\n\n\
         ## Materials\n\n\
         ## Print Settings\n\n\
         ## Assembly\n\n\
         ## Packaging\n\n\
         ## Listing Keywords / Tags\n\n\
         ## UKCA Notes\n\n\
         ## Change Log\n- \n"
    )
}
