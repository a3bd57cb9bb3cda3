#![forbid(unsafe_code)]

use super::support::{PRODUCT_COLUMNS, lookup_product_tx, product_exists_tx, read_product_row};
use super::*;
use inv_core::{ProductKey, ProductStatus};
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    pub fn lookup(&self, key: &ProductKey) -> Result<Option<Product>, StoreError> {
        lookup_product_tx(&self.conn, key)
    }

    pub fn exists(&self, key: &ProductKey) -> Result<bool, StoreError> {
        product_exists_tx(&self.conn, key)
    }

    pub fn product_id(&self, key: &ProductKey) -> Result<Option<i64>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM products WHERE category=?1 AND product_folder=?2",
                params![key.category(), key.folder()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?)
    }

    pub fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY category, product_folder");
        self.collect_products(&sql, [])
    }

    pub fn list_products_by_status(
        &self,
        status: ProductStatus,
    ) -> Result<Vec<Product>, StoreError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE status=?1 \
             ORDER BY category, product_folder"
        );
        self.collect_products(&sql, params![status.as_str()])
    }

    /// Every SKU recorded under `category`, used for SKU allocation.
    pub fn skus_in_category(&self, category: &str) -> Result<Vec<String>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT sku FROM products WHERE category=?1 AND sku <> '' ORDER BY sku")?;
        let mut rows = stmt.query(params![category.trim()])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row.get::<_, String>(0)?);
        }
        Ok(out)
    }

    /// Inserts a new product. Duplicate key or SKU is a [`StoreError::Conflict`].
    pub fn insert_product(&mut self, record: &ProductRecord) -> Result<Product, StoreError> {
        let record = normalize_record(record);
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        if product_exists_tx(&tx, &record.key)? {
            return Err(StoreError::Conflict("product folder already exists"));
        }
        ensure_sku_free_tx(&tx, &record.sku, None)?;

        let fields = &record.fields;
        tx.execute(
            "INSERT INTO products(category, product_folder, sku, ukca, listings, tags, \
             facebook_url, tiktok_url, ebay_url, etsy_url, status, colors, sizes, cost_to_make, \
             sale_price, postage_price, created_at_ms, updated_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17)",
            params![
                record.key.category(),
                record.key.folder(),
                record.sku,
                fields.ukca,
                fields.listings,
                fields.tags,
                fields.facebook_url,
                fields.tiktok_url,
                fields.ebay_url,
                fields.etsy_url,
                record.status.as_str(),
                fields.colors,
                fields.sizes,
                fields.cost_to_make,
                fields.sale_price,
                fields.postage_price,
                now_ms,
            ],
        )
        .map_err(|err| map_unique_conflict(err, "product already exists"))?;

        let product = lookup_product_tx(&tx, &record.key)?
            .ok_or(StoreError::NotFound("inserted product"))?;
        tx.commit()?;
        tracing::info!(
            category = record.key.category(),
            folder = record.key.folder(),
            sku = %record.sku,
            "product inserted"
        );
        Ok(product)
    }

    /// Bulk import keyed by `(category, folder)`: new keys are inserted,
    /// existing ones overwritten in place. Runs as one transaction.
    pub fn upsert_products(&mut self, records: &[ProductRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        for record in records {
            let record = normalize_record(record);
            let fields = &record.fields;
            tx.execute(
                "INSERT INTO products(category, product_folder, sku, ukca, listings, tags, \
                 facebook_url, tiktok_url, ebay_url, etsy_url, status, colors, sizes, \
                 cost_to_make, sale_price, postage_price, created_at_ms, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?17) \
                 ON CONFLICT(category, product_folder) DO UPDATE SET \
                   sku=excluded.sku, ukca=excluded.ukca, listings=excluded.listings, \
                   tags=excluded.tags, facebook_url=excluded.facebook_url, \
                   tiktok_url=excluded.tiktok_url, ebay_url=excluded.ebay_url, \
                   etsy_url=excluded.etsy_url, status=excluded.status, colors=excluded.colors, \
                   sizes=excluded.sizes, cost_to_make=excluded.cost_to_make, \
                   sale_price=excluded.sale_price, postage_price=excluded.postage_price, \
                   updated_at_ms=excluded.updated_at_ms",
                params![
                    record.key.category(),
                    record.key.folder(),
                    record.sku,
                    fields.ukca,
                    fields.listings,
                    fields.tags,
                    fields.facebook_url,
                    fields.tiktok_url,
                    fields.ebay_url,
                    fields.etsy_url,
                    record.status.as_str(),
                    fields.colors,
                    fields.sizes,
                    fields.cost_to_make,
                    fields.sale_price,
                    fields.postage_price,
                    now_ms,
                ],
            )
            .map_err(|err| map_unique_conflict(err, "sku already assigned to another product"))?;
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Overwrites the row at `old` with `record`, including its key.
    ///
    /// Returns `Ok(false)` when `old` does not exist. A destination key or SKU
    /// owned by a different product is a [`StoreError::Conflict`]; in every
    /// failure case the row is left untouched.
    pub fn update_product(
        &mut self,
        old: &ProductKey,
        record: &ProductRecord,
    ) -> Result<bool, StoreError> {
        let record = normalize_record(record);
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        let Some(current) = lookup_product_tx(&tx, old)? else {
            return Ok(false);
        };
        if record.key != *old && product_exists_tx(&tx, &record.key)? {
            return Err(StoreError::Conflict("product folder already exists"));
        }
        ensure_sku_free_tx(&tx, &record.sku, Some(current.id))?;

        let fields = &record.fields;
        tx.execute(
            "UPDATE products SET category=?1, product_folder=?2, sku=?3, ukca=?4, listings=?5, \
             tags=?6, facebook_url=?7, tiktok_url=?8, ebay_url=?9, etsy_url=?10, status=?11, \
             colors=?12, sizes=?13, cost_to_make=?14, sale_price=?15, postage_price=?16, \
             updated_at_ms=?17 \
             WHERE id=?18",
            params![
                record.key.category(),
                record.key.folder(),
                record.sku,
                fields.ukca,
                fields.listings,
                fields.tags,
                fields.facebook_url,
                fields.tiktok_url,
                fields.ebay_url,
                fields.etsy_url,
                record.status.as_str(),
                fields.colors,
                fields.sizes,
                fields.cost_to_make,
                fields.sale_price,
                fields.postage_price,
                now_ms,
                current.id,
            ],
        )
        .map_err(|err| map_unique_conflict(err, "product key or sku already taken"))?;
        tx.commit()?;
        Ok(true)
    }

    /// Folder-only rename within a category.
    pub fn rename_product(
        &mut self,
        category: &str,
        old_folder: &str,
        new_folder: &str,
    ) -> Result<bool, StoreError> {
        let old = ProductKey::try_new(category, old_folder)?;
        let new = ProductKey::try_new(category, new_folder)?;
        let now_ms = now_ms();
        let tx = self.conn.transaction()?;
        if !product_exists_tx(&tx, &old)? {
            return Ok(false);
        }
        if new != old && product_exists_tx(&tx, &new)? {
            return Err(StoreError::Conflict("product folder already exists"));
        }
        tx.execute(
            "UPDATE products SET product_folder=?1, updated_at_ms=?2 \
             WHERE category=?3 AND product_folder=?4",
            params![new.folder(), now_ms, old.category(), old.folder()],
        )?;
        tx.commit()?;
        Ok(true)
    }

    pub fn set_product_status(
        &mut self,
        key: &ProductKey,
        status: ProductStatus,
    ) -> Result<bool, StoreError> {
        let updated = self.conn.execute(
            "UPDATE products SET status=?1, updated_at_ms=?2 \
             WHERE category=?3 AND product_folder=?4",
            params![status.as_str(), now_ms(), key.category(), key.folder()],
        )?;
        Ok(updated > 0)
    }

    fn collect_products<P: rusqlite::Params>(
        &self,
        sql: &str,
        params: P,
    ) -> Result<Vec<Product>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_product_row(row)?.into_product()?);
        }
        Ok(out)
    }
}

fn normalize_record(record: &ProductRecord) -> ProductRecord {
    ProductRecord {
        key: record.key.clone(),
        sku: record.sku.trim().to_string(),
        status: record.status,
        fields: record.fields.normalized(),
    }
}

fn ensure_sku_free_tx(
    tx: &Transaction<'_>,
    sku: &str,
    owner_id: Option<i64>,
) -> Result<(), StoreError> {
    if sku.is_empty() {
        return Ok(());
    }
    let holder = tx
        .query_row(
            "SELECT id FROM products WHERE sku=?1",
            params![sku],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    match holder {
        Some(id) if Some(id) != owner_id => {
            Err(StoreError::Conflict("sku already assigned to another product"))
        }
        _ => Ok(()),
    }
}
