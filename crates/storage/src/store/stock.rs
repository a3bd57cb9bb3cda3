#![forbid(unsafe_code)]

use super::*;
use inv_core::VariantKey;
use rusqlite::{OptionalExtension, Transaction, params};

const NO_STOCK_ROW: &str = "no existing stock entry to decrement";

impl SqliteStore {
    /// Applies `delta` to the stock row at `key`.
    ///
    /// A row never survives at zero: when the result is `<= 0` the row is
    /// deleted. Decrementing a key with no row is an error. A given `sku` is
    /// stamped on the row; otherwise a new row takes the registry SKU and an
    /// existing row keeps its own.
    pub fn adjust_stock(
        &mut self,
        key: &VariantKey,
        delta: i64,
        sku: Option<&str>,
    ) -> Result<QuantityChange, StoreError> {
        if delta == 0 {
            return Err(StoreError::InvalidArgument("delta must not be zero"));
        }
        let tx = self.conn.transaction()?;
        let change = adjust_stock_tx(&tx, key, delta, sku)?;
        tx.commit()?;
        tracing::debug!(
            category = key.category(),
            folder = key.folder(),
            color = key.color(),
            size = key.size(),
            delta,
            quantity = change.quantity,
            "stock adjusted"
        );
        Ok(change)
    }

    /// Sale-side decrement. A missing row means there is nothing to take
    /// from, which is not an error here.
    pub(crate) fn decrement_stock_lenient(
        &mut self,
        key: &VariantKey,
        quantity: i64,
    ) -> Result<QuantityChange, StoreError> {
        match self.adjust_stock(key, -quantity, None) {
            Err(StoreError::InvalidArgument(NO_STOCK_ROW)) => {
                tracing::debug!(
                    category = key.category(),
                    folder = key.folder(),
                    color = key.color(),
                    size = key.size(),
                    "no stock row to decrement"
                );
                Ok(QuantityChange::removed())
            }
            other => other,
        }
    }

    pub fn stock_entry(&self, key: &VariantKey) -> Result<Option<StockEntry>, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT sku, quantity, updated_at_ms FROM stock \
                 WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4",
                params![key.category(), key.folder(), key.color(), key.size()],
                |row| {
                    Ok(StockEntry {
                        key: key.clone(),
                        sku: row.get(0)?,
                        quantity: row.get(1)?,
                        updated_at_ms: row.get(2)?,
                    })
                },
            )
            .optional()?)
    }

    /// Quantity on hand; an absent row reads as zero.
    pub fn stock_quantity(&self, key: &VariantKey) -> Result<i64, StoreError> {
        Ok(self.stock_entry(key)?.map_or(0, |entry| entry.quantity))
    }

    pub fn list_stock(&self) -> Result<Vec<StockEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, product_folder, color, size, sku, quantity, updated_at_ms \
             FROM stock ORDER BY category, product_folder, color, size",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let folder: String = row.get(1)?;
            let color: String = row.get(2)?;
            let size: String = row.get(3)?;
            out.push(StockEntry {
                key: VariantKey::try_new(&category, &folder, &color, &size)?,
                sku: row.get(4)?,
                quantity: row.get(5)?,
                updated_at_ms: row.get(6)?,
            });
        }
        Ok(out)
    }

    /// Import path: writes an absolute quantity. Zero or less deletes the row.
    pub fn set_stock_entry(
        &mut self,
        key: &VariantKey,
        sku: &str,
        quantity: i64,
    ) -> Result<QuantityChange, StoreError> {
        let tx = self.conn.transaction()?;
        let change = if quantity <= 0 {
            delete_stock_tx(&tx, key)?;
            QuantityChange::removed()
        } else {
            tx.execute(
                "INSERT INTO stock(category, product_folder, sku, color, size, quantity, updated_at_ms) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
                 ON CONFLICT(category, product_folder, color, size) DO UPDATE SET \
                   sku=excluded.sku, quantity=excluded.quantity, updated_at_ms=excluded.updated_at_ms",
                params![
                    key.category(),
                    key.folder(),
                    sku.trim(),
                    key.color(),
                    key.size(),
                    quantity,
                    now_ms()
                ],
            )?;
            QuantityChange::kept(quantity)
        };
        tx.commit()?;
        Ok(change)
    }
}

pub(super) fn adjust_stock_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    delta: i64,
    sku: Option<&str>,
) -> Result<QuantityChange, StoreError> {
    match stock_quantity_tx(tx, key)? {
        Some(current) => {
            let sku = sku.map(str::trim).filter(|sku| !sku.is_empty());
            write_stock_quantity_tx(tx, key, checked_quantity(current, delta)?, sku)
        }
        None if delta < 0 => Err(StoreError::InvalidArgument(NO_STOCK_ROW)),
        None => {
            let sku = resolve_sku_tx(tx, key, sku)?;
            insert_stock_tx(tx, key, &sku, delta)?;
            Ok(QuantityChange::kept(delta))
        }
    }
}

fn stock_quantity_tx(tx: &Transaction<'_>, key: &VariantKey) -> Result<Option<i64>, StoreError> {
    Ok(tx
        .query_row(
            "SELECT quantity FROM stock \
             WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4",
            params![key.category(), key.folder(), key.color(), key.size()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?)
}

fn write_stock_quantity_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    quantity: i64,
    sku: Option<&str>,
) -> Result<QuantityChange, StoreError> {
    if quantity <= 0 {
        delete_stock_tx(tx, key)?;
        return Ok(QuantityChange::removed());
    }
    tx.execute(
        "UPDATE stock SET quantity=?1, sku=COALESCE(?2, sku), updated_at_ms=?3 \
         WHERE category=?4 AND product_folder=?5 AND color=?6 AND size=?7",
        params![
            quantity,
            sku,
            now_ms(),
            key.category(),
            key.folder(),
            key.color(),
            key.size()
        ],
    )?;
    Ok(QuantityChange::kept(quantity))
}

fn insert_stock_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    sku: &str,
    quantity: i64,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO stock(category, product_folder, sku, color, size, quantity, updated_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            key.category(),
            key.folder(),
            sku,
            key.color(),
            key.size(),
            quantity,
            now_ms()
        ],
    )?;
    Ok(())
}

fn delete_stock_tx(tx: &Transaction<'_>, key: &VariantKey) -> Result<(), StoreError> {
    tx.execute(
        "DELETE FROM stock WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4",
        params![key.category(), key.folder(), key.color(), key.size()],
    )?;
    Ok(())
}

fn resolve_sku_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    sku: Option<&str>,
) -> Result<String, StoreError> {
    if let Some(sku) = sku.map(str::trim).filter(|sku| !sku.is_empty()) {
        return Ok(sku.to_string());
    }
    Ok(tx
        .query_row(
            "SELECT sku FROM products WHERE category=?1 AND product_folder=?2",
            params![key.category(), key.folder()],
            |row| row.get::<_, String>(0),
        )
        .optional()?
        .unwrap_or_default())
}
