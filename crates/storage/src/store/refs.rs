#![forbid(unsafe_code)]

use super::*;
use inv_core::ProductKey;
use rusqlite::{Transaction, params};

impl SqliteStore {
    /// Moves every variant-keyed row of `old` onto `new`.
    ///
    /// Rows that collide with an existing row at the destination are merged
    /// by adding quantities, saturating at `i64::MAX`. Stock rows also take
    /// `new_sku` when given. Sales are snapshots and are never rewritten.
    pub fn update_variant_refs(
        &mut self,
        old: &ProductKey,
        new: &ProductKey,
        new_sku: Option<&str>,
    ) -> Result<RefsMoved, StoreError> {
        let new_sku = new_sku.map(str::trim).filter(|sku| !sku.is_empty());
        let tx = self.conn.transaction()?;
        let moved = if old == new {
            RefsMoved {
                stock: restamp_stock_sku_tx(&tx, old, new_sku)?,
                ..RefsMoved::default()
            }
        } else {
            RefsMoved {
                stock: move_stock_tx(&tx, old, new, new_sku)?,
                production: move_production_tx(&tx, old, new)?,
                targets: move_targets_tx(&tx, old, new)?,
            }
        };
        tx.commit()?;
        tracing::info!(
            from = %old,
            to = %new,
            stock = moved.stock,
            production = moved.production,
            targets = moved.targets,
            "variant refs moved"
        );
        Ok(moved)
    }
}

fn restamp_stock_sku_tx(
    tx: &Transaction<'_>,
    key: &ProductKey,
    new_sku: Option<&str>,
) -> Result<usize, StoreError> {
    let Some(sku) = new_sku else {
        return Ok(0);
    };
    Ok(tx.execute(
        "UPDATE stock SET sku=?1, updated_at_ms=?2 WHERE category=?3 AND product_folder=?4",
        params![sku, now_ms(), key.category(), key.folder()],
    )?)
}

fn move_stock_tx(
    tx: &Transaction<'_>,
    old: &ProductKey,
    new: &ProductKey,
    new_sku: Option<&str>,
) -> Result<usize, StoreError> {
    tx.execute(
        "INSERT INTO stock(category, product_folder, sku, color, size, quantity, updated_at_ms) \
         SELECT ?1, ?2, COALESCE(?3, sku), color, size, quantity, ?4 FROM stock \
         WHERE category=?5 AND product_folder=?6 \
         ON CONFLICT(category, product_folder, color, size) DO UPDATE SET \
           quantity=MIN(stock.quantity, 9223372036854775807 - excluded.quantity) + excluded.quantity, \
           sku=excluded.sku, \
           updated_at_ms=excluded.updated_at_ms",
        params![
            new.category(),
            new.folder(),
            new_sku,
            now_ms(),
            old.category(),
            old.folder()
        ],
    )?;
    Ok(tx.execute(
        "DELETE FROM stock WHERE category=?1 AND product_folder=?2",
        params![old.category(), old.folder()],
    )?)
}

fn move_production_tx(
    tx: &Transaction<'_>,
    old: &ProductKey,
    new: &ProductKey,
) -> Result<usize, StoreError> {
    tx.execute(
        "INSERT INTO production_queue(category, product_folder, color, size, status, quantity, updated_at_ms) \
         SELECT ?1, ?2, color, size, status, quantity, ?3 FROM production_queue \
         WHERE category=?4 AND product_folder=?5 \
         ON CONFLICT(category, product_folder, color, size, status) DO UPDATE SET \
           quantity=MIN(production_queue.quantity, 9223372036854775807 - excluded.quantity) + excluded.quantity, \
           updated_at_ms=excluded.updated_at_ms",
        params![
            new.category(),
            new.folder(),
            now_ms(),
            old.category(),
            old.folder()
        ],
    )?;
    Ok(tx.execute(
        "DELETE FROM production_queue WHERE category=?1 AND product_folder=?2",
        params![old.category(), old.folder()],
    )?)
}

fn move_targets_tx(
    tx: &Transaction<'_>,
    old: &ProductKey,
    new: &ProductKey,
) -> Result<usize, StoreError> {
    tx.execute(
        "INSERT INTO event_targets(event_id, category, product_folder, color, size, quantity) \
         SELECT event_id, ?1, ?2, color, size, quantity FROM event_targets \
         WHERE category=?3 AND product_folder=?4 \
         ON CONFLICT(event_id, category, product_folder, color, size) DO UPDATE SET \
           quantity=MIN(event_targets.quantity, 9223372036854775807 - excluded.quantity) + excluded.quantity",
        params![new.category(), new.folder(), old.category(), old.folder()],
    )?;
    Ok(tx.execute(
        "DELETE FROM event_targets WHERE category=?1 AND product_folder=?2",
        params![old.category(), old.folder()],
    )?)
}
