#![forbid(unsafe_code)]

use super::*;
use inv_core::{ProductionStatus, VariantKey};
use rusqlite::{OptionalExtension, Transaction, params};

impl SqliteStore {
    /// Strict adjustment of one `(variant, status)` bucket. Same
    /// clamp-and-delete rules as [`SqliteStore::adjust_stock`].
    pub fn adjust_production(
        &mut self,
        key: &VariantKey,
        status: ProductionStatus,
        delta: i64,
    ) -> Result<QuantityChange, StoreError> {
        if delta == 0 {
            return Err(StoreError::InvalidArgument("delta must not be zero"));
        }
        let tx = self.conn.transaction()?;
        let change = if delta > 0 {
            add_production_tx(&tx, key, status, delta)?
        } else {
            match production_quantity_tx(&tx, key, status)? {
                Some(current) => {
                    write_production_quantity_tx(&tx, key, status, checked_quantity(current, delta)?)?
                }
                None => {
                    return Err(StoreError::InvalidArgument(
                        "no existing production entry to decrement",
                    ));
                }
            }
        };
        tx.commit()?;
        tracing::debug!(
            category = key.category(),
            folder = key.folder(),
            color = key.color(),
            size = key.size(),
            status = status.as_str(),
            delta,
            quantity = change.quantity,
            "production adjusted"
        );
        Ok(change)
    }

    /// Lenient adjustment used by the sale cascade. Zero is a no-op, and a
    /// decrement against a missing bucket does nothing.
    pub fn adjust_production_by_key(
        &mut self,
        key: &VariantKey,
        delta: i64,
        status: ProductionStatus,
    ) -> Result<QuantityChange, StoreError> {
        let tx = self.conn.transaction()?;
        let change = adjust_production_by_key_tx(&tx, key, delta, status)?;
        tx.commit()?;
        if delta != 0 {
            tracing::debug!(
                category = key.category(),
                folder = key.folder(),
                status = status.as_str(),
                delta,
                quantity = change.quantity,
                "production adjusted by key"
            );
        }
        Ok(change)
    }

    pub fn production_quantity(
        &self,
        key: &VariantKey,
        status: ProductionStatus,
    ) -> Result<i64, StoreError> {
        Ok(self
            .conn
            .query_row(
                "SELECT quantity FROM production_queue \
                 WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4 AND status=?5",
                params![
                    key.category(),
                    key.folder(),
                    key.color(),
                    key.size(),
                    status.as_str()
                ],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .unwrap_or(0))
    }

    pub fn list_production(&self) -> Result<Vec<ProductionItem>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT category, product_folder, color, size, status, quantity, updated_at_ms \
             FROM production_queue ORDER BY category, product_folder, color, size, status",
        )?;
        let mut rows = stmt.query([])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let category: String = row.get(0)?;
            let folder: String = row.get(1)?;
            let color: String = row.get(2)?;
            let size: String = row.get(3)?;
            let status: String = row.get(4)?;
            out.push(ProductionItem {
                key: VariantKey::try_new(&category, &folder, &color, &size)?,
                status: ProductionStatus::parse(&status)
                    .ok_or(StoreError::InvalidArgument("invalid production status row"))?,
                quantity: row.get(5)?,
                updated_at_ms: row.get(6)?,
            });
        }
        Ok(out)
    }
}

pub(super) fn adjust_production_by_key_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    delta: i64,
    status: ProductionStatus,
) -> Result<QuantityChange, StoreError> {
    if delta > 0 {
        return add_production_tx(tx, key, status, delta);
    }
    let current = production_quantity_tx(tx, key, status)?;
    match current {
        None => Ok(QuantityChange::removed()),
        Some(current) if delta == 0 => Ok(QuantityChange::kept(current)),
        Some(current) => {
            write_production_quantity_tx(tx, key, status, checked_quantity(current, delta)?)
        }
    }
}

/// Merge-on-conflict insert: one statement, no read. The update is skipped
/// when the sum would leave the i64 range, which surfaces as no returned row.
fn add_production_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    status: ProductionStatus,
    delta: i64,
) -> Result<QuantityChange, StoreError> {
    let quantity = tx.query_row(
        "INSERT INTO production_queue(category, product_folder, color, size, status, quantity, updated_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT(category, product_folder, color, size, status) DO UPDATE SET \
           quantity=production_queue.quantity + excluded.quantity, \
           updated_at_ms=excluded.updated_at_ms \
         WHERE production_queue.quantity <= 9223372036854775807 - excluded.quantity \
         RETURNING quantity",
        params![
            key.category(),
            key.folder(),
            key.color(),
            key.size(),
            status.as_str(),
            delta,
            now_ms()
        ],
        |row| row.get::<_, i64>(0),
    )
    .optional()?
    .ok_or(StoreError::InvalidArgument(QUANTITY_OVERFLOW))?;
    Ok(QuantityChange::kept(quantity))
}

fn production_quantity_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    status: ProductionStatus,
) -> Result<Option<i64>, StoreError> {
    Ok(tx
        .query_row(
            "SELECT quantity FROM production_queue \
             WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4 AND status=?5",
            params![
                key.category(),
                key.folder(),
                key.color(),
                key.size(),
                status.as_str()
            ],
            |row| row.get::<_, i64>(0),
        )
        .optional()?)
}

fn write_production_quantity_tx(
    tx: &Transaction<'_>,
    key: &VariantKey,
    status: ProductionStatus,
    quantity: i64,
) -> Result<QuantityChange, StoreError> {
    if quantity <= 0 {
        tx.execute(
            "DELETE FROM production_queue \
             WHERE category=?1 AND product_folder=?2 AND color=?3 AND size=?4 AND status=?5",
            params![
                key.category(),
                key.folder(),
                key.color(),
                key.size(),
                status.as_str()
            ],
        )?;
        return Ok(QuantityChange::removed());
    }
    tx.execute(
        "UPDATE production_queue SET quantity=?1, updated_at_ms=?2 \
         WHERE category=?3 AND product_folder=?4 AND color=?5 AND size=?6 AND status=?7",
        params![
            quantity,
            now_ms(),
            key.category(),
            key.folder(),
            key.color(),
            key.size(),
            status.as_str()
        ],
    )?;
    Ok(QuantityChange::kept(quantity))
}
