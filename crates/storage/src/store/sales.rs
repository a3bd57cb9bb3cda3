#![forbid(unsafe_code)]

use super::production::adjust_production_by_key_tx;
use super::stock::adjust_stock_tx;
use super::support::{
    SALE_COLUMNS, event_exists_tx, format_price, lookup_product_by_id_tx, lookup_product_tx,
    read_sale_row, validate_price,
};
use super::*;
use inv_core::{ProductionStatus, VariantKey};
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use rust_decimal::Decimal;

impl SqliteStore {
    /// Records a sale and cascades it into the ledgers.
    ///
    /// The sale row commits first. The stock decrement and the queued
    /// production increment run afterwards as separate steps; their failures
    /// are logged and reported through `inventory_applied`.
    pub fn record_sale(&mut self, sale: &NewSale) -> Result<SaleOutcome, StoreError> {
        validate_quantity(sale.quantity)?;
        let unit_price = validate_price(sale.unit_price, "unit price must be >= 0 with 2 decimals")?;
        let override_price = validate_override(sale.override_price)?;

        let tx = self.conn.transaction()?;
        if !event_exists_tx(&tx, sale.event_id)? {
            return Err(StoreError::NotFound("event"));
        }
        let (product_id, sku) = snapshot_tx(&tx, &sale.key)?;
        tx.execute(
            "INSERT INTO sales(event_id, product_id, category, product_folder, sku, color, size, \
             quantity, unit_price, override_price, payment_method, created_at_ms) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                sale.event_id,
                product_id,
                sale.key.category(),
                sale.key.folder(),
                sku,
                sale.key.color(),
                sale.key.size(),
                sale.quantity,
                format_price(unit_price),
                override_price.map(format_price),
                sale.payment_method.as_str(),
                now_ms()
            ],
        )?;
        let id = tx.last_insert_rowid();
        let recorded = sale_tx(&tx, id)?.ok_or(StoreError::NotFound("sale"))?;
        tx.commit()?;
        tracing::info!(
            sale_id = id,
            event_id = sale.event_id,
            category = sale.key.category(),
            folder = sale.key.folder(),
            sku = %recorded.sku,
            quantity = sale.quantity,
            "sale recorded"
        );

        let inventory_applied = self.apply_sale_effect(&sale.key, sale.quantity);
        Ok(SaleOutcome {
            sale: recorded,
            inventory_applied,
        })
    }

    /// Replaces a sale's variant, quantity, prices and payment method.
    ///
    /// Same variant: the ledgers move by the quantity difference. Changed
    /// variant: the old effect is reversed and the new one applied as two
    /// independent steps.
    pub fn update_sale(&mut self, id: i64, update: &SaleUpdate) -> Result<SaleOutcome, StoreError> {
        validate_quantity(update.quantity)?;
        let unit_price =
            validate_price(update.unit_price, "unit price must be >= 0 with 2 decimals")?;
        let override_price = validate_override(update.override_price)?;

        let tx = self.conn.transaction()?;
        let previous = sale_tx(&tx, id)?.ok_or(StoreError::NotFound("sale"))?;
        let (previous_target, _) = ledger_target_tx(&tx, &previous)?;
        // Naming the sale's own product, by its recorded or its current key,
        // keeps the sale on that product.
        let target = if update.key.product() == previous.key.product()
            || update.key.product() == previous_target.product()
        {
            previous_target
                .product()
                .variant(update.key.color(), update.key.size())
        } else {
            update.key.clone()
        };
        let (product_id, sku) = if target.product() == previous_target.product() {
            (previous.product_id, previous.sku.clone())
        } else {
            snapshot_tx(&tx, &target)?
        };
        tx.execute(
            "UPDATE sales SET product_id=?1, category=?2, product_folder=?3, sku=?4, color=?5, \
             size=?6, quantity=?7, unit_price=?8, override_price=?9, payment_method=?10 \
             WHERE id=?11",
            params![
                product_id,
                update.key.category(),
                update.key.folder(),
                sku,
                update.key.color(),
                update.key.size(),
                update.quantity,
                format_price(unit_price),
                override_price.map(format_price),
                update.payment_method.as_str(),
                id
            ],
        )?;
        let updated = sale_tx(&tx, id)?.ok_or(StoreError::NotFound("sale"))?;
        tx.commit()?;

        let inventory_applied = if previous_target == target {
            let diff = update.quantity - previous.quantity;
            match diff.cmp(&0) {
                std::cmp::Ordering::Greater => self.apply_sale_effect(&target, diff),
                std::cmp::Ordering::Less => self.reverse_sale_effect(&target, -diff),
                std::cmp::Ordering::Equal => true,
            }
        } else {
            let restored = self.reverse_sale_effect(&previous_target, previous.quantity);
            let applied = self.apply_sale_effect(&target, update.quantity);
            restored && applied
        };
        tracing::info!(sale_id = id, quantity = update.quantity, "sale updated");
        Ok(SaleOutcome {
            sale: updated,
            inventory_applied,
        })
    }

    /// Deletes a sale and returns its quantity to stock, taking it back out
    /// of the queued production bucket. All three writes share one
    /// transaction. The ledgers are adjusted under the product's current
    /// key, so a rename since the sale does not strand the rows.
    pub fn delete_sale(&mut self, id: i64) -> Result<Sale, StoreError> {
        let tx = self.conn.transaction()?;
        let sale = sale_tx(&tx, id)?.ok_or(StoreError::NotFound("sale"))?;
        let (key, sku) = ledger_target_tx(&tx, &sale)?;
        adjust_stock_tx(&tx, &key, sale.quantity, Some(&sku))?;
        adjust_production_by_key_tx(&tx, &key, -sale.quantity, ProductionStatus::Queued)?;
        tx.execute("DELETE FROM sales WHERE id=?1", params![id])?;
        tx.commit()?;
        tracing::info!(
            sale_id = id,
            category = key.category(),
            folder = key.folder(),
            quantity = sale.quantity,
            "sale deleted"
        );
        Ok(sale)
    }

    pub fn get_sale(&self, id: i64) -> Result<Option<Sale>, StoreError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id=?1");
        self.conn
            .query_row(&sql, params![id], read_sale_row)
            .optional()?
            .map(|row| row.into_sale())
            .transpose()
    }

    pub fn list_sales(&self, event_id: i64) -> Result<Vec<Sale>, StoreError> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE event_id=?1 ORDER BY id");
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params![event_id])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(read_sale_row(row)?.into_sale()?);
        }
        Ok(out)
    }

    /// `-quantity` stock, `+quantity` queued production.
    fn apply_sale_effect(&mut self, key: &VariantKey, quantity: i64) -> bool {
        let stock = self.decrement_stock_lenient(key, quantity);
        let stock_ok = log_cascade_step(key, "stock decrement", stock);
        let production = self.adjust_production_by_key(key, quantity, ProductionStatus::Queued);
        let production_ok = log_cascade_step(key, "production increment", production);
        stock_ok && production_ok
    }

    /// `+quantity` stock, `-quantity` queued production.
    fn reverse_sale_effect(&mut self, key: &VariantKey, quantity: i64) -> bool {
        let stock = self.adjust_stock(key, quantity, None);
        let stock_ok = log_cascade_step(key, "stock restore", stock);
        let production = self.adjust_production_by_key(key, -quantity, ProductionStatus::Queued);
        let production_ok = log_cascade_step(key, "production decrement", production);
        stock_ok && production_ok
    }
}

fn log_cascade_step(
    key: &VariantKey,
    step: &'static str,
    result: Result<QuantityChange, StoreError>,
) -> bool {
    match result {
        Ok(_) => true,
        Err(err) => {
            let err = StoreError::partial(step, err);
            tracing::warn!(
                category = key.category(),
                folder = key.folder(),
                color = key.color(),
                size = key.size(),
                code = err.code(),
                error = %err,
                "sale ledger cascade failed"
            );
            false
        }
    }
}

fn validate_quantity(quantity: i64) -> Result<(), StoreError> {
    if quantity <= 0 {
        return Err(StoreError::InvalidArgument("sale quantity must be > 0"));
    }
    Ok(())
}

fn validate_override(value: Option<Decimal>) -> Result<Option<Decimal>, StoreError> {
    value
        .map(|price| validate_price(price, "override price must be >= 0 with 2 decimals"))
        .transpose()
}

fn snapshot_tx(tx: &Transaction<'_>, key: &VariantKey) -> Result<(Option<i64>, String), StoreError> {
    let product = lookup_product_tx(tx, key.product())?.ok_or(StoreError::NotFound("product"))?;
    Ok((Some(product.id), product.sku))
}

/// The variant whose ledgers carry a sale's effect, with the SKU to stamp.
/// Follows `product_id` to the product's current key and falls back to the
/// recorded snapshot when the product is gone.
fn ledger_target_tx(conn: &Connection, sale: &Sale) -> Result<(VariantKey, String), StoreError> {
    let current = match sale.product_id {
        Some(product_id) => lookup_product_by_id_tx(conn, product_id)?,
        None => None,
    };
    Ok(match current {
        Some(product) => (sale.key.with_product(product.key), product.sku),
        None => (sale.key.clone(), sale.sku.clone()),
    })
}

fn sale_tx(tx: &Transaction<'_>, id: i64) -> Result<Option<Sale>, StoreError> {
    let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id=?1");
    tx.query_row(&sql, params![id], read_sale_row)
        .optional()?
        .map(|row| row.into_sale())
        .transpose()
}
