#![forbid(unsafe_code)]

use super::super::{Product, ProductFields, Sale, StoreError};
use super::parse_price;
use inv_core::{PaymentMethod, ProductKey, ProductStatus, VariantKey};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub(in crate::store) const PRODUCT_COLUMNS: &str = "id, category, product_folder, sku, ukca, \
     listings, tags, facebook_url, tiktok_url, ebay_url, etsy_url, status, colors, sizes, \
     cost_to_make, sale_price, postage_price, created_at_ms, updated_at_ms";

pub(in crate::store) const SALE_COLUMNS: &str = "id, event_id, product_id, category, \
     product_folder, sku, color, size, quantity, unit_price, override_price, payment_method, \
     created_at_ms";

/// Raw product columns. Converted outside the rusqlite row closure so key and
/// status validation can report a [`StoreError`].
pub(in crate::store) struct ProductRow {
    id: i64,
    category: String,
    folder: String,
    sku: String,
    status: String,
    fields: ProductFields,
    created_at_ms: i64,
    updated_at_ms: i64,
}

pub(in crate::store) fn read_product_row(row: &Row<'_>) -> rusqlite::Result<ProductRow> {
    Ok(ProductRow {
        id: row.get(0)?,
        category: row.get(1)?,
        folder: row.get(2)?,
        sku: row.get(3)?,
        fields: ProductFields {
            ukca: row.get(4)?,
            listings: row.get(5)?,
            tags: row.get(6)?,
            facebook_url: row.get(7)?,
            tiktok_url: row.get(8)?,
            ebay_url: row.get(9)?,
            etsy_url: row.get(10)?,
            colors: row.get(12)?,
            sizes: row.get(13)?,
            cost_to_make: row.get(14)?,
            sale_price: row.get(15)?,
            postage_price: row.get(16)?,
        },
        status: row.get(11)?,
        created_at_ms: row.get(17)?,
        updated_at_ms: row.get(18)?,
    })
}

impl ProductRow {
    pub(in crate::store) fn into_product(self) -> Result<Product, StoreError> {
        let key = ProductKey::try_new(&self.category, &self.folder)?;
        let status = ProductStatus::parse(&self.status)
            .ok_or(StoreError::InvalidArgument("invalid product status row"))?;
        Ok(Product {
            id: self.id,
            key,
            sku: self.sku,
            status,
            fields: self.fields,
            created_at_ms: self.created_at_ms,
            updated_at_ms: self.updated_at_ms,
        })
    }
}

pub(in crate::store) struct SaleRow {
    id: i64,
    event_id: i64,
    product_id: Option<i64>,
    category: String,
    folder: String,
    sku: String,
    color: String,
    size: String,
    quantity: i64,
    unit_price: String,
    override_price: Option<String>,
    payment_method: String,
    created_at_ms: i64,
}

pub(in crate::store) fn read_sale_row(row: &Row<'_>) -> rusqlite::Result<SaleRow> {
    Ok(SaleRow {
        id: row.get(0)?,
        event_id: row.get(1)?,
        product_id: row.get(2)?,
        category: row.get(3)?,
        folder: row.get(4)?,
        sku: row.get(5)?,
        color: row.get(6)?,
        size: row.get(7)?,
        quantity: row.get(8)?,
        unit_price: row.get(9)?,
        override_price: row.get(10)?,
        payment_method: row.get(11)?,
        created_at_ms: row.get(12)?,
    })
}

impl SaleRow {
    pub(in crate::store) fn into_sale(self) -> Result<Sale, StoreError> {
        let key = VariantKey::try_new(&self.category, &self.folder, &self.color, &self.size)?;
        let payment_method = PaymentMethod::parse(&self.payment_method)
            .ok_or(StoreError::InvalidArgument("invalid payment method row"))?;
        Ok(Sale {
            id: self.id,
            event_id: self.event_id,
            product_id: self.product_id,
            key,
            sku: self.sku,
            quantity: self.quantity,
            unit_price: parse_price(&self.unit_price)?,
            override_price: self.override_price.as_deref().map(parse_price).transpose()?,
            payment_method,
            created_at_ms: self.created_at_ms,
        })
    }
}

pub(in crate::store) fn lookup_product_tx(
    conn: &Connection,
    key: &ProductKey,
) -> Result<Option<Product>, StoreError> {
    let sql = format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE category=?1 AND product_folder=?2"
    );
    conn.query_row(&sql, params![key.category(), key.folder()], read_product_row)
        .optional()?
        .map(ProductRow::into_product)
        .transpose()
}

pub(in crate::store) fn lookup_product_by_id_tx(
    conn: &Connection,
    id: i64,
) -> Result<Option<Product>, StoreError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id=?1");
    conn.query_row(&sql, params![id], read_product_row)
        .optional()?
        .map(ProductRow::into_product)
        .transpose()
}

pub(in crate::store) fn product_exists_tx(
    conn: &Connection,
    key: &ProductKey,
) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM products WHERE category=?1 AND product_folder=?2",
            params![key.category(), key.folder()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}

pub(in crate::store) fn event_exists_tx(
    conn: &Connection,
    event_id: i64,
) -> Result<bool, StoreError> {
    Ok(conn
        .query_row(
            "SELECT 1 FROM events WHERE id=?1",
            params![event_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?
        .is_some())
}
