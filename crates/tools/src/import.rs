#![forbid(unsafe_code)]

use anyhow::{Context, anyhow};
use inv_core::{ProductKey, ProductStatus, VariantKey};
use inv_storage::{ProductFields, ProductRecord, SqliteStore};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProductCsvRow {
    category: String,
    product_folder: String,
    sku: String,
    #[serde(rename = "UKCA")]
    ukca: String,
    #[serde(rename = "Listings")]
    listings: String,
    tags: String,
    #[serde(rename = "Facebook URL")]
    facebook_url: String,
    #[serde(rename = "TikTok URL")]
    tiktok_url: String,
    #[serde(rename = "Ebay URL")]
    ebay_url: String,
    #[serde(rename = "Etsy URL")]
    etsy_url: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Colors")]
    colors: String,
    #[serde(rename = "Sizes")]
    sizes: String,
    #[serde(rename = "Cost To Make")]
    cost_to_make: String,
    #[serde(rename = "Sale Price")]
    sale_price: String,
    #[serde(rename = "Postage Price")]
    postage_price: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StockCsvRow {
    category: String,
    product_folder: String,
    sku: String,
    color: String,
    size: String,
    quantity: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StockImport {
    pub key: VariantKey,
    pub sku: String,
    pub quantity: i64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub products: usize,
    pub stock_rows: usize,
    pub skipped: usize,
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input)
}

/// Parses the product index. Rows without a category or folder are skipped.
pub fn parse_products<R: Read>(input: R) -> anyhow::Result<(Vec<ProductRecord>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;
    for (line, row) in csv_reader(input).deserialize::<ProductCsvRow>().enumerate() {
        let row = row.with_context(|| format!("product row {}", line + 2))?;
        let Ok(key) = ProductKey::try_new(&row.category, &row.product_folder) else {
            skipped += 1;
            continue;
        };
        records.push(ProductRecord {
            key,
            sku: row.sku,
            status: ProductStatus::normalize(&row.status),
            fields: ProductFields {
                ukca: row.ukca,
                listings: row.listings,
                tags: row.tags,
                facebook_url: row.facebook_url,
                tiktok_url: row.tiktok_url,
                ebay_url: row.ebay_url,
                etsy_url: row.etsy_url,
                colors: row.colors,
                sizes: row.sizes,
                cost_to_make: row.cost_to_make,
                sale_price: row.sale_price,
                postage_price: row.postage_price,
            },
        });
    }
    Ok((records, skipped))
}

/// Parses stock rows. A quantity that is not an integer reads as zero.
pub fn parse_stock<R: Read>(input: R) -> anyhow::Result<(Vec<StockImport>, usize)> {
    let mut rows = Vec::new();
    let mut skipped = 0;
    for (line, row) in csv_reader(input).deserialize::<StockCsvRow>().enumerate() {
        let row = row.with_context(|| format!("stock row {}", line + 2))?;
        let Ok(key) = VariantKey::try_new(&row.category, &row.product_folder, &row.color, &row.size)
        else {
            skipped += 1;
            continue;
        };
        rows.push(StockImport {
            key,
            sku: row.sku,
            quantity: row.quantity.parse().unwrap_or(0),
        });
    }
    Ok((rows, skipped))
}

pub fn run_import(
    store: &mut SqliteStore,
    products: Option<&Path>,
    stock: Option<&Path>,
) -> anyhow::Result<ImportSummary> {
    if products.is_none() && stock.is_none() {
        return Err(anyhow!("nothing to import: pass --products and/or --stock"));
    }
    let mut summary = ImportSummary::default();

    if let Some(path) = products {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open products csv {}", path.display()))?;
        let (records, skipped) = parse_products(file)?;
        summary.products = store.upsert_products(&records)?;
        summary.skipped += skipped;
        tracing::info!(path = %path.display(), products = summary.products, skipped, "products imported");
    }

    if let Some(path) = stock {
        let file = std::fs::File::open(path)
            .with_context(|| format!("open stock csv {}", path.display()))?;
        let (rows, skipped) = parse_stock(file)?;
        for row in &rows {
            store.set_stock_entry(&row.key, &row.sku, row.quantity)?;
        }
        summary.stock_rows = rows.len();
        summary.skipped += skipped;
        tracing::info!(path = %path.display(), rows = rows.len(), skipped, "stock imported");
    }

    Ok(summary)
}
