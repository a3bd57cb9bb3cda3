#![forbid(unsafe_code)]

use inv_core::{ProductKey, ProductStatus};
use serde::{Deserialize, Serialize};

/// Free-text product attributes. Stored trimmed; never part of identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductFields {
    pub ukca: String,
    pub listings: String,
    pub tags: String,
    pub facebook_url: String,
    pub tiktok_url: String,
    pub ebay_url: String,
    pub etsy_url: String,
    pub colors: String,
    pub sizes: String,
    pub cost_to_make: String,
    pub sale_price: String,
    pub postage_price: String,
}

impl ProductFields {
    pub(crate) fn normalized(&self) -> Self {
        let ukca = self.ukca.trim();
        Self {
            ukca: if ukca.is_empty() { "No" } else { ukca }.to_string(),
            listings: self.listings.trim().to_string(),
            tags: self.tags.trim().to_string(),
            facebook_url: self.facebook_url.trim().to_string(),
            tiktok_url: self.tiktok_url.trim().to_string(),
            ebay_url: self.ebay_url.trim().to_string(),
            etsy_url: self.etsy_url.trim().to_string(),
            colors: self.colors.trim().to_string(),
            sizes: self.sizes.trim().to_string(),
            cost_to_make: self.cost_to_make.trim().to_string(),
            sale_price: self.sale_price.trim().to_string(),
            postage_price: self.postage_price.trim().to_string(),
        }
    }
}

/// The writable shape of a registry row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductRecord {
    pub key: ProductKey,
    pub sku: String,
    pub status: ProductStatus,
    pub fields: ProductFields,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: i64,
    #[serde(serialize_with = "serialize_key")]
    pub key: ProductKey,
    pub sku: String,
    #[serde(serialize_with = "serialize_status")]
    pub status: ProductStatus,
    pub fields: ProductFields,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl Product {
    pub fn to_record(&self) -> ProductRecord {
        ProductRecord {
            key: self.key.clone(),
            sku: self.sku.clone(),
            status: self.status,
            fields: self.fields.clone(),
        }
    }
}

pub(crate) fn serialize_key<S: serde::Serializer>(
    key: &ProductKey,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;

    let mut state = serializer.serialize_struct("ProductKey", 2)?;
    state.serialize_field("category", key.category())?;
    state.serialize_field("folder", key.folder())?;
    state.end()
}

pub(crate) fn serialize_status<S: serde::Serializer>(
    status: &ProductStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}

/// Product creation input for the lifecycle helper.
#[derive(Clone, Debug, Default)]
pub struct CreateProductRequest {
    pub category: String,
    pub description: String,
    pub tags: String,
    pub requires_ukca: bool,
    pub notes: String,
}

/// Identity change for one product. `None` keeps the current value.
#[derive(Clone, Debug, Default)]
pub struct RenameProductRequest {
    pub category: String,
    pub folder: String,
    pub new_category: Option<String>,
    pub new_folder: Option<String>,
    pub new_sku: Option<String>,
    pub fields: Option<ProductFields>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RenameOutcome {
    pub category: String,
    pub folder: String,
    pub sku: String,
    pub files_renamed: usize,
    /// False when dependent ledger rows could not be moved to the new key.
    pub refs_propagated: bool,
}
