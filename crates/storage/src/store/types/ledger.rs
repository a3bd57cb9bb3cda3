#![forbid(unsafe_code)]

use inv_core::{ProductionStatus, VariantKey};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StockEntry {
    #[serde(serialize_with = "serialize_variant")]
    pub key: VariantKey,
    pub sku: String,
    pub quantity: i64,
    pub updated_at_ms: i64,
}

/// Result of a quantity change. `removed` means the row hit zero and is gone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct QuantityChange {
    pub quantity: i64,
    pub removed: bool,
}

impl QuantityChange {
    pub(crate) fn kept(quantity: i64) -> Self {
        Self {
            quantity,
            removed: false,
        }
    }

    pub(crate) fn removed() -> Self {
        Self {
            quantity: 0,
            removed: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProductionItem {
    #[serde(serialize_with = "serialize_variant")]
    pub key: VariantKey,
    #[serde(serialize_with = "serialize_production_status")]
    pub status: ProductionStatus,
    pub quantity: i64,
    pub updated_at_ms: i64,
}

/// Row counts moved by a key propagation, per table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefsMoved {
    pub stock: usize,
    pub production: usize,
    pub targets: usize,
}

pub(crate) fn serialize_variant<S: serde::Serializer>(
    key: &VariantKey,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    use serde::ser::SerializeStruct;

    let mut state = serializer.serialize_struct("VariantKey", 4)?;
    state.serialize_field("category", key.category())?;
    state.serialize_field("folder", key.folder())?;
    state.serialize_field("color", key.color())?;
    state.serialize_field("size", key.size())?;
    state.end()
}

pub(crate) fn serialize_production_status<S: serde::Serializer>(
    status: &ProductionStatus,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(status.as_str())
}
