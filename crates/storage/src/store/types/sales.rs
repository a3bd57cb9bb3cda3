#![forbid(unsafe_code)]

use super::ledger::serialize_variant;
use inv_core::{PaymentMethod, VariantKey};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewSale {
    pub event_id: i64,
    pub key: VariantKey,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub override_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
}

/// Replacement values for a recorded sale. The event never changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleUpdate {
    pub key: VariantKey,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub override_price: Option<Decimal>,
    pub payment_method: PaymentMethod,
}

/// An immutable sale fact. Identity fields are a snapshot taken when the sale
/// was recorded and do not follow later renames.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Sale {
    pub id: i64,
    pub event_id: i64,
    pub product_id: Option<i64>,
    #[serde(serialize_with = "serialize_variant")]
    pub key: VariantKey,
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub override_price: Option<Decimal>,
    #[serde(serialize_with = "serialize_payment")]
    pub payment_method: PaymentMethod,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaleOutcome {
    pub sale: Sale,
    /// False when the stock/production cascade did not fully apply.
    pub inventory_applied: bool,
}

fn serialize_payment<S: serde::Serializer>(
    method: &PaymentMethod,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(method.as_str())
}
