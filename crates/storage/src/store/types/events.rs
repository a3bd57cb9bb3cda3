#![forbid(unsafe_code)]

use super::ledger::serialize_variant;
use inv_core::VariantKey;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: i64,
    pub name: String,
    pub event_date: Option<String>,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventTarget {
    pub event_id: i64,
    #[serde(serialize_with = "serialize_variant")]
    pub key: VariantKey,
    pub quantity: i64,
}

/// Target against current stock. Derived on read, never stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EventDeficit {
    #[serde(serialize_with = "serialize_variant")]
    pub key: VariantKey,
    pub target: i64,
    pub on_hand: i64,
    pub deficit: i64,
}
