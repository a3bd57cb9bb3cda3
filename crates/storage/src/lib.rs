#![forbid(unsafe_code)]

mod inventory;
mod mirror;
mod sessions;
mod store;

pub use inventory::{FileRename, Inventory, plan_sku_renames};
pub use mirror::{DiskFs, ProductFs, ProductTree, QUARANTINE_DIR};
pub use rust_decimal::Decimal;
pub use sessions::{MemorySessionStore, Session, SessionStore};
pub use store::*;
