#![forbid(unsafe_code)]

mod events;
mod ledger;
mod products;
mod sales;

pub use events::*;
pub use ledger::*;
pub use products::*;
pub use sales::*;
