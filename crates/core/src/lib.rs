#![forbid(unsafe_code)]

pub mod ids;
pub mod model;
pub mod naming;
pub mod sku;

pub use ids::{ProductKey, VariantKey};
pub use model::{PaymentMethod, ProductStatus, ProductionStatus};
pub use naming::{PrefixSkuPolicy, SkuNamingPolicy};
