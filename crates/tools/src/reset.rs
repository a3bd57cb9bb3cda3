#![forbid(unsafe_code)]

use inv_storage::{LedgerCounts, SqliteStore};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ResetReport {
    pub dry_run: bool,
    pub include_sales: bool,
    pub stock: usize,
    pub production: usize,
    pub sales: usize,
    pub targets: usize,
}

impl ResetReport {
    fn new(counts: LedgerCounts, dry_run: bool, include_sales: bool) -> Self {
        Self {
            dry_run,
            include_sales,
            stock: counts.stock,
            production: counts.production,
            sales: if include_sales { counts.sales } else { 0 },
            targets: if include_sales { counts.targets } else { 0 },
        }
    }
}

/// Clears the stock and production ledgers, plus sales and event targets
/// with `include_sales`. Without `confirm` only counts what would go.
pub fn run_reset(
    store: &mut SqliteStore,
    confirm: bool,
    include_sales: bool,
) -> anyhow::Result<ResetReport> {
    if !confirm {
        let counts = store.ledger_counts()?;
        tracing::info!("dry run: pass --confirm to delete");
        return Ok(ResetReport::new(counts, true, include_sales));
    }
    let counts = store.reset_ledgers(include_sales)?;
    Ok(ResetReport::new(counts, false, include_sales))
}
