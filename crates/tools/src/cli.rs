#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "inventory")]
#[command(about = "Product registry, stock and sales maintenance")]
#[command(version)]
pub struct Cli {
    /// Root of the product directory tree (overrides config)
    #[arg(long, global = true)]
    pub products_dir: Option<PathBuf>,

    /// Directory holding inventory.db (overrides config)
    #[arg(long, global = true)]
    pub storage_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bulk import the product index and/or stock CSV
    Import {
        #[arg(long)]
        products: Option<PathBuf>,
        #[arg(long)]
        stock: Option<PathBuf>,
    },
    /// Clear the stock and production ledgers
    Reset {
        /// Actually delete; otherwise only report counts
        #[arg(long)]
        confirm: bool,
        /// Also clear sales, events and event targets
        #[arg(long)]
        sales: bool,
    },
    /// Change a product's category, folder or SKU
    Rename(RenameArgs),
    /// Create products and move them between Draft, Live and Archived
    Product {
        #[command(subcommand)]
        action: ProductAction,
    },
    Stock {
        #[command(subcommand)]
        action: StockAction,
    },
    Production {
        #[command(subcommand)]
        action: ProductionAction,
    },
    Sale {
        #[command(subcommand)]
        action: SaleAction,
    },
    Event {
        #[command(subcommand)]
        action: EventAction,
    },
}

#[derive(Args, Debug)]
pub struct ProductArgs {
    pub category: String,
    pub folder: String,
}

#[derive(Args, Debug)]
pub struct VariantArgs {
    pub category: String,
    pub folder: String,
    #[arg(long, default_value = "")]
    pub color: String,
    #[arg(long, default_value = "")]
    pub size: String,
}

#[derive(Args, Debug)]
pub struct RenameArgs {
    #[command(flatten)]
    pub product: ProductArgs,
    #[arg(long)]
    pub new_category: Option<String>,
    #[arg(long)]
    pub new_folder: Option<String>,
    #[arg(long)]
    pub new_sku: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ProductAction {
    Create {
        category: String,
        description: String,
        #[arg(long, default_value = "")]
        tags: String,
        /// Scaffold a UKCA directory
        #[arg(long)]
        ukca: bool,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Move to Draft, Live or Archived
    Status {
        #[command(flatten)]
        product: ProductArgs,
        status: String,
    },
    List {
        #[arg(long)]
        status: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StockAction {
    Adjust {
        #[command(flatten)]
        variant: VariantArgs,
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum ProductionAction {
    Adjust {
        #[command(flatten)]
        variant: VariantArgs,
        #[arg(long, default_value = "Queued")]
        status: String,
        #[arg(long, allow_hyphen_values = true)]
        delta: i64,
    },
    List,
}

#[derive(Subcommand, Debug)]
pub enum SaleAction {
    Record {
        #[arg(long)]
        event: i64,
        #[command(flatten)]
        variant: VariantArgs,
        #[arg(long)]
        quantity: i64,
        #[arg(long)]
        unit_price: String,
        #[arg(long)]
        override_price: Option<String>,
        #[arg(long, default_value = "Cash")]
        payment: String,
    },
    Delete {
        id: i64,
    },
    List {
        #[arg(long)]
        event: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum EventAction {
    Create {
        name: String,
        #[arg(long)]
        date: Option<String>,
    },
    Target {
        #[arg(long)]
        event: i64,
        #[command(flatten)]
        variant: VariantArgs,
        #[arg(long)]
        quantity: i64,
    },
    Deficits {
        #[arg(long)]
        event: i64,
    },
}
