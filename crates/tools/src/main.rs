#![forbid(unsafe_code)]

mod cli;
mod commands;
mod config;
mod import;
mod reset;

use clap::Parser;
use cli::{Cli, Command};
use crate::config::InventoryConfig;
use inv_storage::{Inventory, SqliteStore};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut config = InventoryConfig::load()?;
    if let Some(dir) = cli.products_dir {
        config.products_dir = dir;
    }
    if let Some(dir) = cli.storage_dir {
        config.storage_dir = dir;
    }
    tracing::debug!(
        products_dir = %config.products_dir.display(),
        storage_dir = %config.storage_dir.display(),
        session_ttl_seconds = config.session_ttl_seconds,
        file_token_ttl_seconds = config.file_token_ttl_seconds,
        "configuration loaded"
    );

    match cli.command {
        Command::Import { products, stock } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            let summary = import::run_import(&mut store, products.as_deref(), stock.as_deref())?;
            commands::print_json(&summary)
        }
        Command::Reset { confirm, sales } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            let report = reset::run_reset(&mut store, confirm, sales)?;
            commands::print_json(&report)
        }
        Command::Rename(args) => {
            let mut inventory = Inventory::open(&config.products_dir, &config.storage_dir)?;
            commands::rename(&mut inventory, &args)
        }
        Command::Product { action } => {
            let mut inventory = Inventory::open(&config.products_dir, &config.storage_dir)?;
            commands::product(&mut inventory, &action)
        }
        Command::Stock { action } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            commands::stock(&mut store, &action)
        }
        Command::Production { action } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            commands::production(&mut store, &action)
        }
        Command::Sale { action } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            commands::sale(&mut store, &action)
        }
        Command::Event { action } => {
            let mut store = SqliteStore::open(&config.storage_dir)?;
            commands::event(&mut store, &action)
        }
    }
}
