#![forbid(unsafe_code)]

use crate::cli::{
    EventAction, ProductAction, ProductArgs, ProductionAction, RenameArgs, SaleAction, StockAction,
    VariantArgs,
};
use anyhow::{Context, anyhow};
use inv_core::{PaymentMethod, ProductKey, ProductStatus, ProductionStatus, VariantKey};
use inv_storage::{
    CreateProductRequest, Decimal, Inventory, NewSale, RenameProductRequest, SqliteStore,
};
use serde::Serialize;
use std::str::FromStr;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

impl ProductArgs {
    fn key(&self) -> anyhow::Result<ProductKey> {
        ProductKey::try_new(&self.category, &self.folder).map_err(|err| anyhow!(err.message()))
    }
}

impl VariantArgs {
    fn key(&self) -> anyhow::Result<VariantKey> {
        VariantKey::try_new(&self.category, &self.folder, &self.color, &self.size)
            .map_err(|err| anyhow!(err.message()))
    }
}

fn parse_price(raw: &str) -> anyhow::Result<Decimal> {
    Decimal::from_str(raw.trim()).with_context(|| format!("invalid price {raw:?}"))
}

pub fn rename(inventory: &mut Inventory, args: &RenameArgs) -> anyhow::Result<()> {
    let outcome = inventory.rename_product(&RenameProductRequest {
        category: args.product.category.clone(),
        folder: args.product.folder.clone(),
        new_category: args.new_category.clone(),
        new_folder: args.new_folder.clone(),
        new_sku: args.new_sku.clone(),
        fields: None,
    })?;
    print_json(&outcome)
}

pub fn product(inventory: &mut Inventory, action: &ProductAction) -> anyhow::Result<()> {
    match action {
        ProductAction::Create {
            category,
            description,
            tags,
            ukca,
            notes,
        } => {
            let product = inventory.create_product(&CreateProductRequest {
                category: category.clone(),
                description: description.clone(),
                tags: tags.clone(),
                requires_ukca: *ukca,
                notes: notes.clone(),
            })?;
            print_json(&product)
        }
        ProductAction::Status { product, status } => {
            let status = ProductStatus::parse(status.trim())
                .ok_or_else(|| anyhow!("status must be Draft, Live or Archived"))?;
            let product = inventory.set_status(&product.key()?, status)?;
            print_json(&product)
        }
        ProductAction::List { status } => {
            let products = match status {
                Some(status) => inventory
                    .store()
                    .list_products_by_status(ProductStatus::normalize(status))?,
                None => inventory.store().list_products()?,
            };
            print_json(&products)
        }
    }
}

pub fn stock(store: &mut SqliteStore, action: &StockAction) -> anyhow::Result<()> {
    match action {
        StockAction::Adjust { variant, delta } => {
            let change = store.adjust_stock(&variant.key()?, *delta, None)?;
            print_json(&change)
        }
        StockAction::List => print_json(&store.list_stock()?),
    }
}

pub fn production(store: &mut SqliteStore, action: &ProductionAction) -> anyhow::Result<()> {
    match action {
        ProductionAction::Adjust {
            variant,
            status,
            delta,
        } => {
            let status = ProductionStatus::parse(status)
                .ok_or_else(|| anyhow!("status must be Queued or Printing"))?;
            let change = store.adjust_production(&variant.key()?, status, *delta)?;
            print_json(&change)
        }
        ProductionAction::List => print_json(&store.list_production()?),
    }
}

pub fn sale(store: &mut SqliteStore, action: &SaleAction) -> anyhow::Result<()> {
    match action {
        SaleAction::Record {
            event,
            variant,
            quantity,
            unit_price,
            override_price,
            payment,
        } => {
            let payment_method = PaymentMethod::parse(payment)
                .ok_or_else(|| anyhow!("unknown payment method {payment:?}"))?;
            let outcome = store.record_sale(&NewSale {
                event_id: *event,
                key: variant.key()?,
                quantity: *quantity,
                unit_price: parse_price(unit_price)?,
                override_price: override_price.as_deref().map(parse_price).transpose()?,
                payment_method,
            })?;
            print_json(&outcome)
        }
        SaleAction::Delete { id } => print_json(&store.delete_sale(*id)?),
        SaleAction::List { event } => print_json(&store.list_sales(*event)?),
    }
}

pub fn event(store: &mut SqliteStore, action: &EventAction) -> anyhow::Result<()> {
    match action {
        EventAction::Create { name, date } => {
            print_json(&store.create_event(name, date.as_deref())?)
        }
        EventAction::Target {
            event,
            variant,
            quantity,
        } => {
            store.set_event_target(*event, &variant.key()?, *quantity)?;
            print_json(&store.list_event_targets(*event)?)
        }
        EventAction::Deficits { event } => print_json(&store.event_deficits(*event)?),
    }
}
