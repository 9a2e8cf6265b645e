use lims_db::repos::inventory::{ItemFilter, NewItem};
use lims_db::updates::item::ItemUpdateBuilder;
use serde_json::json;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ItemCommands, ItemTypeCommands, LocationCommands, SetCommands};
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims item`.
pub async fn handle_item(
    action: &ItemCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ItemCommands::Create {
            name,
            identifier,
            item_type,
            amount,
            measure,
            location,
            barcode,
        } => {
            let item_type = resolve::item_type(svc, item_type).await?;
            let mut new = NewItem::new(name, identifier, item_type.id).amount(*amount);
            if let Some(measure) = resolve::measure_id(svc, measure.as_deref()).await? {
                new = new.measure(measure);
            }
            if let Some(location) = location {
                new = new.location(resolve::location(svc, location).await?.id);
            }
            if let Some(barcode) = barcode {
                new = new.barcode(barcode);
            }
            output(&svc.create_item(new).await?, flags.format)
        }
        ItemCommands::Get { item } => output(&resolve::item(svc, item).await?, flags.format),
        ItemCommands::List {
            item_type,
            location,
            set,
            all,
            limit,
        } => {
            let filter = ItemFilter {
                item_type_id: match item_type {
                    Some(key) => Some(resolve::item_type(svc, key).await?.id),
                    None => None,
                },
                location_id: match location {
                    Some(key) => Some(resolve::location(svc, key).await?.id),
                    None => None,
                },
                set_id: set.clone(),
                in_inventory: (!*all).then_some(true),
                limit: Some(effective_limit(
                    *limit,
                    flags.limit,
                    ctx.config.general.default_limit,
                )),
            };
            output(&svc.list_items(&filter).await?, flags.format)
        }
        ItemCommands::Move { item, to } => {
            let item = resolve::item(svc, item).await?;
            let location_id = match to {
                Some(key) => Some(resolve::location(svc, key).await?.id),
                None => None,
            };
            let update = ItemUpdateBuilder::new().location_id(location_id).build();
            output(&svc.update_item(&item.id, update).await?, flags.format)
        }
        ItemCommands::AddToSet { item, set } => {
            let item = resolve::item(svc, item).await?;
            svc.add_item_to_set(set, &item.id).await?;
            output(&json!({ "set_id": set, "item_id": item.id }), flags.format)
        }
    }
}

/// Handle `lims location`.
pub async fn handle_location(
    action: &LocationCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        LocationCommands::Create { name, code, parent } => {
            let parent_id = match parent {
                Some(key) => Some(resolve::location(svc, key).await?.id),
                None => None,
            };
            let location = svc.create_location(name, code, parent_id.as_deref()).await?;
            output(&location, flags.format)
        }
        LocationCommands::Tree => output(&svc.location_tree().await?, flags.format),
    }
}

/// Handle `lims item-type`.
pub async fn handle_item_type(
    action: &ItemTypeCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ItemTypeCommands::Create { name, parent } => {
            let parent_id = match parent {
                Some(key) => Some(resolve::item_type(svc, key).await?.id),
                None => None,
            };
            output(&svc.create_item_type(name, parent_id.as_deref()).await?, flags.format)
        }
        ItemTypeCommands::List => output(&svc.list_item_types().await?, flags.format),
    }
}

/// Handle `lims set`.
pub async fn handle_set(
    action: &SetCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SetCommands::Create { name, public } => {
            output(&ctx.service.create_set(name, *public).await?, flags.format)
        }
    }
}
