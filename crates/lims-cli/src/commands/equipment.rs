use std::path::Path;

use lims_db::repos::equipment::NewReservation;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{DataFileCommands, EquipmentCommands};
use crate::commands::shared::parse::parse_instant;
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims equipment`.
pub async fn handle_equipment(
    action: &EquipmentCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        EquipmentCommands::Create {
            name,
            reservable,
            location,
        } => {
            let location_id = match location {
                Some(key) => Some(resolve::location(svc, key).await?.id),
                None => None,
            };
            let equipment = svc
                .create_equipment(name, *reservable, location_id.as_deref())
                .await?;
            output(&equipment, flags.format)
        }
        EquipmentCommands::Reserve {
            equipment,
            start,
            end,
            reserved_for,
        } => {
            let reservation = svc
                .reserve_equipment(NewReservation {
                    equipment_id: equipment.clone(),
                    start: parse_instant(start, "start")?,
                    end: parse_instant(end, "end")?,
                    reserved_for: reserved_for.clone(),
                    reserved_by: resolve::actor_user_id(svc).await?,
                })
                .await?;
            output(&reservation, flags.format)
        }
        EquipmentCommands::Confirm { reservation } => {
            output(&svc.confirm_reservation(reservation).await?, flags.format)
        }
        EquipmentCommands::CheckIn { reservation } => {
            output(&svc.check_in_reservation(reservation).await?, flags.format)
        }
        EquipmentCommands::ListReservations {
            equipment,
            from,
            until,
        } => {
            let window = match (from, until) {
                (Some(from), Some(until)) => {
                    Some((parse_instant(from, "from")?, parse_instant(until, "until")?))
                }
                _ => None,
            };
            output(&svc.list_reservations(equipment, window).await?, flags.format)
        }
    }
}

/// Handle `lims data-file`.
pub async fn handle_data_file(
    action: &DataFileCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        DataFileCommands::Add {
            run,
            path,
            name,
            equipment,
            task_run,
        } => {
            let run = resolve::run(svc, run).await?;
            let file_name = match name {
                Some(name) => name.clone(),
                None => Path::new(path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| anyhow::anyhow!("'{path}' has no file name; pass --name"))?,
            };
            let file = svc
                .add_data_file(
                    &run.id,
                    equipment.as_deref(),
                    task_run.as_deref(),
                    &file_name,
                    path,
                )
                .await?;
            output(&file, flags.format)
        }
        DataFileCommands::List { run } => {
            let run = resolve::run(svc, run).await?;
            output(&svc.list_data_files(&run.id).await?, flags.format)
        }
    }
}
