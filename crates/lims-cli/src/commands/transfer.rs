use crate::cli::GlobalFlags;
use crate::cli::subcommands::TransferCommands;
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims transfer`.
pub async fn handle(
    action: &TransferCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        TransferCommands::Create {
            item,
            amount,
            run,
            addition,
        } => {
            let item = resolve::item(svc, item).await?;
            let transfer = svc
                .create_transfer(&item.id, *amount, run.as_deref(), *addition)
                .await?;
            output(&transfer, flags.format)
        }
        TransferCommands::Take { id } => output(&svc.take_transfer(id).await?, flags.format),
        TransferCommands::Complete { id } => {
            output(&svc.complete_transfer(id).await?, flags.format)
        }
        TransferCommands::Reverse { id } => output(&svc.reverse_transfer(id).await?, flags.format),
        TransferCommands::Link { a, b } => {
            let (a, b) = svc.link_transfers(a, b).await?;
            output(&[a, b], flags.format)
        }
        TransferCommands::List { item, run } => {
            let transfers = match (item, run) {
                (Some(item), _) => {
                    let item = resolve::item(svc, item).await?;
                    svc.list_transfers_for_item(&item.id).await?
                }
                (None, Some(run)) => svc.list_transfers_for_run(run).await?,
                (None, None) => anyhow::bail!("pass --item or --run"),
            };
            output(&transfers, flags.format)
        }
    }
}
