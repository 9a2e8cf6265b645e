use crate::cli::GlobalFlags;
use crate::cli::subcommands::CrmCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims crm`.
pub async fn handle(
    action: &CrmCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        CrmCommands::Lookup { external_id } => {
            let account = ctx
                .service
                .get_crm_account_by_external_id(external_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("no mirrored CRM account '{external_id}'"))?;
            output(&account, flags.format)
        }
    }
}
