use lims_core::enums::{AuditAction, EntityType};
use lims_db::repos::audit::AuditFilter;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::AuditArgs;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims audit`.
pub async fn handle(args: &AuditArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let filter = AuditFilter {
        entity_type: args
            .entity_type
            .as_deref()
            .map(|value| parse_enum::<EntityType>(value, "entity type"))
            .transpose()?,
        entity_id: args.entity_id.clone(),
        action: args
            .action
            .as_deref()
            .map(|value| parse_enum::<AuditAction>(value, "action"))
            .transpose()?,
        actor: args.by.clone(),
        limit: Some(effective_limit(
            args.limit,
            flags.limit,
            ctx.config.general.default_limit,
        )),
    };
    output(&ctx.service.query_audit(&filter).await?, flags.format)
}
