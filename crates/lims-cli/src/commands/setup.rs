use anyhow::Context;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::CreateSuperuserArgs;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims bootstrap`.
pub async fn bootstrap(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let report = ctx
        .service
        .bootstrap_default_groups(&ctx.config.roles)
        .await?;
    output(&report, flags.format)
}

/// Handle `lims create-superuser`, filling gaps from the `superuser` config section.
pub async fn create_superuser(
    args: &CreateSuperuserArgs,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let configured = &ctx.config.superuser;
    let password = match &args.password {
        Some(password) => password.clone(),
        None => ctx
            .config
            .require_superuser()
            .context("pass --password or set LIMS_SUPERUSER__PASSWORD")?
            .password
            .clone(),
    };
    let username = args.username.as_deref().unwrap_or(&configured.username);
    let email = args
        .email
        .as_deref()
        .or_else(|| Some(configured.email.as_str()).filter(|e| !e.is_empty()));

    let outcome = ctx
        .service
        .create_superuser(username, email, &password)
        .await?;
    output(&outcome, flags.format)
}
