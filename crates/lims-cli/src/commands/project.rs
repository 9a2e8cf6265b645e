use lims_db::repos::project::NewProject;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{ProductCommands, ProjectCommands};
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_instant;
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims project`.
pub async fn handle_project(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ProjectCommands::Create {
            name,
            identifier,
            description,
            deadline,
            warn,
            contact,
        } => {
            let mut new = NewProject::new(name, identifier);
            new.description.clone_from(description);
            if let Some(deadline) = deadline {
                let deadline = parse_instant(deadline, "deadline")?;
                let warn = warn
                    .as_deref()
                    .map(|w| parse_instant(w, "warn"))
                    .transpose()?;
                new = new.deadline(deadline, warn, ctx.config.deadlines.default_warn_days);
            }
            if let Some(username) = contact {
                new = new.lab_contact(resolve::user(svc, username).await?.id);
            }
            output(&svc.create_project(new).await?, flags.format)
        }
        ProjectCommands::Get { project } => {
            output(&resolve::project(svc, project).await?, flags.format)
        }
        ProjectCommands::List { archived, limit } => {
            let limit = effective_limit(*limit, flags.limit, ctx.config.general.default_limit);
            output(&svc.list_projects(*archived, limit).await?, flags.format)
        }
        ProjectCommands::Archive { project } => {
            let project = resolve::project(svc, project).await?;
            output(&svc.archive_project(&project.id).await?, flags.format)
        }
    }
}

/// Handle `lims product`.
pub async fn handle_product(
    action: &ProductCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        ProductCommands::Create {
            project,
            name,
            identifier,
            product_type,
        } => {
            let project = resolve::project(svc, project).await?;
            let product_type_id = match product_type {
                Some(key) => Some(resolve::item_type(svc, key).await?.id),
                None => None,
            };
            let created_by = resolve::actor_user_id(svc).await?;
            let product = svc
                .create_product(
                    &project.id,
                    name,
                    identifier,
                    product_type_id.as_deref(),
                    created_by.as_deref(),
                )
                .await?;
            output(&product, flags.format)
        }
        ProductCommands::List { project } => {
            let project = resolve::project(svc, project).await?;
            output(&svc.list_products(&project.id).await?, flags.format)
        }
        ProductCommands::Status { product, status } => {
            output(&svc.set_product_status(product, status).await?, flags.format)
        }
        ProductCommands::LinkItem { product, item } => {
            let item = resolve::item(svc, item).await?;
            output(&svc.link_item_to_product(product, &item.id).await?, flags.format)
        }
    }
}
