use lims_db::repos::workflow::NewInputField;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{TemplateCommands, WorkflowCommands};
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims template`.
pub async fn handle_template(
    action: &TemplateCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        TemplateCommands::Create {
            name,
            description,
            input_type,
        } => {
            let input_type_id = match input_type {
                Some(key) => Some(resolve::item_type(svc, key).await?.id),
                None => None,
            };
            let created_by = resolve::actor_user_id(svc).await?;
            let template = svc
                .create_task_template(
                    name,
                    description.as_deref(),
                    input_type_id.as_deref(),
                    created_by.as_deref(),
                )
                .await?;
            output(&template, flags.format)
        }
        TemplateCommands::AddInput {
            template,
            label,
            item_type,
            amount,
            measure,
        } => {
            let template = resolve::template(svc, template).await?;
            let field = NewInputField {
                label: label.clone(),
                item_type_id: resolve::item_type(svc, item_type).await?.id,
                amount: *amount,
                amount_measure_id: resolve::measure_id(svc, measure.as_deref()).await?,
            };
            output(&svc.add_input_field(&template.id, field).await?, flags.format)
        }
    }
}

/// Handle `lims workflow`.
pub async fn handle_workflow(
    action: &WorkflowCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        WorkflowCommands::Create { name, tasks } => {
            let mut ids = Vec::with_capacity(tasks.len());
            for task in tasks {
                ids.push(resolve::template(svc, task).await?.id);
            }
            output(&svc.create_workflow(name, &ids).await?, flags.format)
        }
    }
}
