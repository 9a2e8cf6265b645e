use lims_db::service::LimsService;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::RunCommands;
use crate::commands::shared::resolve;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims run`.
pub async fn handle(
    action: &RunCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let svc = &ctx.service;
    match action {
        RunCommands::Create {
            name,
            identifier,
            workflow,
            tasks,
            products,
        } => {
            let run = if let Some(workflow) = workflow {
                let workflow = resolve::workflow(svc, workflow).await?;
                svc.create_run_from_workflow(&workflow.id, name, identifier, products)
                    .await?
            } else {
                let mut task_ids = Vec::with_capacity(tasks.len());
                for task in tasks {
                    task_ids.push(resolve::template(svc, task).await?.id);
                }
                svc.create_run(name, identifier, &task_ids, products).await?
            };
            output(&run, flags.format)
        }
        RunCommands::Start { run, by } => {
            let run = resolve::run(svc, run).await?;
            let started_by = match by {
                Some(username) => Some(resolve::user(svc, username).await?.id),
                None => resolve::actor_user_id(svc).await?,
            };
            output(&svc.start_run(&run.id, started_by.as_deref()).await?, flags.format)
        }
        RunCommands::StartTask { run } => {
            let run = resolve::run(svc, run).await?;
            output(&svc.start_task(&run.id).await?, flags.format)
        }
        RunCommands::FinishTask {
            run,
            failed,
            repeat,
        } => {
            let run = resolve::run(svc, run).await?;
            let failed = failed_product_ids(svc, &run.id, failed).await?;
            output(&svc.finish_task(&run.id, &failed, *repeat).await?, flags.format)
        }
        RunCommands::StopTask { run } => {
            let run = resolve::run(svc, run).await?;
            output(&svc.stop_task(&run.id).await?, flags.format)
        }
        RunCommands::Get { run } => output(&resolve::run(svc, run).await?, flags.format),
        RunCommands::Entries { run, task_run } => {
            let run = resolve::run(svc, run).await?;
            output(&svc.list_entries(&run.id, task_run.as_deref()).await?, flags.format)
        }
    }
}

/// Map `--failed` values (product ID or identifier) onto the run's product IDs.
async fn failed_product_ids(
    svc: &LimsService,
    run_id: &str,
    keys: &[String],
) -> anyhow::Result<Vec<String>> {
    if keys.is_empty() {
        return Ok(Vec::new());
    }
    let mut products = Vec::new();
    for id in svc.run_product_ids(run_id).await? {
        products.push(svc.get_product(&id).await?);
    }

    keys.iter()
        .map(|key| {
            products
                .iter()
                .find(|p| &p.id == key || &p.identifier == key)
                .map(|p| p.id.clone())
                .ok_or_else(|| anyhow::anyhow!("product '{key}' is not part of this run"))
        })
        .collect()
}
