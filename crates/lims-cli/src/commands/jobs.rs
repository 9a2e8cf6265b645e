use chrono::Utc;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::{DeadlineCommands, SchedulerCommands};
use crate::commands::shared::parse::parse_instant;
use crate::context::AppContext;
use crate::output::output;
use crate::scheduler;

/// Handle `lims deadlines`.
pub async fn handle_deadlines(
    action: &DeadlineCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        DeadlineCommands::Process { at } => {
            let now = match at {
                Some(at) => parse_instant(at, "at")?,
                None => Utc::now(),
            };
            let report = scheduler::run_deadline_job(&ctx.service, &ctx.config, now).await?;
            output(&report, flags.format)
        }
    }
}

/// Handle `lims scheduler`.
pub async fn handle_scheduler(
    action: &SchedulerCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        SchedulerCommands::Run => scheduler::run_loop(&ctx.service, &ctx.config).await,
        SchedulerCommands::Next { count } => {
            let now = Utc::now();
            let scheduler = scheduler::Scheduler::from_config(&ctx.config, now)?;
            output(&scheduler.preview(now, *count), flags.format)
        }
    }
}
