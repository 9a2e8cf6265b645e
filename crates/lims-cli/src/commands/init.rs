use std::path::PathBuf;

use anyhow::Context;
use lims_config::LimsConfig;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::{AppContext, PROJECT_DIR};
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    project_root: PathBuf,
    database: PathBuf,
    schema_version: u32,
    statuses_seeded: Vec<String>,
}

/// Handle `lims init`. Safe to run again on an initialized project.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = std::path::absolute(&args.path)
        .with_context(|| format!("invalid path '{}'", args.path))?;
    let lims_dir = root.join(PROJECT_DIR);
    std::fs::create_dir_all(&lims_dir)
        .with_context(|| format!("failed to create {}", lims_dir.display()))?;

    let config = LimsConfig::load_from(&root).context("failed to load configuration")?;
    let database = config.database.resolve(&root);
    let ctx = AppContext::init(root.clone(), config, flags.actor.as_deref()).await?;

    let statuses_seeded = ctx.service.ensure_product_statuses().await?;
    let schema_version = ctx.service.db().schema_version().await?;
    tracing::info!(root = %root.display(), schema_version, "project initialized");

    output(
        &InitResponse {
            project_root: root,
            database,
            schema_version,
            statuses_seeded,
        },
        flags.format,
    )
}
