use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use lims_config::LimsConfig;

mod cli;
mod commands;
mod context;
mod output;
mod scheduler;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("lims error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    ui::init(&flags);

    if let cli::Commands::Init(args) = &cli.command {
        return commands::init::handle(args, &flags).await;
    }

    let project_root = resolve_project_root(flags.project.as_deref())?;
    load_project_dotenv(&project_root)?;
    let config = LimsConfig::load_from(&project_root).context("failed to load configuration")?;
    context::warn_unconfigured(&config);

    let actor = audit_actor(&cli.command, flags.actor.as_deref(), &config);
    let ctx = context::AppContext::init(project_root, config, Some(&actor))
        .await
        .context("failed to initialize lims application context")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("LIMS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

/// Actor for the audit trail: the flag, then the job actor for scheduled work,
/// then `general.default_actor`.
fn audit_actor(command: &cli::Commands, flag: Option<&str>, config: &LimsConfig) -> String {
    if let Some(actor) = flag {
        return actor.to_string();
    }
    match command {
        cli::Commands::Deadlines { .. } | cli::Commands::Scheduler { .. } => {
            config.deadlines.actor.clone()
        }
        _ => config.general.default_actor.clone(),
    }
}

fn resolve_project_root(project_override: Option<&str>) -> anyhow::Result<PathBuf> {
    if let Some(path) = project_override {
        let explicit = PathBuf::from(path);

        if explicit
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == context::PROJECT_DIR)
        {
            return explicit
                .parent()
                .map(std::path::Path::to_path_buf)
                .context("invalid --project path: '.lims' directory has no parent");
        }

        if explicit.is_dir() {
            return Ok(explicit);
        }

        anyhow::bail!(
            "invalid --project '{}': directory does not exist",
            explicit.display()
        );
    }

    let start = std::env::current_dir().context("failed to read current directory")?;
    context::find_project_root(&start)
        .context("not a lims project (no .lims directory found). Run 'lims init' first.")
}

/// Load `<project>/.env` when present, without overriding the real environment.
fn load_project_dotenv(project_root: &std::path::Path) -> anyhow::Result<()> {
    let env_path = project_root.join(".env");
    if env_path.exists() {
        dotenvy::from_path(&env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }
    Ok(())
}
