use clap::Parser;

pub mod global;
pub mod root_commands;
pub mod subcommands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `lims` binary.
#[derive(Debug, Parser)]
#[command(name = "lims", version, about = "LIMS - laboratory inventory, runs, and projects")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, table, raw
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Max results to return
    #[arg(short, long, global = true)]
    pub limit: Option<u32>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Project root path (defaults to auto-detect via .lims)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Name recorded in the audit trail (defaults to general.default_actor)
    #[arg(long, global = true)]
    pub actor: Option<String>,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self) -> GlobalFlags {
        GlobalFlags {
            format: self.format,
            limit: self.limit,
            quiet: self.quiet,
            verbose: self.verbose,
            project: self.project.clone(),
            actor: self.actor.clone(),
        }
    }
}
