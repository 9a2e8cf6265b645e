use clap::Subcommand;

/// Deadline commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DeadlineCommands {
    /// Classify every project deadline now.
    Process {
        /// Evaluate as of this instant instead of now.
        #[arg(long)]
        at: Option<String>,
    },
}

/// Scheduler commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SchedulerCommands {
    /// Run scheduled jobs until interrupted.
    Run,
    /// Show the next fire times of every job.
    Next {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}
