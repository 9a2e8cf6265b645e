use clap::Subcommand;

/// Task template commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TemplateCommands {
    /// Create a task template.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Item type name or ID each product must bring into the task.
        #[arg(long)]
        input_type: Option<String>,
    },
    /// Add a consumed input to a template.
    #[command(name = "add-input")]
    AddInput {
        /// Template name or ID.
        template: String,
        #[arg(long)]
        label: String,
        /// Item type name or ID.
        #[arg(long = "type")]
        item_type: String,
        #[arg(long)]
        amount: f64,
        /// Measure symbol, e.g. `ul`.
        #[arg(long)]
        measure: Option<String>,
    },
}

/// Workflow commands.
#[derive(Clone, Debug, Subcommand)]
pub enum WorkflowCommands {
    /// Create a workflow from ordered template names or IDs.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long = "task", required = true)]
        tasks: Vec<String>,
    },
}

/// Run commands. Runs are addressed by identifier or ID.
#[derive(Clone, Debug, Subcommand)]
pub enum RunCommands {
    /// Create a run from a workflow or an explicit task list.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        identifier: String,
        /// Workflow name or ID.
        #[arg(long, conflicts_with = "tasks")]
        workflow: Option<String>,
        #[arg(long = "task")]
        tasks: Vec<String>,
        /// Product IDs.
        #[arg(long = "product")]
        products: Vec<String>,
    },
    /// Start a run.
    Start {
        run: String,
        #[arg(long)]
        by: Option<String>,
    },
    /// Start the current task.
    #[command(name = "start-task")]
    StartTask { run: String },
    /// Finish the current task.
    #[command(name = "finish-task")]
    FinishTask {
        run: String,
        /// Product ID or identifier that failed (repeatable).
        #[arg(long)]
        failed: Vec<String>,
        /// Run the same task again instead of advancing.
        #[arg(long)]
        repeat: bool,
    },
    /// Abandon the current task and undo its stock movements.
    #[command(name = "stop-task")]
    StopTask { run: String },
    /// Get a run.
    Get { run: String },
    /// List data entries of a run.
    Entries {
        run: String,
        /// Restrict to one task run.
        #[arg(long)]
        task_run: Option<String>,
    },
}
