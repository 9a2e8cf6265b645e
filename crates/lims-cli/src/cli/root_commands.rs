use clap::{Args, Subcommand};

use crate::cli::subcommands::{
    CrmCommands, DataFileCommands, DeadlineCommands, EquipmentCommands, ItemCommands,
    ItemTypeCommands, LocationCommands, PriceCommands, ProductCommands, ProjectCommands,
    RunCommands, SchedulerCommands, SetCommands, TemplateCommands, TransferCommands,
    WorkflowCommands,
};

/// Top-level command tree.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Create `.lims/`, open the database, and seed lookup rows.
    Init(InitArgs),
    /// Create the default admin, staff, and user groups.
    Bootstrap,
    /// Create a superuser (no-op when the username exists).
    #[command(name = "create-superuser")]
    CreateSuperuser(CreateSuperuserArgs),
    /// Inventory items.
    Item {
        #[command(subcommand)]
        action: ItemCommands,
    },
    /// Storage locations.
    Location {
        #[command(subcommand)]
        action: LocationCommands,
    },
    /// Item types.
    #[command(name = "item-type")]
    ItemType {
        #[command(subcommand)]
        action: ItemTypeCommands,
    },
    /// Inventory sets.
    Set {
        #[command(subcommand)]
        action: SetCommands,
    },
    /// Stock transfers.
    Transfer {
        #[command(subcommand)]
        action: TransferCommands,
    },
    /// Task templates.
    Template {
        #[command(subcommand)]
        action: TemplateCommands,
    },
    /// Workflows.
    Workflow {
        #[command(subcommand)]
        action: WorkflowCommands,
    },
    /// Runs and their tasks.
    Run {
        #[command(subcommand)]
        action: RunCommands,
    },
    /// Projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Products of a project.
    Product {
        #[command(subcommand)]
        action: ProductCommands,
    },
    /// Equipment and reservations.
    Equipment {
        #[command(subcommand)]
        action: EquipmentCommands,
    },
    /// Files produced during runs.
    #[command(name = "data-file")]
    DataFile {
        #[command(subcommand)]
        action: DataFileCommands,
    },
    /// Price list.
    Price {
        #[command(subcommand)]
        action: PriceCommands,
    },
    /// CRM mirror.
    Crm {
        #[command(subcommand)]
        action: CrmCommands,
    },
    /// Deadline processing.
    Deadlines {
        #[command(subcommand)]
        action: DeadlineCommands,
    },
    /// Background job loop.
    Scheduler {
        #[command(subcommand)]
        action: SchedulerCommands,
    },
    /// View the audit trail.
    Audit(AuditArgs),
}

/// Arguments for `lims init`.
#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory).
    #[arg(default_value = ".")]
    pub path: String,
}

/// Arguments for `lims create-superuser`.
///
/// Missing values fall back to the `superuser` config section.
#[derive(Clone, Debug, Args)]
pub struct CreateSuperuserArgs {
    #[arg(long)]
    pub username: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub password: Option<String>,
}

/// Arguments for `lims audit`.
#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    #[arg(long)]
    pub entity_type: Option<String>,
    #[arg(long)]
    pub entity_id: Option<String>,
    #[arg(long)]
    pub action: Option<String>,
    /// Only entries written by this actor.
    #[arg(long)]
    pub by: Option<String>,
    #[arg(long)]
    pub limit: Option<u32>,
}
