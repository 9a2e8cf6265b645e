use clap::Subcommand;

/// Project commands. Projects are addressed by identifier or ID.
#[derive(Clone, Debug, Subcommand)]
pub enum ProjectCommands {
    /// Create a project.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        identifier: String,
        #[arg(long)]
        description: Option<String>,
        /// Deadline, RFC 3339 or `YYYY-MM-DD`.
        #[arg(long)]
        deadline: Option<String>,
        /// Warning date; defaults to `deadlines.default_warn_days` before the deadline.
        #[arg(long, requires = "deadline")]
        warn: Option<String>,
        /// Username of the primary lab contact.
        #[arg(long)]
        contact: Option<String>,
    },
    /// Get a project.
    Get { project: String },
    /// List projects.
    List {
        #[arg(long)]
        archived: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Archive a project.
    Archive { project: String },
}

/// Product commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ProductCommands {
    /// Create a product under a project.
    Create {
        #[arg(long)]
        project: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        identifier: String,
        /// Item type name or ID.
        #[arg(long = "type")]
        product_type: Option<String>,
    },
    /// List products of a project.
    List { project: String },
    /// Set a product's status by name.
    Status { product: String, status: String },
    /// Link an inventory item to a product.
    #[command(name = "link-item")]
    LinkItem { product: String, item: String },
}
