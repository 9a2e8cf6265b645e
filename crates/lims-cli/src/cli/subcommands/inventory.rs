use clap::Subcommand;

/// Inventory item commands. Items are addressed by identifier or ID.
#[derive(Clone, Debug, Subcommand)]
pub enum ItemCommands {
    /// Register an item.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        identifier: String,
        /// Item type name or ID.
        #[arg(long = "type")]
        item_type: String,
        #[arg(long, default_value_t = 0.0)]
        amount: f64,
        /// Measure symbol, e.g. `ml`.
        #[arg(long)]
        measure: Option<String>,
        /// Location code or ID.
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        barcode: Option<String>,
    },
    /// Get an item.
    Get { item: String },
    /// List items.
    List {
        #[arg(long = "type")]
        item_type: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        set: Option<String>,
        /// Include items no longer held in inventory.
        #[arg(long)]
        all: bool,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Move an item to another location (omit `--to` to clear it).
    Move {
        item: String,
        #[arg(long)]
        to: Option<String>,
    },
    /// Add an item to a set.
    #[command(name = "add-to-set")]
    AddToSet {
        item: String,
        #[arg(long)]
        set: String,
    },
}

/// Location commands.
#[derive(Clone, Debug, Subcommand)]
pub enum LocationCommands {
    /// Create a location.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// Parent location code or ID.
        #[arg(long)]
        parent: Option<String>,
    },
    /// Print the location hierarchy.
    Tree,
}

/// Item type commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ItemTypeCommands {
    /// Create an item type.
    Create {
        #[arg(long)]
        name: String,
        /// Parent type name or ID.
        #[arg(long)]
        parent: Option<String>,
    },
    /// List item types.
    List,
}

/// Inventory set commands.
#[derive(Clone, Debug, Subcommand)]
pub enum SetCommands {
    /// Create a set.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        public: bool,
    },
}
