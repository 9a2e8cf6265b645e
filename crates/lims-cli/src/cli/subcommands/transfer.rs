use clap::Subcommand;

/// Item transfer commands.
#[derive(Clone, Debug, Subcommand)]
pub enum TransferCommands {
    /// Record a pending stock movement.
    Create {
        /// Item identifier or ID.
        item: String,
        #[arg(long)]
        amount: f64,
        /// Task-run identifier the movement belongs to.
        #[arg(long)]
        run: Option<String>,
        /// Add stock instead of removing it.
        #[arg(long)]
        addition: bool,
    },
    /// Apply a transfer to stock.
    Take { id: String },
    /// Mark a taken transfer complete.
    Complete { id: String },
    /// Undo a taken transfer.
    Reverse { id: String },
    /// Link two transfers as the two legs of one movement.
    Link { a: String, b: String },
    /// List transfers for an item or a task run.
    List {
        #[arg(long, conflicts_with = "run", required_unless_present = "run")]
        item: Option<String>,
        #[arg(long)]
        run: Option<String>,
    },
}
