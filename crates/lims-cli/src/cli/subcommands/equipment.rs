use clap::Subcommand;

/// Equipment commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EquipmentCommands {
    /// Register equipment.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        reservable: bool,
        /// Location code or ID.
        #[arg(long)]
        location: Option<String>,
    },
    /// Reserve equipment for a time window.
    Reserve {
        equipment: String,
        /// Start, RFC 3339 or `YYYY-MM-DD`.
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        /// Username the reservation is for.
        #[arg(long = "for")]
        reserved_for: Option<String>,
    },
    /// Confirm a reservation.
    Confirm { reservation: String },
    /// Check in a confirmed reservation.
    #[command(name = "check-in")]
    CheckIn { reservation: String },
    /// List reservations of a piece of equipment.
    #[command(name = "list-reservations")]
    ListReservations {
        equipment: String,
        #[arg(long, requires = "until")]
        from: Option<String>,
        #[arg(long, requires = "from")]
        until: Option<String>,
    },
}

/// Data file commands.
#[derive(Clone, Debug, Subcommand)]
pub enum DataFileCommands {
    /// Attach a file to a run.
    Add {
        run: String,
        #[arg(long)]
        path: String,
        /// Stored name; defaults to the file name of `--path`.
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        equipment: Option<String>,
        #[arg(long)]
        task_run: Option<String>,
    },
    /// List files attached to a run.
    List { run: String },
}
