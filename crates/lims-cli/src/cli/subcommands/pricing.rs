use clap::Subcommand;

/// Price list commands.
#[derive(Clone, Debug, Subcommand)]
pub enum PriceCommands {
    /// Add a price.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        #[arg(long)]
        price: f64,
        /// `internal` or `external`.
        #[arg(long = "type", default_value = "internal")]
        price_type: String,
    },
    /// List prices.
    List {
        #[arg(long = "type")]
        price_type: Option<String>,
    },
}
