use clap::Subcommand;

/// CRM mirror commands.
#[derive(Clone, Debug, Subcommand)]
pub enum CrmCommands {
    /// Look up a mirrored account by its CRM ID.
    Lookup { external_id: String },
}
