use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Bootstrap => commands::setup::bootstrap(ctx, flags).await,
        Commands::CreateSuperuser(args) => {
            commands::setup::create_superuser(&args, ctx, flags).await
        }
        Commands::Item { action } => commands::inventory::handle_item(&action, ctx, flags).await,
        Commands::Location { action } => {
            commands::inventory::handle_location(&action, ctx, flags).await
        }
        Commands::ItemType { action } => {
            commands::inventory::handle_item_type(&action, ctx, flags).await
        }
        Commands::Set { action } => commands::inventory::handle_set(&action, ctx, flags).await,
        Commands::Transfer { action } => commands::transfer::handle(&action, ctx, flags).await,
        Commands::Template { action } => {
            commands::workflow::handle_template(&action, ctx, flags).await
        }
        Commands::Workflow { action } => {
            commands::workflow::handle_workflow(&action, ctx, flags).await
        }
        Commands::Run { action } => commands::run::handle(&action, ctx, flags).await,
        Commands::Project { action } => commands::project::handle_project(&action, ctx, flags).await,
        Commands::Product { action } => commands::project::handle_product(&action, ctx, flags).await,
        Commands::Equipment { action } => {
            commands::equipment::handle_equipment(&action, ctx, flags).await
        }
        Commands::DataFile { action } => {
            commands::equipment::handle_data_file(&action, ctx, flags).await
        }
        Commands::Price { action } => commands::pricing::handle(&action, ctx, flags).await,
        Commands::Crm { action } => commands::crm::handle(&action, ctx, flags).await,
        Commands::Deadlines { action } => commands::jobs::handle_deadlines(&action, ctx, flags).await,
        Commands::Scheduler { action } => {
            commands::jobs::handle_scheduler(&action, ctx, flags).await
        }
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::Init(args) => commands::init::handle(&args, flags).await,
    }
}
