use lims_core::enums::PriceType;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::PriceCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::output;

/// Handle `lims price`.
pub async fn handle(
    action: &PriceCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        PriceCommands::Create {
            name,
            code,
            price,
            price_type,
        } => {
            let price_type = parse_enum::<PriceType>(price_type, "type")?;
            let price = ctx
                .service
                .create_price(name, code, *price, price_type)
                .await?;
            output(&price, flags.format)
        }
        PriceCommands::List { price_type } => {
            let price_type = price_type
                .as_deref()
                .map(|value| parse_enum::<PriceType>(value, "type"))
                .transpose()?;
            output(&ctx.service.list_prices(price_type).await?, flags.format)
        }
    }
}
