use clap::{Args, Subcommand};

use storefront::{discounts::DiscountDescriptor, reference::DeliveryZone};
use storefront_app::context::Storefront;

use super::Currency;

mod place;
mod totals;

#[derive(Debug, Args)]
pub(crate) struct CheckoutCommand {
    #[command(subcommand)]
    command: CheckoutSubcommand,
}

#[derive(Debug, Subcommand)]
enum CheckoutSubcommand {
    /// Show what the current cart would cost
    Totals(totals::TotalsArgs),

    /// Place an order for the current cart
    Place(Box<place::PlaceArgs>),
}

pub(crate) async fn run(
    command: CheckoutCommand,
    storefront: &mut Storefront,
    currency: Currency,
) -> Result<(), String> {
    match command.command {
        CheckoutSubcommand::Totals(args) => totals::run(args, storefront, currency).await,
        CheckoutSubcommand::Place(args) => place::run(*args, storefront, currency).await,
    }
}

async fn find_zone(storefront: &Storefront, zone_id: &str) -> Result<Option<DeliveryZone>, String> {
    let zones = storefront
        .api()
        .list_delivery_zones()
        .await
        .map_err(|error| format!("failed to list delivery zones: {error}"))?;

    Ok(zones.into_iter().find(|zone| zone.id.as_str() == zone_id))
}

async fn resolve_coupon(
    storefront: &Storefront,
    code: Option<&str>,
) -> Result<Option<DiscountDescriptor>, String> {
    let Some(code) = code else {
        return Ok(None);
    };

    storefront
        .apply_coupon(code)
        .await
        .map(Some)
        .map_err(|error| error.user_message("Invalid coupon code."))
}
