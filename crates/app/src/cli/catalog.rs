use clap::{Args, Subcommand};

use storefront_app::{config::display::format_amount, context::Storefront};

use super::{Currency, table};

#[derive(Debug, Args)]
pub(crate) struct CatalogCommand {
    #[command(subcommand)]
    command: CatalogSubcommand,
}

#[derive(Debug, Subcommand)]
enum CatalogSubcommand {
    /// List delivery zones and their charges
    Zones,

    /// List payment methods
    PaymentMethods,
}

pub(crate) async fn run(
    command: CatalogCommand,
    storefront: &Storefront,
    currency: Currency,
) -> Result<(), String> {
    match command.command {
        CatalogSubcommand::Zones => {
            let zones = storefront
                .api()
                .list_delivery_zones()
                .await
                .map_err(|error| format!("failed to list delivery zones: {error}"))?;

            let rows = zones.into_iter().map(|zone| {
                [
                    zone.id.into_string(),
                    zone.name,
                    format_amount(zone.delivery_charge, currency),
                ]
            });

            println!("{}", table::render(["id", "zone", "delivery"], rows, 2));

            Ok(())
        }
        CatalogSubcommand::PaymentMethods => {
            let methods = storefront
                .api()
                .list_payment_methods()
                .await
                .map_err(|error| format!("failed to list payment methods: {error}"))?;

            let rows = methods
                .into_iter()
                .map(|method| [method.id.into_string(), method.code, method.title]);

            println!("{}", table::render(["id", "code", "method"], rows, 3));

            Ok(())
        }
    }
}
