use clap::{Args, Subcommand};

use storefront_app::{config::display::format_amount, context::Storefront};

use super::{Currency, table};

#[derive(Debug, Args)]
pub(crate) struct OrdersCommand {
    #[command(subcommand)]
    command: OrdersSubcommand,
}

#[derive(Debug, Subcommand)]
enum OrdersSubcommand {
    /// List orders placed on this device without an account
    Guest,

    /// Forget every locally saved guest order
    ClearGuest,
}

pub(crate) fn run(
    command: OrdersCommand,
    storefront: &Storefront,
    currency: Currency,
) -> Result<(), String> {
    match command.command {
        OrdersSubcommand::Guest => {
            let orders = storefront.archive().load_all();

            if orders.is_empty() {
                println!("no guest orders");

                return Ok(());
            }

            let rows = orders.into_iter().map(|order| {
                let items = order
                    .items
                    .iter()
                    .map(|line| format!("{} x {}", line.quantity, line.display_name))
                    .collect::<Vec<_>>()
                    .join("\n");

                [
                    order.placed_at.to_string(),
                    order.order_number.unwrap_or_else(|| order.order_id.into_string()),
                    order.status.unwrap_or_default(),
                    order
                        .payment_method_title
                        .unwrap_or_else(|| order.payment_method_id.into_string()),
                    items,
                    format_amount(order.total, currency),
                ]
            });

            println!(
                "{}",
                table::render(
                    ["placed", "order", "status", "payment", "items", "total"],
                    rows,
                    5,
                )
            );

            Ok(())
        }
        OrdersSubcommand::ClearGuest => {
            storefront
                .archive()
                .clear_all()
                .map_err(|error| format!("failed to clear guest orders: {error}"))?;

            println!("guest orders cleared");

            Ok(())
        }
    }
}
