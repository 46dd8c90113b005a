use clap::Args;

use storefront::pricing::CheckoutTotals;
use storefront_app::{config::display::format_amount, context::Storefront};

use super::{Currency, find_zone, resolve_coupon};

#[derive(Debug, Args)]
pub(crate) struct TotalsArgs {
    /// Delivery zone identifier
    #[arg(long)]
    zone: String,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,
}

pub(crate) async fn run(
    args: TotalsArgs,
    storefront: &Storefront,
    currency: Currency,
) -> Result<(), String> {
    let zone = find_zone(storefront, &args.zone)
        .await?
        .ok_or_else(|| format!("unknown delivery zone {}", args.zone))?;

    let discount = resolve_coupon(storefront, args.coupon.as_deref()).await?;

    let totals = CheckoutTotals::compute(
        storefront.cart().lines(),
        discount.as_ref(),
        zone.delivery_charge,
    )
    .map_err(|error| format!("failed to compute totals: {error}"))?
    .rounded();

    println!("subtotal: {}", format_amount(totals.subtotal, currency));
    println!("discount: {}", format_amount(totals.discount, currency));
    println!(
        "after discount: {}",
        format_amount(totals.after_discount, currency)
    );
    println!(
        "delivery: {}",
        format_amount(totals.delivery_charge, currency)
    );
    println!("total: {}", format_amount(totals.total, currency));

    Ok(())
}
