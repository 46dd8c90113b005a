use clap::{Args, Subcommand};
use rust_decimal::Decimal;

use storefront::{
    ids::{ProductId, VariantId},
    items::CartLineItem,
};
use storefront_app::{config::display::format_amount, context::Storefront, sync::RemoteCartSnapshot};

use super::{Currency, table};

#[derive(Debug, Args)]
pub(crate) struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    /// Print the cart and its totals
    Show,

    /// Add units of a variant
    Add(AddArgs),

    /// Set the quantity of a line; zero removes it
    Set(SetArgs),

    /// Remove a line
    Remove(LineArgs),

    /// Empty the local cart
    Clear,
}

#[derive(Debug, Args)]
struct LineArgs {
    /// Product identifier
    #[arg(long)]
    product: String,

    /// Variant identifier
    #[arg(long)]
    variant: String,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[command(flatten)]
    line: LineArgs,

    /// Unit price
    #[arg(long, value_parser = unit_price)]
    price: Decimal,

    /// Units to add
    #[arg(long, default_value_t = 1)]
    quantity: u32,

    /// Product name
    #[arg(long, default_value = "")]
    name: String,

    /// Product image URL
    #[arg(long, default_value = "")]
    image: String,

    /// Unit description, e.g. "1 kg"
    #[arg(long, default_value = "")]
    unit: String,
}

#[derive(Debug, Args)]
struct SetArgs {
    #[command(flatten)]
    line: LineArgs,

    /// New quantity
    #[arg(long, allow_negative_numbers = true)]
    quantity: i64,
}

pub(crate) async fn run(
    command: CartCommand,
    storefront: &mut Storefront,
    currency: Currency,
) -> Result<(), String> {
    match command.command {
        CartSubcommand::Show => show(storefront, currency).await,
        CartSubcommand::Add(args) => {
            let line = CartLineItem::new(
                args.line.product,
                args.line.variant,
                args.price,
                args.quantity,
            )
            .with_details(args.name, args.image, args.unit);

            storefront
                .cart_service()
                .add_item(line)
                .await
                .map_err(|error| format!("failed to add to cart: {error}"))?;

            show(storefront, currency).await
        }
        CartSubcommand::Set(args) => {
            let (product_id, variant_id) = args.line.ids();

            storefront
                .cart_service()
                .set_quantity(&product_id, &variant_id, args.quantity)
                .await
                .map_err(|error| format!("failed to update cart: {error}"))?;

            show(storefront, currency).await
        }
        CartSubcommand::Remove(args) => {
            let (product_id, variant_id) = args.ids();

            storefront
                .cart_service()
                .remove_item(&product_id, &variant_id)
                .await
                .map_err(|error| format!("failed to remove from cart: {error}"))?;

            show(storefront, currency).await
        }
        CartSubcommand::Clear => {
            storefront.cart_service().clear();

            println!("cart cleared");

            Ok(())
        }
    }
}

fn unit_price(value: &str) -> Result<Decimal, String> {
    let price: Decimal = value
        .trim()
        .parse()
        .map_err(|error| format!("`{value}` is not a price: {error}"))?;

    if price.is_sign_negative() && !price.is_zero() {
        return Err(format!("price must not be negative, got {price}"));
    }

    Ok(price)
}

impl LineArgs {
    fn ids(self) -> (ProductId, VariantId) {
        (ProductId::new(self.product), VariantId::new(self.variant))
    }
}

async fn show(storefront: &Storefront, currency: Currency) -> Result<(), String> {
    let cart = storefront.cart();

    if cart.is_empty() {
        println!("cart is empty");
    } else {
        let rows = cart.lines().iter().map(|line| {
            [
                line.product_id.to_string(),
                line.variant_id.to_string(),
                line.display_name.clone(),
                line.unit_label.clone(),
                line.quantity.to_string(),
                format_amount(line.unit_price, currency),
                format_amount(line.line_total(), currency),
            ]
        });

        println!(
            "{}",
            table::render(
                ["product", "variant", "name", "unit", "qty", "price", "total"],
                rows,
                4,
            )
        );
    }

    println!("items: {}", cart.total_items());
    println!("total: {}", format_amount(cart.total_price(), currency));

    match storefront.fetch_remote_cart().await {
        Some(RemoteCartSnapshot::Known(rows)) => println!("remote rows: {}", rows.len()),
        Some(RemoteCartSnapshot::Unknown) => println!("remote cart: unavailable"),
        None => {}
    }

    Ok(())
}
