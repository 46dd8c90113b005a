use std::io::{self, BufRead, Write};

use clap::Args;
use jiff::civil::Date;

use storefront::{
    checkout::{CheckoutRequest, GuestDetails, Recipient, TransactionProof},
    ids::AddressId,
    reference::DeliverySlot,
};
use storefront_app::{
    checkout::CheckoutState, config::display::format_amount, context::Storefront,
};

use super::{Currency, find_zone, resolve_coupon};

#[derive(Debug, Args)]
pub(crate) struct PlaceArgs {
    /// Delivery zone identifier
    #[arg(long)]
    zone: String,

    /// Payment method identifier
    #[arg(long)]
    payment_method: String,

    /// Delivery date, e.g. 2026-10-20
    #[arg(long)]
    date: Option<Date>,

    /// Delivery time window
    #[arg(long)]
    slot: Option<String>,

    /// Coupon code to apply
    #[arg(long)]
    coupon: Option<String>,

    /// Saved address to deliver to; requires a signed-in shopper
    #[arg(long)]
    address_id: Option<String>,

    #[command(flatten)]
    guest: GuestArgs,

    #[command(flatten)]
    transaction: TransactionArgs,

    /// Note for the rider
    #[arg(long)]
    note: Option<String>,
}

#[derive(Debug, Args)]
struct GuestArgs {
    /// Recipient name
    #[arg(long, default_value = "")]
    name: String,

    /// Recipient phone
    #[arg(long, default_value = "")]
    phone: String,

    /// Email for receipts
    #[arg(long)]
    email: Option<String>,

    /// Street address
    #[arg(long, default_value = "")]
    address: String,

    /// City
    #[arg(long, default_value = "")]
    city: String,

    /// Area or district
    #[arg(long)]
    area: Option<String>,

    /// Postal code
    #[arg(long)]
    postal_code: Option<String>,

    /// Register an account with the recipient phone; asks for the code sent to it
    #[arg(long)]
    create_account: bool,
}

#[derive(Debug, Args)]
struct TransactionArgs {
    /// Payment transaction reference
    #[arg(long)]
    transaction_number: Option<String>,

    /// Phone number the payment was sent from
    #[arg(long)]
    transaction_phone: Option<String>,

    /// Date of payment
    #[arg(long)]
    transaction_date: Option<Date>,
}

pub(crate) async fn run(
    args: PlaceArgs,
    storefront: &mut Storefront,
    currency: Currency,
) -> Result<(), String> {
    let payment_methods = storefront
        .api()
        .list_payment_methods()
        .await
        .map_err(|error| format!("failed to list payment methods: {error}"))?;

    let payment_method = payment_methods
        .iter()
        .find(|method| method.id.as_str() == args.payment_method)
        .cloned();

    let delivery_zone = find_zone(storefront, &args.zone).await?;
    let discount = resolve_coupon(storefront, args.coupon.as_deref()).await?;

    let recipient = match args.address_id {
        Some(address_id) => Recipient::Account {
            address_id: Some(AddressId::new(address_id)),
        },
        None if storefront.identity().session().is_some() => {
            Recipient::Account { address_id: None }
        }
        None => Recipient::Guest(GuestDetails {
            full_name: args.guest.name,
            phone_number: args.guest.phone,
            email: args.guest.email,
            address_line: args.guest.address,
            city: args.guest.city,
            area: args.guest.area,
            postal_code: args.guest.postal_code,
            create_account: args.guest.create_account,
        }),
    };

    let delivery_slot = match (args.date, args.slot) {
        (Some(date), Some(time_slot)) => Some(DeliverySlot { date, time_slot }),
        _ => None,
    };

    let request = CheckoutRequest {
        delivery_zone,
        payment_method,
        delivery_slot,
        discount,
        transaction: TransactionProof {
            number: args.transaction.transaction_number,
            phone_number: args.transaction.transaction_phone,
            date: args.transaction.transaction_date,
        },
        recipient,
        note: args.note,
    };

    let mut orchestrator = storefront.checkout(payment_methods);

    let mut state = storefront
        .place_order(&mut orchestrator, &request)
        .await
        .map_err(|error| error.to_string())?;

    if let CheckoutState::AwaitingOtp { phone_number } = &state {
        let code = prompt_code(phone_number).await?;

        state = storefront
            .confirm_otp(&mut orchestrator, &code)
            .await
            .map_err(|error| error.to_string())?;
    }

    match state {
        CheckoutState::Succeeded(confirmation) => {
            let receipt = &confirmation.receipt;

            println!("order_id: {}", receipt.id);

            if let Some(order_number) = &receipt.order_number {
                println!("order_number: {order_number}");
            }

            println!("total: {}", format_amount(confirmation.total, currency));

            if let Some(session) = orchestrator.upgraded_session() {
                println!("signed in as: {}", session.user_id);
            }

            Ok(())
        }
        CheckoutState::Failed(failure) => Err(failure.message()),
        other => Err(format!("checkout stopped in state {other:?}")),
    }
}

async fn prompt_code(phone_number: &str) -> Result<String, String> {
    print!("code sent to {phone_number}: ");

    io::stdout()
        .flush()
        .map_err(|error| format!("failed to write prompt: {error}"))?;

    tokio::task::spawn_blocking(|| {
        let mut code = String::new();

        io::stdin().lock().read_line(&mut code).map(|_| code)
    })
    .await
    .map_err(|error| format!("failed to read code: {error}"))?
    .map_err(|error| format!("failed to read code: {error}"))
}
