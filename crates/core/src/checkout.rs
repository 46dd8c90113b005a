//! Checkout validation
//!
//! Checks run in a fixed order and the first failure is the one reported, so
//! the shopper always fixes the topmost field first. Nothing here touches the
//! network.

use jiff::civil::Date;
use thiserror::Error;

use crate::{
    discounts::DiscountDescriptor,
    ids::AddressId,
    items::CartLineItem,
    reference::{DeliverySlot, DeliveryZone, PaymentMethod},
};

/// Minimum number of digits in a contact phone number.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Reasons a checkout cannot be submitted.
#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum CheckoutError {
    /// No delivery zone selected.
    #[error("Please select a delivery zone.")]
    MissingDeliveryZone,

    /// No payment method selected.
    #[error("Please select a payment method.")]
    MissingPaymentMethod,

    /// No delivery date or time selected.
    #[error("Please select a delivery date and time.")]
    MissingDeliverySlot,

    /// Nothing to order.
    #[error("Your cart is empty.")]
    EmptyCart,

    /// Prepaid methods need the transaction number, phone and date.
    #[error("Please provide the transaction number, phone number and date.")]
    MissingTransactionDetails,

    /// Guest name missing.
    #[error("Please enter your full name.")]
    MissingFullName,

    /// Guest phone number shorter than [`MIN_PHONE_DIGITS`] digits.
    #[error("Please enter a valid phone number.")]
    InvalidPhoneNumber,

    /// Guest street address missing.
    #[error("Please enter your address.")]
    MissingAddressLine,

    /// Guest city missing.
    #[error("Please enter your city.")]
    MissingCity,

    /// Signed-in shopper has no delivery address selected.
    #[error("Please select a delivery address.")]
    MissingAddress,
}

/// Proof of payment for prepaid methods, as typed by the shopper.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionProof {
    /// Transaction reference
    pub number: Option<String>,

    /// Phone number the payment was sent from
    pub phone_number: Option<String>,

    /// Date of payment
    pub date: Option<Date>,
}

/// Transaction proof with every field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedTransaction {
    /// Transaction reference
    pub number: String,

    /// Phone number the payment was sent from
    pub phone_number: String,

    /// Date of payment
    pub date: Date,
}

impl TransactionProof {
    fn verified(&self) -> Option<VerifiedTransaction> {
        Some(VerifiedTransaction {
            number: present(self.number.as_deref())?.to_string(),
            phone_number: present(self.phone_number.as_deref())?.to_string(),
            date: self.date?,
        })
    }
}

/// Contact and address details entered during a guest checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestDetails {
    /// Recipient name
    pub full_name: String,

    /// Recipient phone
    pub phone_number: String,

    /// Optional email for receipts
    pub email: Option<String>,

    /// Street address
    pub address_line: String,

    /// City
    pub city: String,

    /// Area or district
    pub area: Option<String>,

    /// Postal code
    pub postal_code: Option<String>,

    /// Register an account with this phone number while checking out
    pub create_account: bool,
}

/// Who the order is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Unauthenticated checkout with inline details.
    Guest(GuestDetails),

    /// Signed-in checkout against a saved address.
    Account {
        /// Selected saved address
        address_id: Option<AddressId>,
    },
}

/// Everything the checkout screen collected.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    /// Selected delivery zone
    pub delivery_zone: Option<DeliveryZone>,

    /// Selected payment method
    pub payment_method: Option<PaymentMethod>,

    /// Selected delivery date and time
    pub delivery_slot: Option<DeliverySlot>,

    /// Applied coupon
    pub discount: Option<DiscountDescriptor>,

    /// Payment proof for prepaid methods
    pub transaction: TransactionProof,

    /// Order recipient
    pub recipient: Recipient,

    /// Free-form note for the rider
    pub note: Option<String>,
}

/// Validated recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidRecipient {
    /// Guest details, all required fields present.
    Guest(GuestDetails),

    /// Saved address of the signed-in shopper.
    Account {
        /// Selected saved address
        address_id: AddressId,
    },
}

/// A checkout request that passed every check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCheckout {
    /// Delivery zone
    pub delivery_zone: DeliveryZone,

    /// Payment method
    pub payment_method: PaymentMethod,

    /// Delivery date and time
    pub delivery_slot: DeliverySlot,

    /// Applied coupon
    pub discount: Option<DiscountDescriptor>,

    /// Present unless paying cash on delivery
    pub transaction: Option<VerifiedTransaction>,

    /// Order recipient
    pub recipient: ValidRecipient,

    /// Free-form note
    pub note: Option<String>,
}

impl ValidatedCheckout {
    /// Replace the recipient, used when a guest checkout is upgraded to an
    /// account mid-flow.
    #[must_use]
    pub fn with_recipient(mut self, recipient: ValidRecipient) -> Self {
        self.recipient = recipient;
        self
    }
}

/// Validate `request` against the current cart `lines`.
///
/// # Errors
///
/// Returns the first failing [`CheckoutError`], in declaration order.
pub fn validate(
    request: &CheckoutRequest,
    lines: &[CartLineItem],
) -> Result<ValidatedCheckout, CheckoutError> {
    let delivery_zone = request
        .delivery_zone
        .clone()
        .ok_or(CheckoutError::MissingDeliveryZone)?;

    let payment_method = request
        .payment_method
        .clone()
        .ok_or(CheckoutError::MissingPaymentMethod)?;

    let delivery_slot = request
        .delivery_slot
        .clone()
        .filter(|slot| !slot.time_slot.trim().is_empty())
        .ok_or(CheckoutError::MissingDeliverySlot)?;

    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let transaction = if payment_method.is_cash_on_delivery() {
        None
    } else {
        Some(
            request
                .transaction
                .verified()
                .ok_or(CheckoutError::MissingTransactionDetails)?,
        )
    };

    let recipient = match &request.recipient {
        Recipient::Guest(details) => {
            validate_guest(details)?;

            ValidRecipient::Guest(details.clone())
        }
        Recipient::Account { address_id } => ValidRecipient::Account {
            address_id: address_id.clone().ok_or(CheckoutError::MissingAddress)?,
        },
    };

    Ok(ValidatedCheckout {
        delivery_zone,
        payment_method,
        delivery_slot,
        discount: request.discount.clone(),
        transaction,
        recipient,
        note: request.note.clone(),
    })
}

fn validate_guest(details: &GuestDetails) -> Result<(), CheckoutError> {
    if is_blank(&details.full_name) {
        return Err(CheckoutError::MissingFullName);
    }

    if phone_digits(&details.phone_number) < MIN_PHONE_DIGITS {
        return Err(CheckoutError::InvalidPhoneNumber);
    }

    if is_blank(&details.address_line) {
        return Err(CheckoutError::MissingAddressLine);
    }

    if is_blank(&details.city) {
        return Err(CheckoutError::MissingCity);
    }

    Ok(())
}

fn phone_digits(phone: &str) -> usize {
    phone.chars().filter(char::is_ascii_digit).count()
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
