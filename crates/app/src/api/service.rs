//! Storefront backend contract.

use async_trait::async_trait;
use mockall::automock;
use rust_decimal::Decimal;

use storefront::{
    discounts::DiscountDescriptor,
    orders::{OrderPayload, OrderReceipt},
    reference::{Address, DeliveryZone, NewAddress, PaymentMethod},
};

use crate::{
    api::{
        errors::ApiError,
        models::{CartDelta, CartRowUpdate, OtpTicket, RemoteCartRow},
    },
    session::Session,
};

#[automock]
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Apply a signed quantity change to the shopper's remote cart.
    async fn add_cart_delta(&self, session: &Session, delta: &CartDelta) -> Result<(), ApiError>;

    /// List the rows of the shopper's remote cart.
    async fn get_cart(&self, session: &Session) -> Result<Vec<RemoteCartRow>, ApiError>;

    /// Flag a remote cart row as discarded or purchased.
    async fn update_cart_row(
        &self,
        session: &Session,
        update: &CartRowUpdate,
    ) -> Result<(), ApiError>;

    /// Place an order for a signed-in shopper.
    async fn create_order(
        &self,
        session: &Session,
        payload: &OrderPayload,
    ) -> Result<OrderReceipt, ApiError>;

    /// Place an order without an account.
    async fn create_guest_order(&self, payload: &OrderPayload) -> Result<OrderReceipt, ApiError>;

    async fn list_delivery_zones(&self) -> Result<Vec<DeliveryZone>, ApiError>;

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError>;

    /// Saved addresses of the signed-in shopper.
    async fn list_addresses(&self, session: &Session) -> Result<Vec<Address>, ApiError>;

    async fn create_address(
        &self,
        session: &Session,
        address: &NewAddress,
    ) -> Result<Address, ApiError>;

    /// Resolve a coupon code against the current subtotal.
    async fn apply_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<DiscountDescriptor, ApiError>;

    /// Send a one-time password to `phone_number`.
    async fn send_mobile_otp(&self, phone_number: &str) -> Result<OtpTicket, ApiError>;

    /// Exchange the one-time password for a session, registering the phone
    /// number if it is new.
    async fn verify_mobile_otp(
        &self,
        phone_number: &str,
        otp: &str,
        ticket: &OtpTicket,
    ) -> Result<Session, ApiError>;
}
