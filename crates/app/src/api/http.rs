//! REST client for the storefront backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::debug;

use storefront::{
    discounts::{DiscountDescriptor, DiscountKind},
    ids::CouponId,
    orders::{OrderPayload, OrderReceipt},
    reference::{Address, DeliveryZone, NewAddress, PaymentMethod},
};

use crate::{
    api::{
        errors::ApiError,
        models::{CartDelta, CartRowUpdate, OtpTicket, RemoteCartRow},
        service::StorefrontApi,
    },
    session::Session,
};

/// Header carrying the token issued by the OTP dispatch call.
pub const OTP_VERIFICATION_HEADER: &str = "otp-verification-token";

/// [`StorefrontApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpStorefrontApi {
    base_url: String,
    http: Client,
}

impl HttpStorefrontApi {
    /// Create a client for the backend at `base_url`, e.g.
    /// `"https://api.example.com"`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let mut builder = Client::builder();

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: builder.build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<Option<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        debug!(action, %status, "backend responded");

        decode(status, &body, action)
    }

    async fn send_for_data<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        action: &str,
    ) -> Result<T, ApiError> {
        self.send(request, action).await?.ok_or_else(|| {
            ApiError::UnexpectedResponse(format!("{action} response carried no data"))
        })
    }
}

#[async_trait]
impl StorefrontApi for HttpStorefrontApi {
    #[tracing::instrument(
        name = "api.http.add_cart_delta",
        skip(self, session, delta),
        fields(variant_id = %delta.variant_product_id, delta = delta.quantity),
        err
    )]
    async fn add_cart_delta(&self, session: &Session, delta: &CartDelta) -> Result<(), ApiError> {
        let request = self
            .http
            .post(self.url("/v1/cart"))
            .bearer_auth(&session.access_token)
            .json(delta);

        self.send::<serde_json::Value>(request, "add to cart")
            .await
            .map(|_| ())
    }

    #[tracing::instrument(
        name = "api.http.get_cart",
        skip(self, session),
        fields(user_id = %session.user_id),
        err
    )]
    async fn get_cart(&self, session: &Session) -> Result<Vec<RemoteCartRow>, ApiError> {
        let request = self
            .http
            .get(self.url("/v1/cart"))
            .query(&[("userId", session.user_id.as_str())])
            .bearer_auth(&session.access_token);

        let cart: Option<CartData> = self.send(request, "fetch cart").await?;

        Ok(cart.map(|cart| cart.items).unwrap_or_default())
    }

    #[tracing::instrument(
        name = "api.http.update_cart_row",
        skip(self, session, update),
        fields(row_id = %update.id),
        err
    )]
    async fn update_cart_row(
        &self,
        session: &Session,
        update: &CartRowUpdate,
    ) -> Result<(), ApiError> {
        let request = self
            .http
            .patch(self.url("/v1/cart"))
            .bearer_auth(&session.access_token)
            .json(update);

        self.send::<serde_json::Value>(request, "update cart")
            .await
            .map(|_| ())
    }

    #[tracing::instrument(name = "api.http.create_order", skip_all, err)]
    async fn create_order(
        &self,
        session: &Session,
        payload: &OrderPayload,
    ) -> Result<OrderReceipt, ApiError> {
        let request = self
            .http
            .post(self.url("/v1/orders"))
            .bearer_auth(&session.access_token)
            .json(payload);

        self.send_for_data(request, "place order").await
    }

    #[tracing::instrument(name = "api.http.create_guest_order", skip_all, err)]
    async fn create_guest_order(&self, payload: &OrderPayload) -> Result<OrderReceipt, ApiError> {
        let request = self.http.post(self.url("/v1/orders/guest")).json(payload);

        self.send_for_data(request, "place guest order").await
    }

    async fn list_delivery_zones(&self) -> Result<Vec<DeliveryZone>, ApiError> {
        let request = self.http.get(self.url("/v1/delivery-zones"));

        Ok(self
            .send(request, "list delivery zones")
            .await?
            .unwrap_or_default())
    }

    async fn list_payment_methods(&self) -> Result<Vec<PaymentMethod>, ApiError> {
        let request = self.http.get(self.url("/v1/payment-methods"));

        Ok(self
            .send(request, "list payment methods")
            .await?
            .unwrap_or_default())
    }

    async fn list_addresses(&self, session: &Session) -> Result<Vec<Address>, ApiError> {
        let request = self
            .http
            .get(self.url(&format!("/v1/addresses/user/{}", session.user_id)))
            .bearer_auth(&session.access_token);

        Ok(self
            .send(request, "list addresses")
            .await?
            .unwrap_or_default())
    }

    #[tracing::instrument(
        name = "api.http.create_address",
        skip(self, session, address),
        fields(user_id = %session.user_id),
        err
    )]
    async fn create_address(
        &self,
        session: &Session,
        address: &NewAddress,
    ) -> Result<Address, ApiError> {
        let request = self
            .http
            .post(self.url("/v1/addresses"))
            .bearer_auth(&session.access_token)
            .json(address);

        self.send_for_data(request, "create address").await
    }

    #[tracing::instrument(name = "api.http.apply_coupon", skip(self), err)]
    async fn apply_coupon(
        &self,
        code: &str,
        subtotal: Decimal,
    ) -> Result<DiscountDescriptor, ApiError> {
        let request = self
            .http
            .post(self.url("/v1/coupons/apply"))
            .json(&CouponRequest { code, subtotal });

        let coupon: CouponData = self.send_for_data(request, "apply coupon").await?;

        Ok(coupon.into())
    }

    #[tracing::instrument(name = "api.http.send_mobile_otp", skip_all, err)]
    async fn send_mobile_otp(&self, phone_number: &str) -> Result<OtpTicket, ApiError> {
        let request = self
            .http
            .post(self.url("/v2/auth/send-mobile-otp"))
            .json(&json!({ "phoneNumber": phone_number }));

        self.send_for_data(request, "send OTP").await
    }

    #[tracing::instrument(name = "api.http.verify_mobile_otp", skip_all, err)]
    async fn verify_mobile_otp(
        &self,
        phone_number: &str,
        otp: &str,
        ticket: &OtpTicket,
    ) -> Result<Session, ApiError> {
        let request = self
            .http
            .post(self.url("/v2/auth/verify-mobile-otp"))
            .header(OTP_VERIFICATION_HEADER, &ticket.verification_token)
            .json(&json!({ "phoneNumber": phone_number, "otp": otp }));

        self.send_for_data(request, "verify OTP").await
    }
}

/// Interpret a backend response.
///
/// A 2xx response is unwrapped from its envelope; `success: false` becomes
/// [`ApiError::Rejected`]. A non-2xx response is a rejection when it carries
/// a message, otherwise an unexpected response.
fn decode<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    action: &str,
) -> Result<Option<T>, ApiError> {
    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|envelope| envelope.message);

        return match message {
            Some(message) => Err(ApiError::Rejected {
                message: Some(message),
            }),
            None => Err(ApiError::UnexpectedResponse(format!(
                "{action} failed with status {status}: {body}"
            ))),
        };
    }

    if body.trim().is_empty() {
        return Ok(None);
    }

    let envelope: Envelope<T> = serde_json::from_str(body).map_err(|source| {
        ApiError::UnexpectedResponse(format!("{action} returned an unreadable body: {source}"))
    })?;

    if envelope.success == Some(false) {
        return Err(ApiError::Rejected {
            message: envelope.message,
        });
    }

    Ok(envelope.data)
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: Option<bool>,
    message: Option<String>,

    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CartData {
    #[serde(default)]
    items: Vec<RemoteCartRow>,
}

#[derive(Debug, Serialize)]
struct CouponRequest<'a> {
    code: &'a str,

    #[serde(with = "rust_decimal::serde::float")]
    subtotal: Decimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CouponData {
    id: CouponId,
    discount_type: DiscountKind,

    #[serde(with = "rust_decimal::serde::float")]
    discount_value: Decimal,
}

impl From<CouponData> for DiscountDescriptor {
    fn from(coupon: CouponData) -> Self {
        Self {
            amount: coupon.discount_value,
            kind: coupon.discount_type,
            source_id: coupon.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn successful_envelope_yields_data() -> TestResult {
        let body = r#"{ "success": true, "data": { "items": [
            { "id": "r1", "productId": "p1", "variantProductId": "v1", "quantity": 3 }
        ] } }"#;

        let cart: Option<CartData> = decode(StatusCode::OK, body, "fetch cart")?;
        let rows = cart.ok_or("missing data")?.items;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows.first().map(|row| row.quantity), Some(3));

        Ok(())
    }

    #[test]
    fn success_false_is_a_rejection_with_server_message() {
        let body = r#"{ "success": false, "message": "Out of stock" }"#;

        let result = decode::<serde_json::Value>(StatusCode::OK, body, "add to cart");

        assert!(
            matches!(&result, Err(ApiError::Rejected { message: Some(m) }) if m == "Out of stock"),
            "expected Rejected, got {result:?}"
        );
    }

    #[test]
    fn error_status_with_message_is_a_rejection() {
        let body = r#"{ "success": false, "message": "Invalid OTP" }"#;

        let result = decode::<serde_json::Value>(StatusCode::BAD_REQUEST, body, "verify OTP");

        assert!(
            matches!(&result, Err(ApiError::Rejected { message: Some(m) }) if m == "Invalid OTP"),
            "expected Rejected, got {result:?}"
        );
    }

    #[test]
    fn error_status_without_envelope_is_unexpected() {
        let result = decode::<serde_json::Value>(StatusCode::BAD_GATEWAY, "<html>", "fetch cart");

        assert!(
            matches!(result, Err(ApiError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );
    }

    #[test]
    fn empty_success_body_has_no_data() -> TestResult {
        let data = decode::<serde_json::Value>(StatusCode::NO_CONTENT, "", "update cart")?;

        assert_eq!(data, None);

        Ok(())
    }

    #[test]
    fn malformed_body_is_unexpected() {
        let result = decode::<CartData>(StatusCode::OK, "{ not json", "fetch cart");

        assert!(
            matches!(result, Err(ApiError::UnexpectedResponse(_))),
            "expected UnexpectedResponse, got {result:?}"
        );
    }

    #[test]
    fn coupon_maps_to_discount_descriptor() -> TestResult {
        let body = r#"{ "success": true, "data": {
            "id": "c-10", "discountType": "percentage", "discountValue": 10
        } }"#;

        let coupon: Option<CouponData> = decode(StatusCode::OK, body, "apply coupon")?;
        let descriptor = DiscountDescriptor::from(coupon.ok_or("missing data")?);

        assert_eq!(
            descriptor,
            DiscountDescriptor::percentage(Decimal::from(10), "c-10")
        );

        Ok(())
    }

    #[test]
    fn verified_session_decodes() -> TestResult {
        let body = r#"{ "success": true, "data": { "userId": "u1", "accessToken": "t" } }"#;

        let session: Option<Session> = decode(StatusCode::OK, body, "verify OTP")?;

        assert_eq!(session, Some(Session::new("u1", "t")));

        Ok(())
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() -> TestResult {
        let api = HttpStorefrontApi::new("https://api.example.com/", None)?;

        assert_eq!(api.url("/v1/cart"), "https://api.example.com/v1/cart");

        Ok(())
    }
}
