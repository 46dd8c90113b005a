//! Orders
//!
//! The payload sent to the order-creation endpoint and the receipt it
//! returns.

use jiff::{Timestamp, civil::Date};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    checkout::{ValidRecipient, ValidatedCheckout},
    discounts::DiscountError,
    ids::{
        AddressId, CouponId, DeliveryZoneId, OrderId, PaymentMethodId, ProductId, UserId, VariantId,
    },
    items::CartLineItem,
    pricing::CheckoutTotals,
};

/// One ordered line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product identifier
    pub product_id: ProductId,

    /// Variant identifier
    pub variant_product_id: VariantId,

    /// Units ordered
    pub quantity: u32,

    /// Unit price at the time of ordering
    #[serde(with = "rust_decimal::serde::float")]
    pub unit_price: Decimal,
}

impl From<&CartLineItem> for OrderLine {
    fn from(line: &CartLineItem) -> Self {
        Self {
            product_id: line.product_id.clone(),
            variant_product_id: line.variant_id.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        }
    }
}

/// Body of an order-creation request. Built once per submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<UserId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    address_id: Option<AddressId>,

    delivery_zone_id: DeliveryZoneId,
    payment_method_id: PaymentMethodId,
    delivery_date: Date,
    delivery_time_slot: String,
    items: Vec<OrderLine>,

    #[serde(with = "rust_decimal::serde::float")]
    subtotal: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    discount_amount: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    coupon_id: Option<CouponId>,

    #[serde(with = "rust_decimal::serde::float")]
    delivery_charge: Decimal,

    #[serde(with = "rust_decimal::serde::float")]
    total: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_date: Option<Date>,

    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    phone_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    address_line: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    city: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    area: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    postal_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

impl OrderPayload {
    /// Build the payload from a validated checkout and the cart lines.
    ///
    /// Monetary fields are rounded to two places. `user_id` is set for
    /// signed-in submissions.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] when the applied discount cannot be computed.
    pub fn build(
        checkout: &ValidatedCheckout,
        lines: &[CartLineItem],
        user_id: Option<&UserId>,
    ) -> Result<Self, DiscountError> {
        let totals = CheckoutTotals::compute(
            lines,
            checkout.discount.as_ref(),
            checkout.delivery_zone.delivery_charge,
        )?
        .rounded();

        let transaction = checkout.transaction.as_ref();

        let mut payload = Self {
            user_id: user_id.cloned(),
            address_id: None,
            delivery_zone_id: checkout.delivery_zone.id.clone(),
            payment_method_id: checkout.payment_method.id.clone(),
            delivery_date: checkout.delivery_slot.date,
            delivery_time_slot: checkout.delivery_slot.time_slot.clone(),
            items: lines.iter().map(OrderLine::from).collect(),
            subtotal: totals.subtotal,
            discount_amount: totals.discount,
            coupon_id: checkout
                .discount
                .as_ref()
                .map(|discount| discount.source_id.clone()),
            delivery_charge: totals.delivery_charge,
            total: totals.total,
            transaction_number: transaction.map(|tx| tx.number.clone()),
            transaction_phone_number: transaction.map(|tx| tx.phone_number.clone()),
            transaction_date: transaction.map(|tx| tx.date),
            full_name: None,
            phone_number: None,
            email: None,
            address_line: None,
            city: None,
            area: None,
            postal_code: None,
            note: checkout.note.clone(),
        };

        match &checkout.recipient {
            ValidRecipient::Account { address_id } => {
                payload.address_id = Some(address_id.clone());
            }
            ValidRecipient::Guest(guest) => {
                payload.full_name = Some(guest.full_name.trim().to_string());
                payload.phone_number = Some(guest.phone_number.trim().to_string());
                payload.email.clone_from(&guest.email);
                payload.address_line = Some(guest.address_line.trim().to_string());
                payload.city = Some(guest.city.trim().to_string());
                payload.area.clone_from(&guest.area);
                payload.postal_code.clone_from(&guest.postal_code);
            }
        }

        Ok(payload)
    }

    /// Ordered lines.
    #[must_use]
    pub fn items(&self) -> &[OrderLine] {
        &self.items
    }

    /// Amount payable.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Subtotal before discount.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Discount applied.
    #[must_use]
    pub fn discount_amount(&self) -> Decimal {
        self.discount_amount
    }

    /// Delivery charge.
    #[must_use]
    pub fn delivery_charge(&self) -> Decimal {
        self.delivery_charge
    }

    /// Selected payment method.
    #[must_use]
    pub fn payment_method_id(&self) -> &PaymentMethodId {
        &self.payment_method_id
    }

    /// Signed-in user, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    /// Saved address, for signed-in orders.
    #[must_use]
    pub fn address_id(&self) -> Option<&AddressId> {
        self.address_id.as_ref()
    }

    /// Guest recipient name.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Guest recipient phone.
    #[must_use]
    pub fn phone_number(&self) -> Option<&str> {
        self.phone_number.as_deref()
    }

    /// Guest street address.
    #[must_use]
    pub fn address_line(&self) -> Option<&str> {
        self.address_line.as_deref()
    }

    /// Guest city.
    #[must_use]
    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Guest area.
    #[must_use]
    pub fn area(&self) -> Option<&str> {
        self.area.as_deref()
    }

    /// Guest postal code.
    #[must_use]
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }
}

/// Line echoed back in an order receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    /// Product identifier, when the backend includes it
    #[serde(default)]
    pub product_id: Option<ProductId>,

    /// Variant identifier
    pub variant_product_id: VariantId,

    /// Units ordered
    pub quantity: u32,

    /// Unit price charged
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub unit_price: Option<Decimal>,
}

/// Order as returned by the order-creation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderReceipt {
    /// Order identifier
    pub id: OrderId,

    /// Human-facing order number
    #[serde(default)]
    pub order_number: Option<String>,

    /// Order status, e.g. "pending"
    #[serde(default)]
    pub status: Option<String>,

    /// Amount charged
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total: Option<Decimal>,

    /// Ordered lines
    #[serde(default)]
    pub items: Vec<ReceiptLine>,

    /// Creation time
    #[serde(default)]
    pub created_at: Option<Timestamp>,
}
