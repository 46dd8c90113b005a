//! Checkout reference data
//!
//! Delivery zones, payment methods and saved addresses as listed by the
//! backend.

use jiff::civil::Date;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::{AddressId, DeliveryZoneId, PaymentMethodId, UserId};

/// Delivery zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryZone {
    /// Zone identifier
    pub id: DeliveryZoneId,

    /// Zone name
    #[serde(default)]
    pub name: String,

    /// Charge added to every order delivered to this zone
    #[serde(with = "rust_decimal::serde::float")]
    pub delivery_charge: Decimal,
}

/// Payment method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethod {
    /// Method identifier
    pub id: PaymentMethodId,

    /// Human-readable title, e.g. "bKash"
    pub title: String,

    /// Machine code, e.g. `cod`
    #[serde(default)]
    pub code: String,
}

impl PaymentMethod {
    /// Cash on delivery needs no transaction proof.
    #[must_use]
    pub fn is_cash_on_delivery(&self) -> bool {
        if self.code.eq_ignore_ascii_case("cod") {
            return true;
        }

        self.title.trim().eq_ignore_ascii_case("cash on delivery")
    }

    /// Resolve the title of `id` among `methods`.
    #[must_use]
    pub fn title_of<'a>(methods: &'a [PaymentMethod], id: &PaymentMethodId) -> Option<&'a str> {
        methods
            .iter()
            .find(|method| method.id == *id)
            .map(|method| method.title.as_str())
    }
}

/// Address saved against a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Address identifier
    pub id: AddressId,

    /// Owner
    pub user_id: UserId,

    /// Recipient name
    #[serde(default)]
    pub full_name: String,

    /// Recipient phone
    #[serde(default)]
    pub phone_number: String,

    /// Street address
    pub address_line: String,

    /// City
    pub city: String,

    /// Area or district
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// Postal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Address to be created for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    /// Owner
    pub user_id: UserId,

    /// Recipient name
    pub full_name: String,

    /// Recipient phone
    pub phone_number: String,

    /// Street address
    pub address_line: String,

    /// City
    pub city: String,

    /// Area or district
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,

    /// Postal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

/// Requested delivery date and time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySlot {
    /// Delivery date
    pub date: Date,

    /// Time window label, e.g. "10:00-12:00"
    pub time_slot: String,
}
